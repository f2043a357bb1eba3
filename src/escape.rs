use once_cell::sync::Lazy;
use regex::Regex;

/// Lucene 쿼리 파서의 특수문자 패턴
/// <br>
/// `&&`, `||`는 두 글자 단위로 매칭
static TERM_PTRN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\+|-|&&|\|\||!|\(|\)|\{|\}|\[|\]|\^|"|~|\*|\?|:|\\)"#).unwrap()
});

/// phrase 내부에서 escape가 필요한 문자 패턴
static PHRASE_PTRN: Lazy<Regex> = Lazy::new(|| Regex::new(r#"("|\\)"#).unwrap());

/// 쿼리 특수문자(`:`, `(`, `)`, `*`, `?` 등) 앞에 `\`를 붙임
/// <br>
/// phrase 안에 들어갈 값은 [`escape_phrase`]를 사용
pub fn escape(value: &str) -> String {
    TERM_PTRN.replace_all(value, r"\${1}").into_owned()
}

/// phrase 안에 들어갈 값의 `"`, `\`만 escape
pub fn escape_phrase(value: &str) -> String {
    PHRASE_PTRN.replace_all(value, r"\${1}").into_owned()
}

/// 값을 escape 후 따옴표로 감싸 phrase 구문을 생성
pub fn phrase(value: &str) -> String {
    format!("\"{}\"", escape_phrase(value))
}
