use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use url::form_urlencoded;

/// 쿼리 파라미터. 입력 순서를 유지
pub type Params = Map<String, Value>;

/// url 인코딩된 배열 인덱스(`%5B0%5D=`) 패턴
static ARRAY_INDEX_PTRN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%5B(?:[0-9]|[1-9][0-9]+)%5D=").unwrap());

/// Solr 쿼리 문자열 생성
/// <br>
/// 배열 값은 같은 이름의 파라미터 여러 개로 변환된다.
/// ex) `{"facet.field": ["a", "b"]}` => `facet.field=a&facet.field=b`
pub fn build_query(params: &Params) -> String {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for (key, value) in params {
        flatten(key.clone(), value, &mut pairs);
    }

    let encoded = pairs
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    // 인코딩된 배열 인덱스 제거
    ARRAY_INDEX_PTRN.replace_all(&encoded, "=").into_owned()
}

/// 중첩된 값을 `key[sub]=value` 형태의 쌍으로 펼침
fn flatten(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => pairs.push((key, if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => pairs.push((key, n.to_string())),
        Value::String(s) => pairs.push((key, s.clone())),
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                flatten(format!("{}[{}]", key, idx), item, pairs);
            }
        }
        Value::Object(map) => {
            for (sub_key, item) in map {
                flatten(format!("{}[{}]", key, sub_key), item, pairs);
            }
        }
    }
}

fn encode(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}
