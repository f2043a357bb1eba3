use crate::error::SolrError;
use serde::Serialize;
use serde_json::{Map, Value};

/// 색인할 문서. 필드 순서를 유지
pub type Document = Map<String, Value>;

/// 직렬화 가능한 값을 문서로 변환
/// <br>
/// JSON 객체가 아니면 에러
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, SolrError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(SolrError::invalid_document(format!(
            "expected a JSON object, got {}",
            kind(&other)
        ))),
    }
}

/// null 값 필드를 제거한 문서를 돌려줌
/// <br>
/// 필드가 없는 것과 null인 것은 Solr에서 다르게 취급됨
pub(crate) fn without_nulls(document: &Document) -> Document {
    document
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
