use std::time::Duration;
use thiserror::Error;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Solr 클라이언트 에러
#[derive(Error, Debug)]
pub enum SolrError {
    /// 전송 계층에서 올라온 에러. 분류하지 않고 그대로 전달
    #[error("TRANSPORT_FAIL: {0}")]
    Transport(#[source] BoxedError),

    /// 응답 body가 JSON이 아님 (UTF-8이 아닌 경우 포함)
    /// <br>
    /// Solr의 에러 문서는 정상적인 JSON이므로 이 에러가 아님
    #[error("INVALID_RESPONSE: {source}")]
    InvalidResponse {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// 요청 데이터 JSON 인코딩 실패
    #[error("ENCODE_FAIL: {0}")]
    Encode(#[from] serde_json::Error),

    /// 문서로 변환할 수 없는 값
    #[error("INVALID_DOCUMENT: {0}")]
    InvalidDocument(String),

    /// 등록되지 않은 인스턴스 이름
    #[error("UNKNOWN_INSTANCE: {0}")]
    UnknownInstance(String),

    #[error("CONFIG_READ_FAIL: {0}")]
    Config(#[from] config::ConfigError),
}

impl SolrError {
    pub fn invalid_document(msg: impl Into<String>) -> Self {
        Self::InvalidDocument(msg.into())
    }
}

/// hyper 전송 계층 에러
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP_ERROR: {0}")]
    Http(#[from] hyper::Error),

    #[error("INVALID_REQUEST: {0}")]
    Request(#[from] hyper::http::Error),

    #[error("INVALID_URI: {0}")]
    InvalidUri(#[from] hyper::http::uri::InvalidUri),

    #[error("TIMEOUT: {0:?}")]
    Timeout(Duration),
}
