use crate::error::{BoxedError, TransportError};
use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Client, Method, Request, Uri};
use log::{debug, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// 전송 계층 옵션. 클라이언트는 해석하지 않고 그대로 전달
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TransportOptions {
    /// 요청 타임아웃(ms). 없으면 무제한
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// 요청마다 추가할 헤더
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl TransportOptions {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// 전송 계층에 넘기는 요청 한 건
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    /// form 인코딩된 POST body
    pub body: Option<String>,
    pub options: TransportOptions,
}

impl TransportRequest {
    pub fn get(url: String, options: TransportOptions) -> Self {
        Self {
            method: Method::GET,
            url,
            body: None,
            options,
        }
    }

    pub fn post(url: String, body: String, options: TransportOptions) -> Self {
        Self {
            method: Method::POST,
            url,
            body: Some(body),
            options,
        }
    }
}

/// HTTP 요청을 수행하고 응답 body를 돌려주는 전송 계층
/// <br>
/// body는 디코딩하지 않은 바이트 그대로 돌려줌
#[async_trait]
pub trait Transport: Send + Sync {
    async fn perform(&self, request: TransportRequest) -> Result<Vec<u8>, BoxedError>;
}

/// hyper 기반 전송 계층
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector>,
}

impl HyperTransport {
    pub fn new() -> HyperTransport {
        HyperTransport {
            client: Client::new(),
        }
    }

    async fn send(&self, request: TransportRequest) -> Result<Vec<u8>, TransportError> {
        let uri = Uri::from_str(&request.url)?;
        let mut builder = Request::builder().method(request.method).uri(uri);

        if request.body.is_some() {
            builder = builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE);
        }
        for (name, value) in &request.options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let body = match request.body {
            Some(body) => Body::from(body),
            None => Body::empty(),
        };
        let req = builder.body(body)?;

        // 헤더 수신과 body 읽기 전체에 타임아웃 적용
        let exchange = async {
            let response = self.client.request(req).await?;

            // 에러 상태여도 Solr가 보낸 에러 문서를 그대로 돌려줌
            let status = response.status();
            if !status.is_success() {
                warn!("solr responded {} for {}", status, request.url);
            }

            let bytes = hyper::body::to_bytes(response.into_body()).await?;
            Ok::<_, TransportError>(bytes)
        };

        let bytes = match request.options.timeout() {
            Some(timeout) => tokio::time::timeout(timeout, exchange)
                .await
                .map_err(|_| TransportError::Timeout(timeout))??,
            None => exchange.await?,
        };

        debug!("solr response: {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn perform(&self, request: TransportRequest) -> Result<Vec<u8>, BoxedError> {
        Ok(self.send(request).await?)
    }
}
