use crate::document::{without_nulls, Document};
use crate::error::SolrError;
use crate::options::{
    bool_str, BatchOptions, CommitOptions, CommitWithin, IndexOptions, NamedListMode,
    OptimizeOptions,
};
use crate::query_string::{build_query, Params};
use crate::transport::{Transport, TransportOptions, TransportRequest};
use log::debug;
use serde::Deserialize;
use serde_json::{json, Map, Number, Value};
use std::sync::Arc;
use url::form_urlencoded;

/// 응답 형식. 항상 json
pub const RESPONSE_WRITER: &str = "json";

pub const UPDATE_SERVLET: &str = "update/json";
pub const SEARCH_SERVLET: &str = "select";

/// search에서 고정되는 파라미터 이름. extra 파라미터로 덮어쓸 수 없음
const SEARCH_BASE_KEYS: [&str; 5] = ["wt", "json.nl", "q", "start", "rows"];

/// Solr 접속 설정
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SolrConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// 앞뒤 `/` 포함. ex) `/solr/collection1/`
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_unique_key")]
    pub unique_key: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8983
}

fn default_path() -> String {
    "/solr/".to_string()
}

fn default_unique_key() -> String {
    "id".to_string()
}

impl Default for SolrConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path: default_path(),
            unique_key: default_unique_key(),
        }
    }
}

/// update 요청 데이터
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// JSON으로 인코딩해서 전송
    Json(Value),
    /// 이미 인코딩된 문자열. 그대로 전송
    Raw(String),
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl From<String> for Payload {
    fn from(raw: String) -> Self {
        Payload::Raw(raw)
    }
}

impl From<&str> for Payload {
    fn from(raw: &str) -> Self {
        Payload::Raw(raw.to_string())
    }
}

/// Solr update/search servlet 클라이언트
pub struct Solr {
    name: String,
    config: SolrConfig,
    update_url: String,
    search_url: String,
    named_list_mode: NamedListMode,
    transport_options: TransportOptions,
    transport: Arc<dyn Transport>,
}

impl Solr {
    pub fn new(name: impl Into<String>, config: SolrConfig, transport: Arc<dyn Transport>) -> Solr {
        let base = format!("http://{}:{}{}", config.host, config.port, config.path);
        let update_url = format!("{}{}", base, UPDATE_SERVLET);
        let search_url = format!("{}{}", base, SEARCH_SERVLET);

        Solr {
            name: name.into(),
            config,
            update_url,
            search_url,
            named_list_mode: NamedListMode::default(),
            transport_options: TransportOptions::default(),
            transport,
        }
    }

    pub fn with_named_list_mode(mut self, mode: NamedListMode) -> Self {
        self.named_list_mode = mode;
        self
    }

    pub fn with_transport_options(mut self, options: TransportOptions) -> Self {
        self.transport_options = options;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &SolrConfig {
        &self.config
    }

    pub fn update_url(&self) -> &str {
        &self.update_url
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    pub fn named_list_mode(&self) -> NamedListMode {
        self.named_list_mode
    }

    pub fn transport_options(&self) -> &TransportOptions {
        &self.transport_options
    }

    /// 문서 한 건 색인
    /// <br>
    /// `commit_within`이 `Commit(bool)`이면 요청 파라미터 `commit`으로,
    /// `Millis(n)`이면 body의 `add.commitWithin`으로 전달된다.
    pub async fn index(&self, document: &Document, options: IndexOptions) -> Result<Value, SolrError> {
        let mut add = json!({
            "overwrite": options.overwrite,
            "doc": without_nulls(document),
        });
        let mut params = Params::new();

        match options.commit_within {
            CommitWithin::Commit(commit) => {
                params.insert("commit".to_string(), json!(bool_str(commit)));
            }
            CommitWithin::Millis(millis) if millis > 0 => {
                add["commitWithin"] = json!(millis);
            }
            CommitWithin::Millis(_) => {}
        }

        if let Some(boost) = options.boost {
            let boost = Number::from_f64(boost).ok_or_else(|| {
                SolrError::invalid_document(format!("boost must be finite, got {}", boost))
            })?;
            add["boost"] = Value::Number(boost);
        }

        self.request(json!({ "add": add }), params).await
    }

    /// 여러 문서를 한 번에 색인
    /// <br>
    /// 단건 색인과 달리 `overwrite`, `commit`, `commitWithin` 모두 요청 파라미터로 전달된다.
    pub async fn batch_index(
        &self,
        documents: &[Document],
        options: BatchOptions,
    ) -> Result<Value, SolrError> {
        let documents: Vec<Document> = documents.iter().map(without_nulls).collect();

        let mut params = Params::new();
        params.insert("overwrite".to_string(), json!(bool_str(options.overwrite)));

        match options.commit_within {
            CommitWithin::Commit(commit) => {
                params.insert("commit".to_string(), json!(bool_str(commit)));
            }
            CommitWithin::Millis(millis) if millis > 0 => {
                params.insert("commitWithin".to_string(), json!(millis));
            }
            CommitWithin::Millis(_) => {}
        }

        self.request(json!({ "add": documents }), params).await
    }

    pub async fn commit(&self, options: CommitOptions) -> Result<Value, SolrError> {
        let data = json!({
            "commit": {
                "softCommit": bool_str(options.soft_commit),
                "waitSearcher": bool_str(options.wait_searcher),
                "expungeDeletes": bool_str(options.expunge_deletes),
            }
        });
        self.request(data, Params::new()).await
    }

    pub async fn optimize(&self, options: OptimizeOptions) -> Result<Value, SolrError> {
        let data = json!({
            "optimize": {
                "softCommit": bool_str(options.soft_commit),
                "waitSearcher": bool_str(options.wait_searcher),
                "maxSegments": options.max_segments,
            }
        });
        self.request(data, Params::new()).await
    }

    /// 쿼리에 매칭되는 문서 삭제
    pub async fn remove(&self, query: &str) -> Result<Value, SolrError> {
        self.request(json!({ "delete": { "query": query } }), Params::new())
            .await
    }

    /// unique key로 문서 삭제
    pub async fn remove_by_id(&self, id: &str) -> Result<Value, SolrError> {
        let mut delete = Map::new();
        delete.insert(self.config.unique_key.clone(), json!(id));
        self.request(json!({ "delete": delete }), Params::new())
            .await
    }

    /// 여러 unique key로 문서 삭제
    /// <br>
    /// `{"delete":{..},"delete":{..}}` 처럼 같은 키가 반복되는 body를 만든다.
    /// Solr 스트리밍 JSON 파서가 받는 형식이므로 배열로 바꾸면 안 됨
    pub async fn remove_by_ids<S: AsRef<str>>(&self, ids: &[S]) -> Result<Value, SolrError> {
        let body = self.remove_by_ids_body(ids)?;
        self.request(body, Params::new()).await
    }

    fn remove_by_ids_body<S: AsRef<str>>(&self, ids: &[S]) -> Result<String, SolrError> {
        let mut fragments = Vec::with_capacity(ids.len());
        for id in ids {
            let mut target = Map::new();
            target.insert(self.config.unique_key.clone(), json!(id.as_ref()));
            fragments.push(format!("\"delete\":{}", serde_json::to_string(&target)?));
        }
        Ok(format!("{{{}}}", fragments.join(",")))
    }

    pub async fn rollback(&self) -> Result<Value, SolrError> {
        self.request(json!({ "rollback": {} }), Params::new()).await
    }

    /// update servlet에 POST 요청
    /// <br>
    /// `wt=json`은 항상 맨 앞에 오며, 호출자가 넘긴 `wt`는 무시된다.
    pub async fn request(
        &self,
        data: impl Into<Payload>,
        params: Params,
    ) -> Result<Value, SolrError> {
        let data = match data.into() {
            Payload::Json(value) => serde_json::to_string(&value)?,
            Payload::Raw(raw) => raw,
        };

        let mut final_params = Params::with_capacity(params.len() + 1);
        final_params.insert("wt".to_string(), json!(RESPONSE_WRITER));
        for (key, value) in params {
            if key != "wt" {
                final_params.insert(key, value);
            }
        }

        let url = format!("{}?{}", self.update_url, build_query(&final_params));
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("stream.body", &data)
            .finish();

        debug!("[{}] POST {} ({} bytes)", self.name, url, data.len());
        let request = TransportRequest::post(url, body, self.transport_options.clone());
        self.perform(request).await
    }

    /// search servlet에 GET 요청
    /// <br>
    /// `params`로 여러 값을 넘길 때는 배열을 사용 (ex. `facet.field`)
    pub async fn search(
        &self,
        query: &str,
        offset: u64,
        limit: u64,
        params: &Params,
    ) -> Result<Value, SolrError> {
        let mut final_params = Params::with_capacity(params.len() + SEARCH_BASE_KEYS.len());
        final_params.insert("wt".to_string(), json!(RESPONSE_WRITER));
        final_params.insert("json.nl".to_string(), json!(self.named_list_mode.as_str()));
        final_params.insert("q".to_string(), json!(query));
        final_params.insert("start".to_string(), json!(offset));
        final_params.insert("rows".to_string(), json!(limit));

        for (key, value) in params {
            if !SEARCH_BASE_KEYS.contains(&key.as_str()) {
                final_params.insert(key.clone(), value.clone());
            }
        }

        let url = format!("{}?{}", self.search_url, build_query(&final_params));

        debug!("[{}] GET {}", self.name, url);
        let request = TransportRequest::get(url, self.transport_options.clone());
        self.perform(request).await
    }

    async fn perform(&self, request: TransportRequest) -> Result<Value, SolrError> {
        let body = self
            .transport
            .perform(request)
            .await
            .map_err(SolrError::Transport)?;

        serde_json::from_slice(&body).map_err(|source| SolrError::InvalidResponse {
            source,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxedError;
    use async_trait::async_trait;
    use hyper::Method;
    use std::sync::Mutex;

    /// 요청을 기록하고 고정된 응답을 돌려주는 전송 계층
    struct MockTransport {
        response: Result<Vec<u8>, String>,
        requests: Mutex<Vec<TransportRequest>>,
    }

    impl MockTransport {
        fn new() -> Self {
            Self::with_response(r#"{"responseHeader":{"status":0,"QTime":1}}"#)
        }

        fn with_response(body: &str) -> Self {
            Self::with_bytes(body.as_bytes())
        }

        fn with_bytes(body: &[u8]) -> Self {
            Self {
                response: Ok(body.to_vec()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(msg: &str) -> Self {
            Self {
                response: Err(msg.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn last(&self) -> TransportRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn perform(&self, request: TransportRequest) -> Result<Vec<u8>, BoxedError> {
            self.requests.lock().unwrap().push(request);
            match &self.response {
                Ok(body) => Ok(body.clone()),
                Err(msg) => Err(msg.clone().into()),
            }
        }
    }

    fn client(transport: Arc<MockTransport>) -> Solr {
        Solr::new("default", SolrConfig::default(), transport)
    }

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("document must be an object"),
        }
    }

    /// POST body의 stream.body 값을 꺼냄
    fn stream_body(request: &TransportRequest) -> String {
        let body = request.body.as_deref().unwrap();
        form_urlencoded::parse(body.as_bytes())
            .find(|(k, _)| k == "stream.body")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    fn stream_json(request: &TransportRequest) -> Value {
        serde_json::from_str(&stream_body(request)).unwrap()
    }

    fn query_of(request: &TransportRequest) -> &str {
        request.url.split_once('?').map(|(_, q)| q).unwrap()
    }

    #[test]
    fn test_urls() {
        let config = SolrConfig {
            host: "search.local".to_string(),
            port: 8080,
            path: "/solr/core1/".to_string(),
            unique_key: "doc_id".to_string(),
        };
        let solr = Solr::new("core1", config, Arc::new(MockTransport::new()));

        assert_eq!(solr.name(), "core1");
        assert_eq!(solr.update_url(), "http://search.local:8080/solr/core1/update/json");
        assert_eq!(solr.search_url(), "http://search.local:8080/solr/core1/select");
        assert_eq!(solr.named_list_mode(), NamedListMode::Map);
    }

    #[tokio::test]
    async fn test_search_base_params() {
        let transport = Arc::new(MockTransport::new());
        let solr = client(transport.clone());

        solr.search("foo", 0, 10, &Params::new()).await.unwrap();

        let request = transport.last();
        assert_eq!(request.method, Method::GET);
        assert!(request.body.is_none());
        assert_eq!(
            request.url,
            "http://localhost:8983/solr/select?wt=json&json.nl=map&q=foo&start=0&rows=10"
        );
    }

    #[tokio::test]
    async fn test_search_extra_params_cannot_override_base() {
        let transport = Arc::new(MockTransport::new());
        let solr = client(transport.clone()).with_named_list_mode(NamedListMode::ArrArr);

        let extra = doc(json!({
            "wt": "xml",
            "q": "bar",
            "rows": 99,
            "facet": "true",
            "facet.field": ["cat", "brand"],
        }));
        solr.search("foo bar", 20, 5, &extra).await.unwrap();

        assert_eq!(
            query_of(&transport.last()),
            "wt=json&json.nl=arrarr&q=foo+bar&start=20&rows=5&facet=true&facet.field=cat&facet.field=brand"
        );
    }

    #[tokio::test]
    async fn test_search_decodes_response() {
        let transport = Arc::new(MockTransport::with_response(
            r#"{"response":{"numFound":1,"start":0,"docs":[{"id":"1"}]}}"#,
        ));
        let solr = client(transport);

        let response = solr.search("*:*", 0, 10, &Params::new()).await.unwrap();
        assert_eq!(response["response"]["numFound"], 1);
        assert_eq!(response["response"]["docs"][0]["id"], "1");
    }

    #[tokio::test]
    async fn test_index_drops_null_fields() {
        let transport = Arc::new(MockTransport::new());
        let solr = client(transport.clone());

        let document = doc(json!({"id": "1", "title": null, "body": "text"}));
        solr.index(&document, IndexOptions::default()).await.unwrap();

        let request = transport.last();
        assert_eq!(request.method, Method::POST);
        assert!(request.url.starts_with("http://localhost:8983/solr/update/json?"));

        let stream = stream_json(&request);
        let doc = stream["add"]["doc"].as_object().unwrap();
        assert!(!doc.contains_key("title"));
        assert_eq!(doc["id"], "1");
        assert_eq!(stream["add"]["overwrite"], true);
    }

    #[tokio::test]
    async fn test_index_commit_flag_goes_to_params() {
        let transport = Arc::new(MockTransport::new());
        let solr = client(transport.clone());

        let document = doc(json!({"id": "1"}));
        solr.index(&document, IndexOptions::default().with_commit_within(true))
            .await
            .unwrap();

        let request = transport.last();
        assert_eq!(query_of(&request), "wt=json&commit=true");
        assert_eq!(
            stream_body(&request),
            r#"{"add":{"overwrite":true,"doc":{"id":"1"}}}"#
        );
    }

    #[tokio::test]
    async fn test_index_commit_within_goes_to_body() {
        let transport = Arc::new(MockTransport::new());
        let solr = client(transport.clone());

        let document = doc(json!({"id": "1"}));
        let options = IndexOptions::default()
            .with_overwrite(false)
            .with_commit_within_ms(500)
            .with_boost(1.5);
        solr.index(&document, options).await.unwrap();

        let request = transport.last();
        assert_eq!(query_of(&request), "wt=json");
        assert!(!query_of(&request).contains("commitWithin"));
        assert_eq!(
            stream_body(&request),
            r#"{"add":{"overwrite":false,"doc":{"id":"1"},"commitWithin":500,"boost":1.5}}"#
        );
    }

    #[tokio::test]
    async fn test_index_rejects_non_finite_boost() {
        let transport = Arc::new(MockTransport::new());
        let solr = client(transport.clone());

        let document = doc(json!({"id": "1"}));
        let result = solr
            .index(&document, IndexOptions::default().with_boost(f64::NAN))
            .await;

        assert!(matches!(result, Err(SolrError::InvalidDocument(_))));
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_index_commit_within_goes_to_params() {
        let transport = Arc::new(MockTransport::new());
        let solr = client(transport.clone());

        let documents = vec![
            doc(json!({"id": "1", "title": null})),
            doc(json!({"id": "2", "title": "two"})),
        ];
        solr.batch_index(&documents, BatchOptions::default().with_commit_within_ms(500))
            .await
            .unwrap();

        let request = transport.last();
        assert_eq!(query_of(&request), "wt=json&overwrite=true&commitWithin=500");
        assert_eq!(
            stream_body(&request),
            r#"{"add":[{"id":"1"},{"id":"2","title":"two"}]}"#
        );
    }

    #[tokio::test]
    async fn test_batch_index_commit_flag() {
        let transport = Arc::new(MockTransport::new());
        let solr = client(transport.clone());

        let documents = vec![doc(json!({"id": "1"}))];
        solr.batch_index(&documents, BatchOptions::default().with_overwrite(false))
            .await
            .unwrap();
        assert_eq!(
            query_of(&transport.last()),
            "wt=json&overwrite=false&commit=false"
        );

        // 0ms는 아무 것도 설정하지 않음
        solr.batch_index(&documents, BatchOptions::default().with_commit_within_ms(0))
            .await
            .unwrap();
        assert_eq!(query_of(&transport.last()), "wt=json&overwrite=true");
    }

    #[tokio::test]
    async fn test_remove_commands() {
        let transport = Arc::new(MockTransport::new());
        let config = SolrConfig {
            unique_key: "doc_id".to_string(),
            ..SolrConfig::default()
        };
        let solr = Solr::new("default", config, transport.clone());

        solr.remove("type:old").await.unwrap();
        assert_eq!(
            stream_body(&transport.last()),
            r#"{"delete":{"query":"type:old"}}"#
        );

        solr.remove_by_id("42").await.unwrap();
        assert_eq!(
            stream_body(&transport.last()),
            r#"{"delete":{"doc_id":"42"}}"#
        );
    }

    #[tokio::test]
    async fn test_remove_by_ids_framing() {
        let transport = Arc::new(MockTransport::new());
        let solr = client(transport.clone());

        solr.remove_by_ids(&["1", "2"]).await.unwrap();

        assert_eq!(
            stream_body(&transport.last()),
            r#"{"delete":{"id":"1"},"delete":{"id":"2"}}"#
        );
    }

    #[test]
    fn test_remove_by_ids_body_escapes_ids() {
        let solr = client(Arc::new(MockTransport::new()));

        let body = solr.remove_by_ids_body(&[r#"a"b"#.to_string()]).unwrap();
        assert_eq!(body, r#"{"delete":{"id":"a\"b"}}"#);

        let empty: [&str; 0] = [];
        assert_eq!(solr.remove_by_ids_body(&empty).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_commit_optimize_rollback() {
        let transport = Arc::new(MockTransport::new());
        let solr = client(transport.clone());

        solr.commit(CommitOptions::default()).await.unwrap();
        assert_eq!(
            stream_body(&transport.last()),
            r#"{"commit":{"softCommit":"false","waitSearcher":"true","expungeDeletes":"false"}}"#
        );

        let options = OptimizeOptions {
            soft_commit: true,
            wait_searcher: false,
            max_segments: 4,
        };
        solr.optimize(options).await.unwrap();
        assert_eq!(
            stream_body(&transport.last()),
            r#"{"optimize":{"softCommit":"true","waitSearcher":"false","maxSegments":4}}"#
        );

        solr.rollback().await.unwrap();
        assert_eq!(stream_body(&transport.last()), r#"{"rollback":{}}"#);
        assert_eq!(query_of(&transport.last()), "wt=json");
    }

    #[tokio::test]
    async fn test_request_forces_wt_first() {
        let transport = Arc::new(MockTransport::new());
        let solr = client(transport.clone());

        let params = doc(json!({"overwrite": "true", "wt": "xml"}));
        solr.request("{\"rollback\":{}}", params).await.unwrap();

        let request = transport.last();
        assert_eq!(query_of(&request), "wt=json&overwrite=true");
        // 문자열 payload는 다시 인코딩하지 않음
        assert_eq!(stream_body(&request), r#"{"rollback":{}}"#);
    }

    #[tokio::test]
    async fn test_request_body_is_form_encoded() {
        let transport = Arc::new(MockTransport::new());
        let solr = client(transport.clone());

        solr.remove("a&b=c").await.unwrap();

        let body = transport.last().body.unwrap();
        assert!(body.starts_with("stream.body="));
        assert!(!body.contains("a&b"));
        assert_eq!(
            stream_body(&transport.last()),
            r#"{"delete":{"query":"a&b=c"}}"#
        );
    }

    #[tokio::test]
    async fn test_transport_options_passed_through() {
        let transport = Arc::new(MockTransport::new());
        let options = TransportOptions {
            timeout_ms: Some(3000),
            ..TransportOptions::default()
        };
        let solr = client(transport.clone()).with_transport_options(options.clone());

        solr.rollback().await.unwrap();
        assert_eq!(transport.last().options, options);

        solr.search("*:*", 0, 1, &Params::new()).await.unwrap();
        assert_eq!(transport.last().options, options);
    }

    #[tokio::test]
    async fn test_invalid_response() {
        let transport = Arc::new(MockTransport::with_response("<html>502 Bad Gateway</html>"));
        let solr = client(transport);

        let result = solr.rollback().await;
        match result {
            Err(SolrError::InvalidResponse { body, .. }) => {
                assert_eq!(body, "<html>502 Bad Gateway</html>");
            }
            other => panic!("expected InvalidResponse, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_utf8_response_is_invalid_response() {
        let transport = Arc::new(MockTransport::with_bytes(&[0xff, 0xfe, b'{']));
        let solr = client(transport);

        let result = solr.search("*:*", 0, 10, &Params::new()).await;
        match result {
            Err(SolrError::InvalidResponse { body, .. }) => {
                assert_eq!(body, "\u{fffd}\u{fffd}{");
            }
            other => panic!("expected InvalidResponse, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_solr_error_document_is_returned() {
        let transport = Arc::new(MockTransport::with_response(
            r#"{"responseHeader":{"status":400},"error":{"msg":"undefined field foo","code":400}}"#,
        ));
        let solr = client(transport);

        let response = solr.search("foo:bar", 0, 10, &Params::new()).await.unwrap();
        assert_eq!(response["error"]["code"], 400);
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let transport = Arc::new(MockTransport::failing("connection refused"));
        let solr = client(transport);

        let result = solr.commit(CommitOptions::default()).await;
        match result {
            Err(SolrError::Transport(e)) => assert_eq!(e.to_string(), "connection refused"),
            other => panic!("expected Transport error, got {:?}", other),
        }
    }
}
