//! Solr update/search servlet 클라이언트
//!
//! 쿼리 문자열, JSON 요청 body를 만들어 Solr에 보내고 JSON 응답을 돌려준다.
//! 색인 로직이나 재시도는 하지 않으며, HTTP 전송은 [`Transport`] 구현에 맡긴다.
//!
//! ```ignore
//! let transport = Arc::new(HyperTransport::new());
//! let solr = Solr::new("default", SolrConfig::default(), transport);
//!
//! let mut params = Params::new();
//! params.insert("facet.field".to_string(), json!(["cat", "brand"]));
//! let response = solr.search(&escape("title:rust"), 0, 10, &params).await?;
//! ```

pub mod document;
pub mod error;
pub mod escape;
pub mod options;
pub mod query_string;
pub mod registry;
pub mod setting_log;
pub mod settings;
pub mod solr;
pub mod transport;

pub use document::{to_document, Document};
pub use error::{BoxedError, SolrError, TransportError};
pub use escape::{escape, escape_phrase, phrase};
pub use options::{
    BatchOptions, CommitOptions, CommitWithin, IndexOptions, NamedListMode, OptimizeOptions,
};
pub use query_string::{build_query, Params};
pub use registry::SolrRegistry;
pub use settings::{InstanceSettings, LogSettings, Settings};
pub use solr::{Payload, Solr, SolrConfig};
pub use transport::{HyperTransport, Transport, TransportOptions, TransportRequest};
