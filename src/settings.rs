use crate::error::SolrError;
use crate::options::NamedListMode;
use crate::solr::SolrConfig;
use crate::transport::TransportOptions;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::BTreeMap;

/// 환경변수 prefix. ex) `SOLR_CLIENT__LOG__LEVEL=debug`
const ENV_PREFIX: &str = "SOLR_CLIENT";

/// 설정 파일 전체
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub log: LogSettings,

    /// 인스턴스 이름별 접속 설정
    #[serde(default)]
    pub instances: BTreeMap<String, InstanceSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String,

    /// 로그 파일 경로. 없으면 콘솔에만 출력
    #[serde(default)]
    pub file: Option<String>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}

/// Solr 인스턴스 하나의 설정
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstanceSettings {
    #[serde(flatten)]
    pub solr: SolrConfig,

    #[serde(default)]
    pub named_list_mode: NamedListMode,

    #[serde(flatten)]
    pub transport: TransportOptions,
}

impl Settings {
    /// 설정 파일을 읽고 환경변수로 덮어씀
    /// <br>
    /// 확장자는 생략 가능 (config 크레이트가 지원하는 형식)
    pub fn load(name: &str) -> Result<Settings, SolrError> {
        let settings = Config::builder()
            .add_source(File::with_name(name))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// 문자열로 된 TOML 설정을 읽음
    pub fn from_toml(toml: &str) -> Result<Settings, SolrError> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn instance(&self, name: &str) -> Result<&InstanceSettings, SolrError> {
        self.instances
            .get(name)
            .ok_or_else(|| SolrError::UnknownInstance(name.to_string()))
    }
}
