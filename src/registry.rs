use crate::error::SolrError;
use crate::settings::Settings;
use crate::solr::{Solr, SolrConfig};
use crate::transport::Transport;
use log::info;
use std::collections::HashMap;
use std::sync::Arc;

/// 이름별 Solr 클라이언트 모음
/// <br>
/// 전역 상태 없이 호출하는 쪽에서 만들어 넘겨서 사용
pub struct SolrRegistry {
    transport: Arc<dyn Transport>,
    instances: HashMap<String, Arc<Solr>>,
}

impl SolrRegistry {
    pub fn new(transport: Arc<dyn Transport>) -> SolrRegistry {
        SolrRegistry {
            transport,
            instances: HashMap::new(),
        }
    }

    /// 설정 파일의 모든 인스턴스를 생성
    pub fn from_settings(settings: &Settings, transport: Arc<dyn Transport>) -> SolrRegistry {
        let mut registry = SolrRegistry::new(transport);

        for (name, instance) in &settings.instances {
            let solr = Solr::new(name.clone(), instance.solr.clone(), registry.transport.clone())
                .with_named_list_mode(instance.named_list_mode)
                .with_transport_options(instance.transport.clone());
            info!(
                "solr client init. {}: update {}, search {}",
                name,
                solr.update_url(),
                solr.search_url()
            );
            registry.insert(solr);
        }

        registry
    }

    /// 이름으로 등록. 같은 이름이 있으면 교체
    pub fn insert(&mut self, solr: Solr) -> Arc<Solr> {
        let solr = Arc::new(solr);
        self.instances.insert(solr.name().to_string(), solr.clone());
        solr
    }

    pub fn get(&self, name: &str) -> Result<Arc<Solr>, SolrError> {
        self.instances
            .get(name)
            .cloned()
            .ok_or_else(|| SolrError::UnknownInstance(name.to_string()))
    }

    /// 등록된 인스턴스가 있으면 그대로, 없으면 `config`로 새로 생성
    pub fn get_or_insert_with<F>(&mut self, name: &str, config: F) -> Arc<Solr>
    where
        F: FnOnce() -> SolrConfig,
    {
        if let Some(solr) = self.instances.get(name) {
            return solr.clone();
        }

        let solr = Solr::new(name, config(), self.transport.clone());
        self.insert(solr)
    }

    /// 등록된 이름 목록 (정렬됨)
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.instances.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
