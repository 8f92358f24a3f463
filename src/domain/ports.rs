use crate::domain::model::{HandicapReport, RoundBatch};
use crate::domain::selection::SelectionRules;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 記分卡的來源
#[derive(Debug, Clone, PartialEq)]
pub enum RoundSource {
    Api {
        endpoint: String,
        headers: HashMap<String, String>,
        parameters: HashMap<String, String>,
        timeout_seconds: Option<u64>,
    },
    File {
        path: String,
    },
}

impl RoundSource {
    pub fn api(endpoint: impl Into<String>) -> Self {
        RoundSource::Api {
            endpoint: endpoint.into(),
            headers: HashMap::new(),
            parameters: HashMap::new(),
            timeout_seconds: None,
        }
    }

    pub fn describe(&self) -> &str {
        match self {
            RoundSource::Api { endpoint, .. } => endpoint,
            RoundSource::File { path } => path,
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    fn source(&self) -> RoundSource;
    fn selection(&self) -> SelectionRules;
    fn player_filter(&self) -> Option<&str>;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn bundle_filename(&self) -> Option<&str>;
    fn use_sample_on_failure(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<RoundBatch>;
    async fn transform(&self, batch: RoundBatch) -> Result<HandicapReport>;
    async fn load(&self, report: HandicapReport) -> Result<String>;
}
