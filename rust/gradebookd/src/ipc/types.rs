use crate::config::DaemonConfig;
use crate::extract::{extract_with_retry, ExtractError, Extractor};
use crate::model::GradeRecord;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Per-process state. Holds configuration only; grade data never outlives a request.
pub struct AppState {
    pub config: DaemonConfig,
}

impl AppState {
    pub fn new(config: DaemonConfig) -> Self {
        Self { config }
    }

    /// Extracts one screenshot under the configured retry policy, blocking
    /// the calling thread between attempts.
    pub fn extract_screenshot<E>(
        &self,
        extractor: &E,
        image: &[u8],
        mime_type: &str,
    ) -> Result<GradeRecord, ExtractError>
    where
        E: Extractor + ?Sized,
    {
        extract_with_retry(
            extractor,
            image,
            mime_type,
            &self.config.retry,
            std::thread::sleep,
        )
    }
}
