use thiserror::Error;

use crate::config::LoadError;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("configuration error: {0}")]
    Configuration(#[from] LoadError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

impl InfraError {
    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
