use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of engine failures exposed to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NetworkError,
    LocationError,
    PermissionError,
    GeneralError,
}

/// Errors raised by the engine and its collaborators
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Location unavailable: {0}")]
    Location(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("{0}")]
    General(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Network(_) => ErrorKind::NetworkError,
            EngineError::Location(_) => ErrorKind::LocationError,
            EngineError::Permission(_) => ErrorKind::PermissionError,
            EngineError::General(_) => ErrorKind::GeneralError,
        }
    }
}

impl From<validator::ValidationErrors> for EngineError {
    fn from(errors: validator::ValidationErrors) -> Self {
        EngineError::General(format!("Invalid filters: {}", errors))
    }
}
