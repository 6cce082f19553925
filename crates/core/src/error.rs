use thiserror::Error;
use uuid::Uuid;

pub type AppDeskResult<T> = Result<T, AppDeskError>;

#[derive(Error, Debug)]
pub enum AppDeskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data store error ({status}): {message}")]
    DataStore { status: u16, message: String },

    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppDeskError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}

impl From<config::ConfigError> for AppDeskError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppDeskError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}
