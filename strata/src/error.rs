use strata_api::ResourceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrataError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for StrataError {
    fn from(err: anyhow::Error) -> Self {
        StrataError::Internal(format!("{err:#}"))
    }
}

impl From<&str> for StrataError {
    fn from(err: &str) -> Self {
        StrataError::Internal(err.to_string())
    }
}

impl From<String> for StrataError {
    fn from(err: String) -> Self {
        StrataError::Internal(err)
    }
}

pub type Result<T> = std::result::Result<T, StrataError>;
