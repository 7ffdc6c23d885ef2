//! Application-wide error types.

use thiserror::Error;

use crate::metrics::MetricsError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Api(#[from] zlm_api::ApiError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Short, stable name for the error class, suitable for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "config",
            Self::Api(e) => e.kind(),
            Self::Metrics(_) => "metrics",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }
}
