use std::path::PathBuf;
use thiserror::Error;

/// Failure talking to a history or status collaborator
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("cannot open repository at {path}: {message}")]
    Repository { path: PathBuf, message: String },

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("backend error: {0}")]
    Backend(String),
}

impl FetchError {
    pub fn backend(message: impl Into<String>) -> Self {
        FetchError::Backend(message.into())
    }

    /// Whether re-issuing the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Repository { .. } => false,
            FetchError::Git(err) => !matches!(err.code(), git2::ErrorCode::NotFound),
            FetchError::Task(_) | FetchError::Backend(_) => true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}
