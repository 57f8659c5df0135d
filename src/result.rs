use thiserror::Error;

use crate::{client::ClientError, config::ConfigError};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to set up the GitLab client: {0}")]
    Client(#[from] ClientError),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
