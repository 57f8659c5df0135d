//! Error types for GitLab client operations

use std::time::Duration;

use compact_str::CompactString;
use thiserror::Error;

/// Structured error types for GitLab client operations
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    /// JSON parsing error with endpoint context
    #[error("Failed to parse JSON response from {endpoint}: {source}")]
    JsonParse {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// GitLab API returned an error response
    #[error("GitLab API error: {message}")]
    GitlabApi { status: u16, message: CompactString },

    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication failed
    #[error("Authentication to GitLab is not correct")]
    Authentication,

    /// Network timeout
    #[error("Request timeout")]
    Timeout,

    /// Resource not found
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimit { retry_after: Option<Duration> },

    /// A retryable failure persisted past the retry budget
    #[error("GitLab request failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<ClientError>,
    },
}

impl ClientError {
    /// Create a JSON parsing error with endpoint context
    pub fn json_parse(endpoint: impl Into<String>, source: serde_json::Error) -> Self {
        Self::JsonParse { endpoint: endpoint.into(), source }
    }

    /// Create a GitLab API error
    pub fn gitlab_api(status: u16, message: impl Into<CompactString>) -> Self {
        Self::GitlabApi { status, message: message.into() }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create a rate limit error
    pub fn rate_limit(retry_after: Option<Duration>) -> Self {
        Self::RateLimit { retry_after }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_timeout() || e.is_connect(),
            ClientError::Timeout => true,
            ClientError::RateLimit { .. } => true,
            ClientError::GitlabApi { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Check if this error indicates a temporary network issue
    pub fn is_network_error(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ClientError::Timeout => true,
            ClientError::RetriesExhausted { last, .. } => last.is_network_error(),
            _ => false,
        }
    }

    /// Authentication failure, directly or as the last retried error
    pub fn is_authentication(&self) -> bool {
        match self {
            ClientError::Authentication => true,
            ClientError::RetriesExhausted { last, .. } => last.is_authentication(),
            _ => false,
        }
    }

    /// Suggested wait before the next attempt, if the server gave one
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ClientError::RateLimit { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Http(error)
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
