//! Configuration management for GitLab client

use std::{path::PathBuf, time::Duration};

use compact_str::{format_compact, CompactString};
use itertools::Itertools;

use super::{
    error::{ClientError, Result},
    retry::RetryPolicy,
};
use crate::{config::ConnectionConfig, id::{IssueIid, ProjectId}};

/// Main configuration for GitLab client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST API root, e.g. `https://gitlab.example.com/api/v4`
    pub base_url: CompactString,
    /// Project whose issues and branches are managed
    pub project_id: ProjectId,
    /// Private access token
    pub private_token: CompactString,
    /// Request configuration
    pub request: RequestConfig,
    /// Retry schedule for every network call
    pub retry: RetryPolicy,
    /// Debug configuration
    pub debug: DebugConfig,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Number of items per page for paginated requests
    pub per_page: u32,
    /// Request timeout
    pub timeout: Duration,
    /// Verify the server's TLS certificate
    pub ssl_verify: bool,
}

/// Debug and logging configuration
#[derive(Debug, Clone)]
pub struct DebugConfig {
    /// Enable debug logging of HTTP responses
    pub log_responses: bool,
    /// Directory for storing debug logs
    pub log_directory: Option<PathBuf>,
}

/// Which open issues to list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueFilter {
    /// Issues with these project-scoped numbers
    Iids(Vec<IssueIid>),
    /// Issues carrying these labels, matched the way GitLab's `labels`
    /// parameter does
    Labels(Vec<CompactString>),
}

impl IssueFilter {
    /// Query parameters for the issues endpoint, without paging
    pub fn query_params(&self) -> Vec<(&'static str, CompactString)> {
        let mut params = vec![("state", CompactString::from("opened"))];
        match self {
            IssueFilter::Iids(iids) => {
                params.extend(iids.iter().map(|iid| ("iids[]", format_compact!("{iid}"))));
            },
            IssueFilter::Labels(labels) => {
                params.push(("labels", labels.iter().join(",").into()));
            },
        }
        params
    }

    pub fn is_empty(&self) -> bool {
        match self {
            IssueFilter::Iids(iids) => iids.is_empty(),
            IssueFilter::Labels(labels) => labels.is_empty(),
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            per_page: 100,
            timeout: Duration::from_secs(10),
            ssl_verify: true,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_responses: false,
            log_directory: Some(PathBuf::from("autolabel-responses")),
        }
    }
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(
        base_url: impl Into<CompactString>,
        project_id: ProjectId,
        private_token: impl Into<CompactString>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            project_id,
            private_token: private_token.into(),
            request: RequestConfig::default(),
            retry: RetryPolicy::default(),
            debug: DebugConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ClientError::config("Base URL cannot be empty"));
        }

        if self.private_token.is_empty() {
            return Err(ClientError::config("Private token cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::config("Base URL must start with http:// or https://"));
        }

        if self.request.per_page == 0 || self.request.per_page > 100 {
            return Err(ClientError::config("per_page must be between 1 and 100"));
        }

        if self.request.timeout.is_zero() {
            return Err(ClientError::config("Timeout must be greater than zero"));
        }

        if self.retry.max_attempts == 0 {
            return Err(ClientError::config("Retry policy needs at least one attempt"));
        }

        Ok(())
    }

    /// URL of a project-scoped endpoint, `path` without leading slash
    pub fn project_url(&self, path: &str) -> CompactString {
        format_compact!("{}/projects/{}/{}", self.base_url, self.project_id, path)
    }

    /// Set request configuration
    pub fn with_request(mut self, request: RequestConfig) -> Self {
        self.request = request;
        self
    }

    /// Set retry policy
    #[cfg(test)]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Enable debug logging
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug.log_responses = enabled;
        self
    }
}

impl From<&ConnectionConfig> for ClientConfig {
    fn from(connection: &ConnectionConfig) -> Self {
        let base_url = format_compact!(
            "{}/api/v{}",
            connection.url.trim_end_matches('/'),
            connection.api_version
        );

        Self::new(base_url, connection.project_id, connection.private_token.clone()).with_request(
            RequestConfig {
                timeout: connection.timeout,
                ssl_verify: connection.ssl_verify,
                ..RequestConfig::default()
            },
        )
    }
}
