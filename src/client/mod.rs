//! GitLab client modules
//!
//! The REST client ([`GitlabApi`]) sits behind the [`IssueGateway`] trait so
//! the workflow can run against GitLab or an in-memory double. Every network
//! call goes through a [`RetryPolicy`](retry::RetryPolicy).

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod retry;
pub mod service;

#[cfg(test)]
pub(crate) mod tests;

// Re-export main types for convenience
pub use api::GitlabApi;
pub use config::ClientConfig;
pub use error::ClientError;
pub use gateway::IssueGateway;
pub use service::GitlabService;
