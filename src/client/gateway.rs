//! The remote operations the workflow needs from GitLab

use async_trait::async_trait;
use compact_str::CompactString;

use super::{config::IssueFilter, error::Result};
use crate::{
    domain::{BranchDto, IssueDto, LabelRef},
    id::IssueIid,
};

/// Issue and branch access for one GitLab project.
///
/// Implementations own their retry behaviour; callers see either a result or
/// the final error.
#[async_trait]
pub trait IssueGateway: Send + Sync {
    /// First protected branch whose name starts with `search` (case-insensitive),
    /// in listing order
    async fn find_protected_branch(&self, search: &str) -> Result<Option<BranchDto>>;

    /// Label name for a configured reference
    async fn resolve_label(&self, label: &LabelRef) -> Result<CompactString>;

    /// Add `label` to the issue unless it already carries it
    async fn add_label_to_issue(&self, iid: IssueIid, label: &str) -> Result<()>;

    /// Open issues matching `filter`, all pages
    async fn list_open_issues(&self, filter: &IssueFilter) -> Result<Vec<IssueDto>>;

    /// Replace the issue's labels with `labels`
    async fn save_issue_labels(&self, iid: IssueIid, labels: &[CompactString]) -> Result<()>;
}
