//! High-level GitLab service operations

use std::sync::Arc;

use compact_str::CompactString;
use itertools::Itertools;
use tracing::{debug, error, info, instrument, warn};

use super::{
    error::{ClientError, Result},
    gateway::IssueGateway,
};
use crate::{
    domain::{IssueMove, LabelPropagation, LabelRef},
    id::IssueIid,
    labels,
};

/// Executes label plans against a GitLab project
///
/// Every public operation logs and swallows gateway failures: a webhook
/// delivery is answered the same way whether or not GitLab cooperated.
#[derive(Clone)]
pub struct GitlabService {
    gateway: Arc<dyn IssueGateway>,
}

impl GitlabService {
    /// Create a new GitLab service
    pub fn new(gateway: Arc<dyn IssueGateway>) -> Self {
        Self { gateway }
    }

    /// Get reference to the underlying gateway
    pub fn gateway(&self) -> &Arc<dyn IssueGateway> {
        &self.gateway
    }

    /// Add each label to the issue, in order. A label that fails is logged
    /// and skipped; the remaining labels are still added.
    #[instrument(skip(self, labels), fields(iid = %iid, labels = %labels.iter().join(", ")))]
    pub async fn add_labels_to_issue(&self, iid: IssueIid, labels: &[LabelRef]) {
        let mut added = 0;
        for label in labels {
            match self.add_label(iid, label).await {
                Ok(()) => added += 1,
                Err(e) => log_failure("add label to issue", &e),
            }
        }
        info!(added, requested = labels.len(), "Labels added to issue");
    }

    /// Relabel every open issue the move selects
    #[instrument(skip(self), fields(selector = ?issue_move.selector))]
    pub async fn move_issues(&self, issue_move: &IssueMove) {
        match self.try_move_issues(issue_move).await {
            Ok(updated) => info!(updated, "Issues moved"),
            Err(e) => log_failure("move issues", &e),
        }
    }

    /// Copy a protected branch label onto the issues carrying its source label
    #[instrument(skip(self), fields(from = %propagation.from_label, to = %propagation.to_label))]
    pub async fn propagate(&self, propagation: &LabelPropagation) {
        self.move_issues(&propagation.to_move()).await
    }

    async fn add_label(&self, iid: IssueIid, label: &LabelRef) -> Result<()> {
        let name = self.gateway.resolve_label(label).await?;
        self.gateway.add_label_to_issue(iid, &name).await
    }

    async fn resolve_labels(&self, labels: &[LabelRef]) -> Result<Vec<CompactString>> {
        let mut names = Vec::with_capacity(labels.len());
        for label in labels {
            names.push(self.gateway.resolve_label(label).await?);
        }
        Ok(names)
    }

    /// Number of issues whose labels changed
    async fn try_move_issues(&self, issue_move: &IssueMove) -> Result<usize> {
        if issue_move.selector.is_empty() {
            debug!("Nothing selected");
            return Ok(0);
        }

        let to_remove = self.resolve_labels(&issue_move.remove).await?;
        let to_add = self.resolve_labels(&issue_move.add).await?;
        let issues = self.gateway.list_open_issues(&issue_move.selector).await?;

        let mut updated = 0;
        for issue in issues {
            let new_labels = labels::apply_move(&issue.labels, &to_remove, &to_add);
            if new_labels == issue.labels {
                debug!(iid = %issue.iid, "Labels unchanged");
                continue;
            }

            self.gateway.save_issue_labels(issue.iid, &new_labels).await?;
            updated += 1;
        }

        Ok(updated)
    }
}

/// Log a failed GitLab interaction; the caller carries on.
pub fn log_failure(operation: &str, error: &ClientError) {
    if error.is_authentication() {
        error!(operation, "Authentication to GitLab is not correct");
    } else if let ClientError::RetriesExhausted { attempts, last } = error {
        if error.is_network_error() {
            error!(operation, attempts, error = %last, "GitLab is unreachable, giving up");
        } else {
            error!(operation, attempts, error = %last, "GitLab kept failing, giving up");
        }
    } else if matches!(error, ClientError::NotFound { .. }) {
        warn!(operation, error = %error, "GitLab resource not found");
    } else {
        error!(operation, error = %error, "GitLab request failed");
    }
}
