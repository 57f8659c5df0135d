//! Maps workflow events to label plans

use compact_str::CompactString;
use tracing::debug;

use crate::{
    client::config::IssueFilter,
    config::AppConfig,
    domain::{IssueMove, LabelRef},
    id::LabelId,
    patterns::resolve_issue_numbers,
};

/// Decides which labels change for an event. Never talks to GitLab.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowEngine<'a> {
    config: &'a AppConfig,
}

impl<'a> WorkflowEngine<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    /// Labels to add to a new issue, in order: matching identifier labels,
    /// then `to_do` unless the issue is already planned or in progress.
    pub fn on_issue_created(
        &self,
        title: &str,
        label_ids: &[LabelId],
        label_names: &[CompactString],
    ) -> Vec<LabelRef> {
        let present = |label: &LabelRef| label.is_present(label_ids, label_names);

        let mut requests: Vec<LabelRef> = self
            .config
            .patterns
            .issue_identifiers
            .iter()
            .filter(|rule| rule.matches(title) && !present(&rule.label))
            .inspect(|rule| debug!(rule = %rule.name, "Issue identifier matched"))
            .map(|rule| rule.label.clone())
            .collect();

        let labels = &self.config.labels;
        if !present(&labels.to_do) && !present(&labels.in_progress) {
            requests.push(labels.to_do.clone());
        }

        requests
    }

    /// Referenced issues go to review
    pub fn on_merge_request_opened(
        &self,
        description: &str,
        source_branch: &str,
    ) -> Option<IssueMove> {
        let labels = &self.config.labels;
        self.referenced_issues(description, source_branch).map(|selector| IssueMove {
            selector,
            remove: vec![labels.to_do.clone(), labels.in_progress.clone()],
            add: vec![labels.in_review.clone()],
        })
    }

    /// Referenced issues are merged and marked as present on the target branch
    pub fn on_merge_request_merged(
        &self,
        description: &str,
        source_branch: &str,
        target_branch: &str,
    ) -> Option<IssueMove> {
        let labels = &self.config.labels;
        self.referenced_issues(description, source_branch).map(|selector| IssueMove {
            selector,
            remove: vec![labels.in_review.clone()],
            add: vec![labels.merged.clone(), LabelRef::branch(target_branch)],
        })
    }

    fn referenced_issues(&self, description: &str, source_branch: &str) -> Option<IssueFilter> {
        let iids = resolve_issue_numbers(description, source_branch, &self.config.patterns);
        if iids.is_empty() {
            debug!(source_branch, "No issue references found");
            None
        } else {
            Some(IssueFilter::Iids(iids))
        }
    }
}
