//! Issue label workflow: what happens to issues when GitLab reports an event

pub mod engine;
pub mod protected_branches;

use std::sync::Arc;

use tracing::{debug, info, instrument};

pub use engine::WorkflowEngine;
pub use protected_branches::protected_branch_propagation;

use crate::{
    client::{service::log_failure, GitlabService, IssueGateway},
    config::AppConfig,
    event::WorkflowEvent,
};

/// Runs the engine's plans through the GitLab service
#[derive(Clone)]
pub struct Workflow {
    config: Arc<AppConfig>,
    service: GitlabService,
}

impl Workflow {
    pub fn new(config: Arc<AppConfig>, gateway: Arc<dyn IssueGateway>) -> Self {
        Self { config, service: GitlabService::new(gateway) }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handle one event start to finish. Remote failures are logged, never returned.
    #[instrument(skip_all)]
    pub async fn handle(&self, event: WorkflowEvent) {
        let engine = WorkflowEngine::new(&self.config);

        match event {
            WorkflowEvent::IssueCreated { iid, title, label_ids, label_names } => {
                info!(iid = %iid, "Issue created");
                let labels = engine.on_issue_created(&title, &label_ids, &label_names);
                if labels.is_empty() {
                    debug!(iid = %iid, "Issue needs no labels");
                } else {
                    self.service.add_labels_to_issue(iid, &labels).await;
                }
            },
            WorkflowEvent::MergeRequestOpened { description, source_branch } => {
                info!(source_branch = %source_branch, "Merge request opened");
                if let Some(issue_move) =
                    engine.on_merge_request_opened(&description, &source_branch)
                {
                    self.service.move_issues(&issue_move).await;
                }
            },
            WorkflowEvent::MergeRequestMerged { description, source_branch, target_branch } => {
                info!(
                    source_branch = %source_branch,
                    target_branch = %target_branch,
                    "Merge request merged"
                );
                if let Some(issue_move) =
                    engine.on_merge_request_merged(&description, &source_branch, &target_branch)
                {
                    self.service.move_issues(&issue_move).await;
                }
                self.propagate_protected_branch(&source_branch, &target_branch)
                    .await;
            },
        }
    }

    async fn propagate_protected_branch(&self, source_branch: &str, target_branch: &str) {
        let lookup = self.service.gateway().as_ref();
        let convention = &self.config.patterns.merge_protected_branch;

        match protected_branch_propagation(source_branch, target_branch, convention, lookup).await
        {
            Ok(Some(propagation)) => self.service.propagate(&propagation).await,
            Ok(None) => debug!("Not a merge between protected branches"),
            Err(e) => log_failure("protected branch lookup", &e),
        }
    }
}

#[cfg(test)]
mod tests {
    use compact_str::CompactString;

    use super::*;
    use crate::{
        client::{tests::InMemoryGateway, ClientError},
        config::tests::named_labels_config,
        domain::LabelRef,
        id::IssueIid,
    };

    fn labels(names: &[&str]) -> Vec<CompactString> {
        names.iter().map(|&n| n.into()).collect()
    }

    fn workflow(gateway: &Arc<InMemoryGateway>) -> Workflow {
        Workflow::new(Arc::new(named_labels_config()), gateway.clone())
    }

    #[tokio::test]
    async fn test_issue_created_gets_labels() {
        let gateway = Arc::new(InMemoryGateway::new().with_issue(1234, &[]));

        workflow(&gateway)
            .handle(WorkflowEvent::IssueCreated {
                iid: IssueIid::new(1234),
                title: "[BUG] [BACKEND] Something doesn't work".into(),
                label_ids: vec![],
                label_names: vec![],
            })
            .await;

        assert_eq!(gateway.labels_of(1234), labels(&["bug", "backend", "To do"]));
    }

    #[tokio::test]
    async fn test_unknown_identifier_label_still_moves_issue_to_do() {
        let gateway = Arc::new(InMemoryGateway::new().with_issue(1, &[]));
        let mut config = named_labels_config();
        for rule in config.patterns.issue_identifiers.iter_mut().filter(|r| r.name == "bug") {
            rule.label = LabelRef::id(7);
        }

        Workflow::new(Arc::new(config), gateway.clone())
            .handle(WorkflowEvent::IssueCreated {
                iid: IssueIid::new(1),
                title: "[BUG] crash".into(),
                label_ids: vec![],
                label_names: vec![],
            })
            .await;

        assert_eq!(gateway.labels_of(1), labels(&["To do"]));
    }

    #[tokio::test]
    async fn test_merge_request_opened_moves_issues_to_review() {
        let gateway = Arc::new(
            InMemoryGateway::new()
                .with_issue(1000, &["In Progress", "backend"])
                .with_issue(1018, &["To do", "backend"])
                .with_issue(2000, &["In Progress"]),
        );

        workflow(&gateway)
            .handle(WorkflowEvent::MergeRequestOpened {
                description: "Fixes #1000, #1018".into(),
                source_branch: "2000-fixes".into(),
            })
            .await;

        assert_eq!(gateway.labels_of(1000), labels(&["backend", "CR"]));
        assert_eq!(gateway.labels_of(1018), labels(&["backend", "CR"]));
        assert_eq!(gateway.labels_of(2000), labels(&["In Progress"]));
    }

    #[tokio::test]
    async fn test_merge_into_protected_branch_propagates_labels() {
        let gateway = Arc::new(
            InMemoryGateway::new()
                .with_branch("master", true)
                .with_branch("iteration", true)
                .with_issue(7, &["backend", "master branch"])
                .with_issue(8, &["frontend"]),
        );

        workflow(&gateway)
            .handle(WorkflowEvent::MergeRequestMerged {
                description: "".into(),
                source_branch: "merge/master_to_iteration_1.01".into(),
                target_branch: "iteration".into(),
            })
            .await;

        assert_eq!(gateway.labels_of(7), labels(&["backend", "master branch", "iteration branch"]));
        assert_eq!(gateway.labels_of(8), labels(&["frontend"]));
        assert_eq!(
            gateway.branch_searches(),
            labels(&["merge/master_to_iteration_1.01", "iteration", "master"])
        );
    }

    #[tokio::test]
    async fn test_merge_request_merged_moves_referenced_issues() {
        let gateway = Arc::new(
            InMemoryGateway::new()
                .with_issue(1000, &["backend", "CR"])
                .with_issue(1012, &["bug", "backend", "CR"]),
        );

        workflow(&gateway)
            .handle(WorkflowEvent::MergeRequestMerged {
                description: "Related to #1000, #1012".into(),
                source_branch: "feature".into(),
                target_branch: "master".into(),
            })
            .await;

        assert_eq!(gateway.labels_of(1000), labels(&["backend", "merged", "master branch"]));
        assert_eq!(
            gateway.labels_of(1012),
            labels(&["bug", "backend", "merged", "master branch"])
        );
    }

    #[tokio::test]
    async fn test_gateway_failure_does_not_escape() {
        let gateway = Arc::new(
            InMemoryGateway::new()
                .with_issue(1, &["CR"])
                .failing_with(|| ClientError::Timeout),
        );

        workflow(&gateway)
            .handle(WorkflowEvent::MergeRequestMerged {
                description: "#1".into(),
                source_branch: "master".into(),
                target_branch: "iteration".into(),
            })
            .await;

        assert_eq!(gateway.labels_of(1), labels(&["CR"]));
    }
}
