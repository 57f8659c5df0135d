//! Test utilities and common test fixtures for client modules


use std::{collections::HashMap, sync::Mutex, time::Duration};

use async_trait::async_trait;
use compact_str::CompactString;
use serde_json::json;

use crate::{
    client::{
        config::{ClientConfig, IssueFilter},
        error::{ClientError, Result},
        gateway::IssueGateway,
        retry::RetryPolicy,
    },
    domain::{BranchDto, IssueDto, LabelRef},
    id::{IssueIid, ProjectId},
    labels,
};

/// Create JSON representation of an issue
pub fn issue_json(iid: u64, title: &str, labels: &[&str]) -> serde_json::Value {
    json!({
        "id": 90000 + iid,
        "iid": iid,
        "project_id": 1,
        "title": title,
        "state": "opened",
        "labels": labels,
        "web_url": format!("https://gitlab.example.com/group/project/-/issues/{iid}")
    })
}

/// Create JSON representation of a branch listing entry
pub fn branch_json(name: &str, protected: bool) -> serde_json::Value {
    json!({
        "name": name,
        "merged": false,
        "protected": protected,
        "default": false,
        "web_url": format!("https://gitlab.example.com/group/project/-/tree/{name}")
    })
}

/// Create JSON representation of a project label
pub fn label_json(id: u64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "color": "#428BCA",
        "description": null
    })
}

/// Create GitLab API error response
pub fn gitlab_error_response(error: &str, description: Option<&str>) -> serde_json::Value {
    let mut json = json!({
        "error": error
    });

    if let Some(desc) = description {
        json["error_description"] = json!(desc);
    }

    json
}

/// Create GitLab API error response (format 2)
pub fn gitlab_error_response_2(message: &str) -> serde_json::Value {
    json!({
        "message": message
    })
}

/// Retry schedule short enough for tests against a live mock server
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_millis(1),
        multiplier: 2,
        max_elapsed: Duration::from_secs(2),
    }
}

/// Mock HTTP server for testing
pub struct MockServer {
    pub server: wiremock::MockServer,
}

impl MockServer {
    /// Start a new mock server
    pub async fn start() -> Self {
        let server = wiremock::MockServer::start().await;
        Self { server }
    }

    /// Get the base URL of the mock server
    pub fn base_url(&self) -> String {
        format!("{}/api/v4", self.server.uri())
    }

    /// Create a test config pointing to this mock server
    pub fn test_config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url(), ProjectId::new(1), "test-token").with_retry(fast_retry())
    }
}

#[derive(Default)]
struct GatewayState {
    issues: Vec<IssueDto>,
    branches: Vec<BranchDto>,
    labels: HashMap<u64, CompactString>,
    saved: Vec<IssueIid>,
    searches: Vec<CompactString>,
}

/// Issue gateway backed by memory; records saves and branch searches.
#[derive(Default)]
pub struct InMemoryGateway {
    state: Mutex<GatewayState>,
    failure: Option<fn() -> ClientError>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issue(self, iid: u64, labels: &[&str]) -> Self {
        self.state.lock().unwrap().issues.push(IssueDto {
            iid: IssueIid::new(iid),
            title: CompactString::default(),
            labels: labels.iter().map(|&l| l.into()).collect(),
        });
        self
    }

    pub fn with_label(self, id: u64, name: &str) -> Self {
        self.state.lock().unwrap().labels.insert(id, name.into());
        self
    }

    pub fn with_branch(self, name: &str, protected: bool) -> Self {
        self.state
            .lock()
            .unwrap()
            .branches
            .push(BranchDto { name: name.into(), protected });
        self
    }

    /// Every call fails with the given error
    pub fn failing_with(mut self, failure: fn() -> ClientError) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn labels_of(&self, iid: u64) -> Vec<CompactString> {
        self.state
            .lock()
            .unwrap()
            .issues
            .iter()
            .find(|issue| issue.iid == IssueIid::new(iid))
            .map(|issue| issue.labels.clone())
            .unwrap_or_default()
    }

    pub fn saved_iids(&self) -> Vec<IssueIid> {
        self.state.lock().unwrap().saved.clone()
    }

    pub fn branch_searches(&self) -> Vec<CompactString> {
        self.state.lock().unwrap().searches.clone()
    }

    fn check(&self) -> Result<()> {
        match self.failure {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IssueGateway for InMemoryGateway {
    async fn find_protected_branch(&self, search: &str) -> Result<Option<BranchDto>> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state.searches.push(search.into());

        let prefix = search.to_lowercase();
        Ok(state
            .branches
            .iter()
            .filter(|branch| branch.name.to_lowercase().starts_with(&prefix))
            .find(|branch| branch.protected)
            .cloned())
    }

    async fn resolve_label(&self, label: &LabelRef) -> Result<CompactString> {
        self.check()?;
        match label {
            LabelRef::Name(name) => Ok(name.clone()),
            LabelRef::Id(id) => self
                .state
                .lock()
                .unwrap()
                .labels
                .get(&id.value())
                .cloned()
                .ok_or_else(|| ClientError::not_found("Label")),
        }
    }

    async fn add_label_to_issue(&self, iid: IssueIid, label: &str) -> Result<()> {
        self.check()?;
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let issue = state
            .issues
            .iter_mut()
            .find(|issue| issue.iid == iid)
            .ok_or_else(|| ClientError::not_found("Issue"))?;

        let updated = labels::add_label_if_absent(&issue.labels, label);
        if updated != issue.labels {
            issue.labels = updated;
            state.saved.push(iid);
        }
        Ok(())
    }

    async fn list_open_issues(&self, filter: &IssueFilter) -> Result<Vec<IssueDto>> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .issues
            .iter()
            .filter(|issue| match filter {
                IssueFilter::Iids(iids) => iids.contains(&issue.iid),
                IssueFilter::Labels(labels) => labels.iter().all(|l| issue.labels.contains(l)),
            })
            .cloned()
            .collect())
    }

    async fn save_issue_labels(&self, iid: IssueIid, labels: &[CompactString]) -> Result<()> {
        self.check()?;
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let issue = state
            .issues
            .iter_mut()
            .find(|issue| issue.iid == iid)
            .ok_or_else(|| ClientError::not_found("Issue"))?;

        issue.labels = labels.to_vec();
        state.saved.push(iid);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::module_inception)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_deserialize() {
        let issue: IssueDto = serde_json::from_value(issue_json(7, "Title", &["bug"])).unwrap();
        assert_eq!(issue.iid, IssueIid::new(7));
        assert_eq!(issue.labels, vec![CompactString::from("bug")]);

        let branch: BranchDto = serde_json::from_value(branch_json("master", true)).unwrap();
        assert!(branch.protected);
    }

    #[test]
    fn test_error_responses() {
        let error1 = gitlab_error_response("invalid_token", Some("Token is invalid"));
        assert_eq!(error1["error"], "invalid_token");
        assert_eq!(error1["error_description"], "Token is invalid");

        let error2 = gitlab_error_response_2("Project not found");
        assert_eq!(error2["message"], "Project not found");
    }

    #[tokio::test]
    async fn test_in_memory_gateway_branch_search() {
        let gateway = InMemoryGateway::new()
            .with_branch("Master-old", false)
            .with_branch("master", true);

        let found = gateway.find_protected_branch("MASTER").await.unwrap();
        assert_eq!(found.map(|b| b.name), Some("master".into()));
        assert_eq!(gateway.branch_searches(), vec![CompactString::from("MASTER")]);
    }
}
