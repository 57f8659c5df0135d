//! Core HTTP client for GitLab API

use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use compact_str::{format_compact, CompactString, ToCompactString};
use itertools::Itertools;
use reqwest::{header::RETRY_AFTER, Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use tracing::{debug, instrument, warn};

use super::{
    config::{ClientConfig, IssueFilter},
    error::{ClientError, Result},
    gateway::IssueGateway,
};
use crate::{
    domain::{BranchDto, IssueDto, LabelDto, LabelRef, ProjectDto},
    id::IssueIid,
    labels,
};

const NEXT_PAGE_HEADER: &str = "x-next-page";
const NO_QUERY: &[(&str, CompactString)] = &[];

/// Pure HTTP client for GitLab API
#[derive(Debug, Clone)]
pub struct GitlabApi {
    client: Client,
    config: ClientConfig,
}

/// GitLab API error response formats
#[derive(Debug, Deserialize)]
struct GitlabApiError {
    error: CompactString,
    error_description: Option<CompactString>,
}

#[derive(Debug, Deserialize)]
struct GitlabApiError2 {
    message: serde_json::Value,
}

impl GitlabApi {
    /// Create a new GitLab API client
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request.timeout)
            .danger_accept_invalid_certs(!config.request.ssl_verify)
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self { client, config })
    }

    /// Get the configured project
    #[instrument(skip(self), fields(project_id = %self.config.project_id))]
    pub async fn get_project(&self) -> Result<ProjectDto> {
        let url = self.config.project_url("");
        let url = url.trim_end_matches('/');
        self.config
            .retry
            .run("get_project", || self.get_json(url, NO_QUERY))
            .await
    }

    /// Get a single issue
    #[instrument(skip(self), fields(iid = %iid))]
    pub async fn get_issue(&self, iid: IssueIid) -> Result<IssueDto> {
        let url = self.config.project_url(&format!("issues/{iid}"));
        self.config
            .retry
            .run("get_issue", || self.get_json(&url, NO_QUERY))
            .await
    }

    /// Get a label by id
    #[instrument(skip(self))]
    pub async fn get_label(&self, id: u64) -> Result<LabelDto> {
        let url = self.config.project_url(&format!("labels/{id}"));
        self.config
            .retry
            .run("get_label", || self.get_json(&url, NO_QUERY))
            .await
    }

    // Private helper methods

    /// Perform authenticated GET request and deserialize JSON response
    async fn get_json<T>(&self, url: &str, query: &[(&str, CompactString)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let (value, _) = self.get_page(url, query).await?;
        Ok(value)
    }

    /// GET returning the body and the number of the next page, if any
    async fn get_page<T>(
        &self,
        url: &str,
        query: &[(&str, CompactString)],
    ) -> Result<(T, Option<u32>)>
    where
        T: DeserializeOwned,
    {
        let request = self.authenticated_request(self.client.get(url)).query(query);
        let response = request.send().await?;
        let next_page = response
            .headers()
            .get(NEXT_PAGE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u32>().ok());

        let value = self.handle_response(response).await?;
        Ok((value, next_page))
    }

    /// Perform authenticated PUT with a JSON body
    async fn put_json<T>(&self, url: &str, body: &serde_json::Value) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let request = self.authenticated_request(self.client.put(url)).json(body);
        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Attach the access token
    fn authenticated_request(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("PRIVATE-TOKEN", self.config.private_token.as_str())
    }

    /// Handle HTTP response and deserialize JSON
    async fn handle_response<T>(&self, response: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url_path = response.url().path().to_string();
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response.text().await?;

        // Log response if debug is enabled
        if self.config.debug.log_responses {
            self.log_response_to_file(&url_path, &body);
        }

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| ClientError::json_parse(url_path, e))
        } else {
            self.handle_error_response(status, &body, retry_after)
        }
    }

    /// Handle error responses from GitLab API
    fn handle_error_response<T>(
        &self,
        status: StatusCode,
        body: &str,
        retry_after: Option<Duration>,
    ) -> Result<T> {
        let code = status.as_u16();
        match status {
            StatusCode::UNAUTHORIZED => Err(ClientError::Authentication),
            StatusCode::NOT_FOUND => Err(ClientError::not_found("Resource")),
            StatusCode::TOO_MANY_REQUESTS => Err(ClientError::rate_limit(retry_after)),
            _ => {
                // Try to parse GitLab API error formats
                if let Ok(api_error) = serde_json::from_str::<GitlabApiError>(body) {
                    Err(ClientError::gitlab_api(
                        code,
                        format_compact!(
                            "HTTP {}: {} {}",
                            code,
                            api_error.error,
                            api_error.error_description.unwrap_or_default()
                        ),
                    ))
                } else if let Ok(api_error2) = serde_json::from_str::<GitlabApiError2>(body) {
                    let message = match api_error2.message {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    Err(ClientError::gitlab_api(code, format_compact!("HTTP {}: {}", code, message)))
                } else {
                    Err(ClientError::gitlab_api(code, format_compact!("HTTP {}: {}", code, body)))
                }
            },
        }
    }

    /// Log HTTP response to file for debugging
    fn log_response_to_file(&self, path: &str, body: &str) {
        if let Some(log_dir) = &self.config.debug.log_directory {
            if !log_dir.exists() {
                if let Err(e) = std::fs::create_dir_all(log_dir) {
                    warn!("Failed to create log directory: {}", e);
                    return;
                }
            }

            let filename = format!(
                "{}_{}.json",
                Local::now().format("%Y-%m-%d_%H-%M-%S%.3f"),
                path.replace('/', "_")
            );

            let log_path = log_dir.join(filename);

            if let Err(e) = std::fs::write(&log_path, body) {
                warn!("Failed to write response log to {:?}: {}", log_path, e);
            } else {
                debug!("Response logged to {:?}", log_path);
            }
        }
    }
}

#[async_trait]
impl IssueGateway for GitlabApi {
    #[instrument(skip(self))]
    async fn find_protected_branch(&self, search: &str) -> Result<Option<BranchDto>> {
        let url = self.config.project_url("repository/branches");
        let query = [("search", format_compact!("^{search}"))];

        let branches: Vec<BranchDto> = self
            .config
            .retry
            .run("find_protected_branch", || self.get_json(&url, &query))
            .await?;

        let found = branches.into_iter().find(|branch| branch.protected);
        debug!(branch = ?found.as_ref().map(|b| &b.name), "Protected branch lookup finished");
        Ok(found)
    }

    async fn resolve_label(&self, label: &LabelRef) -> Result<CompactString> {
        match label {
            LabelRef::Name(name) => Ok(name.clone()),
            LabelRef::Id(id) => {
                let label = self.get_label(id.value()).await?;
                debug!(id = %label.id, name = %label.name, "Resolved label");
                Ok(label.name)
            },
        }
    }

    #[instrument(skip(self), fields(iid = %iid))]
    async fn add_label_to_issue(&self, iid: IssueIid, label: &str) -> Result<()> {
        let issue = self.get_issue(iid).await?;
        let updated = labels::add_label_if_absent(&issue.labels, label);

        if updated == issue.labels {
            debug!(title = %issue.title, "Issue already carries the label");
            return Ok(());
        }
        self.save_issue_labels(iid, &updated).await
    }

    #[instrument(skip(self))]
    async fn list_open_issues(&self, filter: &IssueFilter) -> Result<Vec<IssueDto>> {
        if filter.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.config.project_url("issues");
        let mut issues = Vec::new();
        let mut page: u32 = 1;

        loop {
            let mut query = filter.query_params();
            query.push(("per_page", self.config.request.per_page.to_compact_string()));
            query.push(("page", page.to_compact_string()));

            let (batch, next_page): (Vec<IssueDto>, _) = self
                .config
                .retry
                .run("list_open_issues", || self.get_page(&url, &query))
                .await?;
            issues.extend(batch);

            match next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        debug!(issue_count = issues.len(), "Fetched open issues");
        Ok(issues)
    }

    #[instrument(skip(self, labels), fields(iid = %iid, labels = %labels.iter().join(",")))]
    async fn save_issue_labels(&self, iid: IssueIid, labels: &[CompactString]) -> Result<()> {
        let url = self.config.project_url(&format!("issues/{iid}"));
        let body = json!({ "labels": labels.iter().join(",") });

        let _: IssueDto = self
            .config
            .retry
            .run("save_issue_labels", || self.put_json(&url, &body))
            .await?;
        debug!("Saved issue labels");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ProjectId;

    fn test_config() -> ClientConfig {
        ClientConfig::new("https://gitlab.example.com/api/v4", ProjectId::new(1), "test-token")
    }

    #[test]
    fn test_api_creation() {
        let config = test_config();
        let api = GitlabApi::new(config);
        assert!(api.is_ok());
    }

    #[test]
    fn test_api_creation_invalid_config() {
        let config = ClientConfig::new("", ProjectId::new(1), "test-token");
        let api = GitlabApi::new(config);
        assert!(api.is_err());
    }

    #[test]
    fn test_error_handling() {
        let api = GitlabApi::new(test_config()).unwrap();

        let error = api.handle_error_response::<()>(StatusCode::UNAUTHORIZED, "", None);
        assert!(matches!(error, Err(ClientError::Authentication)));

        let error = api.handle_error_response::<()>(StatusCode::NOT_FOUND, "", None);
        assert!(matches!(error, Err(ClientError::NotFound { .. })));

        let wait = Some(Duration::from_secs(3));
        let error = api.handle_error_response::<()>(StatusCode::TOO_MANY_REQUESTS, "", wait);
        assert!(matches!(error, Err(ClientError::RateLimit { retry_after }) if retry_after == wait));
    }

    #[test]
    fn test_error_message_formats() {
        let api = GitlabApi::new(test_config()).unwrap();

        let error = api
            .handle_error_response::<()>(
                StatusCode::BAD_REQUEST,
                r#"{"message": {"labels": ["is invalid"]}}"#,
                None,
            )
            .unwrap_err();
        assert!(error.to_string().contains("is invalid"));
        assert!(!error.is_retryable());

        let error = api
            .handle_error_response::<()>(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>", None)
            .unwrap_err();
        assert!(matches!(error, ClientError::GitlabApi { status: 502, .. }));
        assert!(error.is_retryable());
    }
}
