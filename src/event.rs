//! Webhook events as GitLab delivers them, and the workflow events they map to

use compact_str::CompactString;
use serde::Deserialize;
use thiserror::Error;

use crate::id::{IssueIid, LabelId};

/// Value of the `X-Gitlab-Event` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitlabEvent {
    MergeRequest,
    Issue,
    Push,
}

impl GitlabEvent {
    pub const HEADER: &'static str = "X-Gitlab-Event";

    pub fn from_header(value: &str) -> Option<Self> {
        match value {
            "Merge Request Hook" => Some(Self::MergeRequest),
            "Issue Hook" => Some(Self::Issue),
            "Push Hook" => Some(Self::Push),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn as_header(&self) -> &'static str {
        match self {
            GitlabEvent::MergeRequest => "Merge Request Hook",
            GitlabEvent::Issue => "Issue Hook",
            GitlabEvent::Push => "Push Hook",
        }
    }

    /// Events this receiver acts upon
    pub fn is_handled(&self) -> bool {
        matches!(self, GitlabEvent::MergeRequest | GitlabEvent::Issue)
    }
}

/// Why a delivery body was rejected
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("payload has no object_attributes")]
    MissingAttributes,
    #[error("object_attributes has an unexpected shape: {0}")]
    InvalidAttributes(#[source] serde_json::Error),
    #[error("object_attributes.{0} is required for this event")]
    MissingField(&'static str),
}

/// `object_attributes` of merge request and issue hooks; only the fields read
/// by the workflow. GitLab sends `null` for empty descriptions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectAttributes {
    #[serde(default)]
    pub action: Option<CompactString>,
    #[serde(default)]
    pub description: Option<CompactString>,
    #[serde(default)]
    pub source_branch: Option<CompactString>,
    #[serde(default)]
    pub target_branch: Option<CompactString>,
    #[serde(default)]
    pub title: Option<CompactString>,
    #[serde(default)]
    pub iid: Option<IssueIid>,
    #[serde(default)]
    pub labels: Vec<HookLabel>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookLabel {
    #[serde(default)]
    pub id: Option<LabelId>,
    #[serde(default)]
    pub title: Option<CompactString>,
}

/// What happened, in workflow terms
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    IssueCreated {
        iid: IssueIid,
        title: CompactString,
        label_ids: Vec<LabelId>,
        label_names: Vec<CompactString>,
    },
    MergeRequestOpened {
        description: CompactString,
        source_branch: CompactString,
    },
    MergeRequestMerged {
        description: CompactString,
        source_branch: CompactString,
        target_branch: CompactString,
    },
}

impl ObjectAttributes {
    /// Extract `object_attributes` from a delivery body. Absent, null and
    /// empty objects are all rejected.
    pub fn from_payload(body: &[u8]) -> Result<Self, PayloadError> {
        let mut payload: serde_json::Value =
            serde_json::from_slice(body).map_err(PayloadError::InvalidJson)?;

        let attributes = payload
            .get_mut("object_attributes")
            .map(serde_json::Value::take)
            .filter(|value| value.as_object().is_some_and(|o| !o.is_empty()))
            .ok_or(PayloadError::MissingAttributes)?;

        serde_json::from_value(attributes).map_err(PayloadError::InvalidAttributes)
    }

    /// Map a delivery to a workflow event. `None` for deliveries that are
    /// accepted but not acted upon (issue updates, closed merge requests, ...).
    /// An opened issue without an `iid` cannot be labelled and is rejected.
    pub fn into_workflow_event(
        self,
        kind: GitlabEvent,
    ) -> Result<Option<WorkflowEvent>, PayloadError> {
        let action = self.action.as_deref().unwrap_or_default();
        let event = match (kind, action) {
            (GitlabEvent::MergeRequest, "open") => Some(WorkflowEvent::MergeRequestOpened {
                description: self.description.unwrap_or_default(),
                source_branch: self.source_branch.unwrap_or_default(),
            }),
            (GitlabEvent::MergeRequest, "merge") => Some(WorkflowEvent::MergeRequestMerged {
                description: self.description.unwrap_or_default(),
                source_branch: self.source_branch.unwrap_or_default(),
                target_branch: self.target_branch.unwrap_or_default(),
            }),
            (GitlabEvent::Issue, "open") => {
                let iid = self.iid.ok_or(PayloadError::MissingField("iid"))?;
                Some(WorkflowEvent::IssueCreated {
                    iid,
                    title: self.title.unwrap_or_default(),
                    label_ids: self.labels.iter().filter_map(|l| l.id).collect(),
                    label_names: self.labels.into_iter().filter_map(|l| l.title).collect(),
                })
            },
            _ => None,
        };
        Ok(event)
    }
}
