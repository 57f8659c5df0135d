// GitLab API Documentation: https://docs.gitlab.com/ee/api/api_resources.html
use compact_str::{format_compact, CompactString};
use serde::Deserialize;

use crate::{
    client::config::IssueFilter,
    id::{IssueIid, LabelId, ProjectId},
};

/// A label as written in the configuration: either its name or its numeric id.
///
/// Ids are only meaningful to GitLab, so they are resolved to names by the
/// gateway right before an issue is edited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum LabelRef {
    Id(LabelId),
    Name(CompactString),
}

impl LabelRef {
    #[cfg(test)]
    pub fn name(name: impl Into<CompactString>) -> Self {
        Self::Name(name.into())
    }

    #[cfg(test)]
    pub fn id(id: u64) -> Self {
        Self::Id(LabelId::new(id))
    }

    /// Label that marks an issue's changes as present on `branch`.
    pub fn branch(branch: &str) -> Self {
        Self::Name(branch_label(branch))
    }

    /// Whether an issue carrying `ids`/`names` already has this label.
    pub fn is_present(&self, ids: &[LabelId], names: &[CompactString]) -> bool {
        match self {
            LabelRef::Id(id) => ids.contains(id),
            LabelRef::Name(name) => names.contains(name),
        }
    }
}

impl std::fmt::Display for LabelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LabelRef::Id(id) => write!(f, "label#{id}"),
            LabelRef::Name(name) => write!(f, "{name}"),
        }
    }
}

/// `"<branch> branch"`; created on the fly by GitLab when missing.
pub fn branch_label(branch: &str) -> CompactString {
    format_compact!("{branch} branch")
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectDto {
    pub id: ProjectId,
    #[serde(default)]
    pub path_with_namespace: CompactString,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueDto {
    pub iid: IssueIid,
    #[serde(default)]
    pub title: CompactString,
    #[serde(default)]
    pub labels: Vec<CompactString>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BranchDto {
    pub name: CompactString,
    #[serde(default)]
    pub protected: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelDto {
    pub id: LabelId,
    pub name: CompactString,
}

/// Relabel every open issue matched by `selector`: drop `remove`, then append
/// each of `add` that is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueMove {
    pub selector: IssueFilter,
    pub remove: Vec<LabelRef>,
    pub add: Vec<LabelRef>,
}

/// Issues already labelled for one protected branch also get the label of
/// the branch it was merged into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPropagation {
    pub from_label: CompactString,
    pub to_label: CompactString,
}

impl LabelPropagation {
    pub fn between(source_branch: &str, target_branch: &str) -> Self {
        Self {
            from_label: branch_label(source_branch),
            to_label: branch_label(target_branch),
        }
    }

    pub fn to_move(&self) -> IssueMove {
        IssueMove {
            selector: IssueFilter::Labels(vec![self.from_label.clone()]),
            remove: Vec::new(),
            add: vec![LabelRef::Name(self.to_label.clone())],
        }
    }
}
