//! Label propagation between protected branches

use async_trait::async_trait;
use compact_str::CompactString;
use regex::Regex;
use tracing::debug;

use crate::{
    client::{error::Result, gateway::IssueGateway},
    domain::LabelPropagation,
    patterns::extract_protected_branch_name,
};

/// Answers whether a branch is protected
#[async_trait]
pub trait ProtectedBranchLookup: Send + Sync {
    async fn is_protected(&self, branch: &str) -> Result<bool>;
}

#[async_trait]
impl<G> ProtectedBranchLookup for G
where
    G: IssueGateway + ?Sized,
{
    async fn is_protected(&self, branch: &str) -> Result<bool> {
        Ok(self.find_protected_branch(branch).await?.is_some())
    }
}

/// Whether merging `source_branch` into `target_branch` joins two protected
/// branches, and if so which branch label to propagate.
///
/// The source counts as protected either directly or through the
/// `merge/<branch>_to...` convention, in which case `<branch>` is looked up.
/// Lookups happen in the order source, target, convention branch.
pub async fn protected_branch_propagation<L>(
    source_branch: &str,
    target_branch: &str,
    convention: &Regex,
    lookup: &L,
) -> Result<Option<LabelPropagation>>
where
    L: ProtectedBranchLookup + ?Sized,
{
    let source_protected = lookup.is_protected(source_branch).await?;
    let target_protected = lookup.is_protected(target_branch).await?;

    let protected_source: CompactString = if source_protected {
        source_branch.into()
    } else {
        let Some(name) = extract_protected_branch_name(source_branch, convention) else {
            debug!(source_branch, "Source branch is neither protected nor a merge branch");
            return Ok(None);
        };
        if !lookup.is_protected(&name).await? {
            debug!(branch = %name, "Merged branch is not protected");
            return Ok(None);
        }
        name
    };

    if !target_protected {
        debug!(target_branch, "Target branch is not protected");
        return Ok(None);
    }

    Ok(Some(LabelPropagation::between(&protected_source, target_branch)))
}
