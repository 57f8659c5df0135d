//! Application configuration
//!
//! The configuration is a single YAML document, loaded once at startup and
//! shared read-only afterwards. Loading validates the document against a
//! schema, resolves environment-sourced tokens, compiles every pattern and
//! merges the issue identifier rules with the built-in defaults.

pub mod error;
pub mod identifiers;
pub mod schema;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use compact_str::CompactString;
use directories::BaseDirs;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

pub use error::ConfigError;
pub use identifiers::{IssueIdentifierRule, RawIssueIdentifier};

use crate::{domain::LabelRef, id::ProjectId};

pub const DEFAULT_CONFIG_FILE: &str = ".gitlab-config.yml";
pub const DEFAULT_API_VERSION: &str = "4";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SSL_VERIFICATION: bool = true;
pub const DEFAULT_ISSUES_DESCRIPTION_PATTERN: &str = r"#(\d+)";
pub const DEFAULT_ISSUES_SOURCE_BRANCH_PATTERN: &str = r"-?(\d+)-?";
pub const DEFAULT_MERGE_PROTECTED_BRANCH_PATTERN: &str = r"merge/(.+?)_to";

/// `./.gitlab-config.yml` if present, else the per-user config directory.
pub fn default_config_path() -> PathBuf {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return local;
    }

    if let Some(dirs) = BaseDirs::new() {
        dirs.config_dir().join("gitlab-autolabel").join("config.yml")
    } else {
        local
    }
}

/// Token given literally or read from an environment variable at load time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TokenSource {
    Literal(CompactString),
    Env { env: CompactString },
}

impl TokenSource {
    /// Resolve the token, looking environment variables up through `lookup`.
    pub fn resolve_with<F>(&self, lookup: F) -> Result<CompactString, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            TokenSource::Literal(token) => Ok(token.clone()),
            TokenSource::Env { env } => lookup(env)
                .map(CompactString::from)
                .ok_or_else(|| ConfigError::missing_env(env.clone())),
        }
    }
}

/// GitLab connection settings
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Instance URL, e.g. `https://gitlab.example.com/`
    pub url: CompactString,
    pub project_id: ProjectId,
    pub private_token: CompactString,
    pub api_version: CompactString,
    pub timeout: Duration,
    pub ssl_verify: bool,
}

/// Workflow labels. The four stage labels are mandatory, the rest only feed
/// the default issue identifier rules.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelsConfig {
    pub to_do: LabelRef,
    pub in_progress: LabelRef,
    pub in_review: LabelRef,
    pub merged: LabelRef,
    #[serde(default)]
    pub backend: Option<LabelRef>,
    #[serde(default)]
    pub frontend: Option<LabelRef>,
    #[serde(default)]
    pub bug: Option<LabelRef>,
}

impl LabelsConfig {
    /// Optional label by its configuration key
    pub fn optional(&self, key: &str) -> Option<&LabelRef> {
        match key {
            "backend" => self.backend.as_ref(),
            "frontend" => self.frontend.as_ref(),
            "bug" => self.bug.as_ref(),
            _ => None,
        }
    }
}

/// Compiled text patterns
#[derive(Debug, Clone)]
pub struct PatternsConfig {
    /// Issue references in merge request descriptions
    pub issues_description: Regex,
    /// Issue numbers in source branch names
    pub issues_source_branch: Regex,
    /// `merge/<protected>_to...` naming convention
    pub merge_protected_branch: Regex,
    /// User rules first, then remaining defaults
    pub issue_identifiers: Vec<IssueIdentifierRule>,
}

#[cfg(test)]
impl Default for PatternsConfig {
    fn default() -> Self {
        Self {
            issues_description: Regex::new(DEFAULT_ISSUES_DESCRIPTION_PATTERN)
                .expect("default description pattern is valid"),
            issues_source_branch: Regex::new(DEFAULT_ISSUES_SOURCE_BRANCH_PATTERN)
                .expect("default branch pattern is valid"),
            merge_protected_branch: Regex::new(DEFAULT_MERGE_PROTECTED_BRANCH_PATTERN)
                .expect("default protected branch pattern is valid"),
            issue_identifiers: Vec::new(),
        }
    }
}

/// Fully resolved application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub connection: ConnectionConfig,
    pub labels: LabelsConfig,
    pub patterns: PatternsConfig,
    /// Expected `X-Gitlab-Token`; `None` disables the check
    pub secret_token: Option<CompactString>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    connection: RawConnection,
    labels: LabelsConfig,
    #[serde(default)]
    patterns: RawPatterns,
    #[serde(default)]
    secret_token: Option<TokenSource>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConnection {
    url: CompactString,
    project_id: ProjectId,
    private_token: TokenSource,
    #[serde(default)]
    api_version: Option<CompactString>,
    #[serde(default)]
    timeout: Option<u64>,
    #[serde(default)]
    ssl_verify: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPatterns {
    #[serde(default)]
    issues_description_regex: Option<String>,
    #[serde(default, alias = "issues_source_branch")]
    issues_source_branch_regex: Option<String>,
    #[serde(default, alias = "merge_protected_branches")]
    merge_protected_branch_regex: Option<String>,
    #[serde(default)]
    issue_identifiers: Vec<RawIssueIdentifier>,
}

impl AppConfig {
    /// Load and resolve the configuration file at `path`.
    pub fn load_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        debug!(path = %path.display(), "Loaded configuration file");
        Self::load(&content)
    }

    /// Load a configuration document, reading tokens from the process environment.
    pub fn load(document: &str) -> Result<Self, ConfigError> {
        Self::load_with_env(document, |name| std::env::var(name).ok())
    }

    /// Load a configuration document with a custom environment lookup.
    pub fn load_with_env<F>(document: &str, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value: serde_json::Value = serde_yaml::from_str(document)?;
        if value.is_null() {
            return Err(ConfigError::validation("configuration file is empty"));
        }
        schema::validate_document(&value)?;

        let raw: RawConfig = serde_json::from_value(value)
            .map_err(|e| ConfigError::validation(e.to_string()))?;

        Self::resolve(raw, env)
    }

    fn resolve<F>(raw: RawConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let RawConfig { connection, labels, patterns, secret_token } = raw;

        let private_token = connection.private_token.resolve_with(&env)?;
        let secret_token = secret_token
            .map(|token| token.resolve_with(&env))
            .transpose()?
            .filter(|token| !token.is_empty());

        let mut errors = Vec::new();
        if private_token.trim().is_empty() {
            errors.push("connection.private_token: token cannot be empty".to_string());
        }
        if !connection.url.starts_with("http://") && !connection.url.starts_with("https://") {
            errors.push("connection.url: must start with http:// or https://".to_string());
        }

        let mut compile = |key: &str, given: Option<&str>, default: &str| {
            Regex::new(given.unwrap_or(default))
                .map_err(|e| errors.push(format!("patterns.{key}: invalid pattern: {e}")))
                .ok()
        };
        let issues_description = compile(
            "issues_description_regex",
            patterns.issues_description_regex.as_deref(),
            DEFAULT_ISSUES_DESCRIPTION_PATTERN,
        );
        let issues_source_branch = compile(
            "issues_source_branch_regex",
            patterns.issues_source_branch_regex.as_deref(),
            DEFAULT_ISSUES_SOURCE_BRANCH_PATTERN,
        );
        let merge_protected_branch = compile(
            "merge_protected_branch_regex",
            patterns.merge_protected_branch_regex.as_deref(),
            DEFAULT_MERGE_PROTECTED_BRANCH_PATTERN,
        );

        let issue_identifiers =
            match identifiers::merge_issue_identifiers(&patterns.issue_identifiers, &labels) {
                Ok(rules) => rules,
                Err(e) => {
                    errors.extend(e.validation_messages().iter().cloned());
                    Vec::new()
                },
            };

        let (Some(issues_description), Some(issues_source_branch), Some(merge_protected_branch)) =
            (issues_description, issues_source_branch, merge_protected_branch)
        else {
            return Err(ConfigError::validation_errors(errors));
        };
        if !errors.is_empty() {
            return Err(ConfigError::validation_errors(errors));
        }

        let connection = ConnectionConfig {
            url: connection.url,
            project_id: connection.project_id,
            private_token,
            api_version: connection
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.into()),
            timeout: Duration::from_secs(connection.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            ssl_verify: connection.ssl_verify.unwrap_or(DEFAULT_SSL_VERIFICATION),
        };

        Ok(Self {
            connection,
            labels,
            patterns: PatternsConfig {
                issues_description,
                issues_source_branch,
                merge_protected_branch,
                issue_identifiers,
            },
            secret_token,
        })
    }
}
