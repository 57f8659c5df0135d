//! Issue identifier rules: title markers that map to labels

use compact_str::CompactString;
use itertools::Itertools;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use super::{error::ConfigError, LabelsConfig};
use crate::domain::LabelRef;

/// Built-in rules, in the order they are appended after user rules.
pub const DEFAULT_ISSUE_IDENTIFIERS: [(&str, &str); 3] = [
    ("bug", r"\[BUG\]"),
    ("backend", r"\[BACKEND\]"),
    ("frontend", r"\[FRONTEND\]"),
];

/// A rule as written in the configuration document
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawIssueIdentifier {
    pub name: CompactString,
    pub label: LabelRef,
    pub pattern: String,
}

/// Adds `label` to newly created issues whose title matches `pattern`.
#[derive(Debug, Clone)]
pub struct IssueIdentifierRule {
    pub name: CompactString,
    pub label: LabelRef,
    /// Compiled case-insensitive
    pub pattern: Regex,
}

impl IssueIdentifierRule {
    pub fn new(
        name: impl Into<CompactString>,
        label: LabelRef,
        pattern: &str,
    ) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self { name: name.into(), label, pattern })
    }

    pub fn matches(&self, title: &str) -> bool {
        self.pattern.is_match(title)
    }
}

/// Compile user rules and append the defaults they don't override.
///
/// A default is added only when no user rule shares its name and its label is
/// configured. Errors from every rule are collected.
pub fn merge_issue_identifiers(
    user_rules: &[RawIssueIdentifier],
    labels: &LabelsConfig,
) -> Result<Vec<IssueIdentifierRule>, ConfigError> {
    let mut errors = Vec::new();

    for name in user_rules.iter().map(|r| &r.name).duplicates() {
        errors.push(format!("patterns.issue_identifiers: duplicate rule name '{name}'"));
    }

    let mut rules: Vec<IssueIdentifierRule> = user_rules
        .iter()
        .filter_map(|raw| {
            IssueIdentifierRule::new(raw.name.clone(), raw.label.clone(), &raw.pattern)
                .map_err(|e| {
                    errors.push(format!(
                        "patterns.issue_identifiers[{}]: invalid pattern: {e}",
                        raw.name
                    ))
                })
                .ok()
        })
        .collect();

    if !errors.is_empty() {
        return Err(ConfigError::validation_errors(errors));
    }

    for (name, pattern) in DEFAULT_ISSUE_IDENTIFIERS {
        if user_rules.iter().any(|r| r.name == name) {
            continue;
        }
        let Some(label) = labels.optional(name) else {
            continue;
        };
        let rule = IssueIdentifierRule::new(name, label.clone(), pattern)
            .map_err(|e| ConfigError::Schema(e.to_string()))?;
        rules.push(rule);
    }

    Ok(rules)
}
