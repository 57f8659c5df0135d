//! Issue numbers and branch names extracted from free text

use compact_str::CompactString;
use regex::Regex;

use crate::{config::PatternsConfig, id::IssueIid};

/// All issue numbers `pattern` finds in `text`, in order of occurrence.
///
/// The first capture group holds the number; patterns without a group use the
/// whole match. Captures that are not integers are skipped.
pub fn extract_issue_numbers(text: &str, pattern: &Regex) -> Vec<IssueIid> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
        .filter_map(|m| m.as_str().parse::<u64>().ok())
        .map(IssueIid::new)
        .collect()
}

/// First capture group of `pattern` in `branch_name`, e.g. `master` out of
/// `merge/master_to_iteration_1.01`.
pub fn extract_protected_branch_name(branch_name: &str, pattern: &Regex) -> Option<CompactString> {
    pattern
        .captures(branch_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().into())
}

/// Issue numbers referenced by a merge request.
///
/// The description wins when it mentions any issue; the source branch is only
/// consulted otherwise.
pub fn resolve_issue_numbers(
    description: &str,
    source_branch: &str,
    patterns: &PatternsConfig,
) -> Vec<IssueIid> {
    let from_description = extract_issue_numbers(description, &patterns.issues_description);
    if !from_description.is_empty() {
        return from_description;
    }

    extract_issue_numbers(source_branch, &patterns.issues_source_branch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        DEFAULT_ISSUES_DESCRIPTION_PATTERN, DEFAULT_ISSUES_SOURCE_BRANCH_PATTERN,
        DEFAULT_MERGE_PROTECTED_BRANCH_PATTERN,
    };

    fn numbers(values: &[u64]) -> Vec<IssueIid> {
        values.iter().copied().map(IssueIid::new).collect()
    }

    fn description_pattern() -> Regex {
        Regex::new(DEFAULT_ISSUES_DESCRIPTION_PATTERN).unwrap()
    }

    fn branch_pattern() -> Regex {
        Regex::new(DEFAULT_ISSUES_SOURCE_BRANCH_PATTERN).unwrap()
    }

    #[test]
    fn test_extract_issue_numbers_from_description() {
        let cases: [(&str, &[u64]); 6] = [
            ("Related to #123", &[123]),
            ("Related to #123, #321", &[123, 321]),
            ("Text", &[]),
            ("", &[]),
            ("#123 #321 #111 #222 #333", &[123, 321, 111, 222, 333]),
            ("#123#321", &[123, 321]),
        ];

        for (description, expected) in cases {
            assert_eq!(
                extract_issue_numbers(description, &description_pattern()),
                numbers(expected),
                "description: {description:?}"
            );
        }
    }

    #[test]
    fn test_extract_issue_numbers_from_branch() {
        let cases: [(&str, &[u64]); 6] = [
            ("be/123-something", &[123]),
            ("fe/123-321-something", &[123, 321]),
            ("some-string-without-numbers", &[]),
            ("", &[]),
            ("123-321-111-222-333", &[123, 321, 111, 222, 333]),
            ("fe/bug-123-321", &[123, 321]),
        ];

        for (branch, expected) in cases {
            assert_eq!(
                extract_issue_numbers(branch, &branch_pattern()),
                numbers(expected),
                "branch: {branch:?}"
            );
        }
    }

    #[test]
    fn test_extract_without_capture_group_uses_whole_match() {
        let pattern = Regex::new(r"\d+").unwrap();
        assert_eq!(extract_issue_numbers("a12b34", &pattern), numbers(&[12, 34]));
    }

    #[test]
    fn test_extract_skips_non_numeric_captures() {
        let pattern = Regex::new(r"#(\w+)").unwrap();
        assert_eq!(extract_issue_numbers("#abc #42", &pattern), numbers(&[42]));
    }

    #[test]
    fn test_extract_protected_branch_name() {
        let pattern = Regex::new(DEFAULT_MERGE_PROTECTED_BRANCH_PATTERN).unwrap();
        let cases = [
            ("merge/master_to_iteration_1.01", Some("master")),
            ("merge/iteration_to_master_1.01", Some("iteration")),
            ("merge/some_branch_to_master123", Some("some_branch")),
            ("1000-backend-fixes", None),
        ];

        for (branch, expected) in cases {
            assert_eq!(
                extract_protected_branch_name(branch, &pattern).as_deref(),
                expected,
                "branch: {branch:?}"
            );
        }
    }

    #[test]
    fn test_description_wins_over_branch() {
        let patterns = PatternsConfig::default();

        assert_eq!(
            resolve_issue_numbers("Related to #1000", "2000-some-fixes", &patterns),
            numbers(&[1000])
        );
        assert_eq!(
            resolve_issue_numbers("No references", "2000-some-fixes", &patterns),
            numbers(&[2000])
        );
        assert!(resolve_issue_numbers("", "feature/login", &patterns).is_empty());
    }
}
