//! Order-preserving edits on an issue's label list

use compact_str::CompactString;

/// Drop every label found in `to_remove`, keeping the order of the rest.
pub fn remove_labels(current: &[CompactString], to_remove: &[CompactString]) -> Vec<CompactString> {
    current
        .iter()
        .filter(|label| !to_remove.contains(*label))
        .cloned()
        .collect()
}

/// Append `label` unless it is already there.
pub fn add_label_if_absent(current: &[CompactString], label: &str) -> Vec<CompactString> {
    let mut labels = current.to_vec();
    if !labels.iter().any(|l| l.as_str() == label) {
        labels.push(label.into());
    }
    labels
}

/// Removals first, then each addition in order.
pub fn apply_move(
    current: &[CompactString],
    to_remove: &[CompactString],
    to_add: &[CompactString],
) -> Vec<CompactString> {
    to_add
        .iter()
        .fold(remove_labels(current, to_remove), |labels, label| {
            add_label_if_absent(&labels, label)
        })
}
