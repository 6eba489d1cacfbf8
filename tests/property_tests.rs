//! Property-based tests for grouping, ordering and naming.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use proptest::prelude::*;

use changelogd::core::entry::Entry;
use changelogd::core::types::{FieldValue, Fingerprint};
use changelogd::engine::group_entries;

/// Strategy for a small taxonomy of type names.
fn kind() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("feature".to_string()),
        Just("bug".to_string()),
        Just("doc".to_string()),
        Just("other".to_string()),
    ]
}

/// Strategy for entries with a unique tag field and colliding timestamps.
fn entries() -> impl Strategy<Value = Vec<Entry>> {
    prop::collection::vec((kind(), 0i64..20), 0..40).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (kind, timestamp))| {
                Entry::new(kind, timestamp).with_field("tag", FieldValue::Text(i.to_string()))
            })
            .collect()
    })
}

fn tags(entries: &[Entry]) -> Vec<String> {
    let mut tags: Vec<String> = entries.iter().map(|e| e.fields["tag"].to_string()).collect();
    tags.sort();
    tags
}

proptest! {
    /// Grouping then flattening keeps every entry exactly once.
    #[test]
    fn grouping_preserves_multiset(entries in entries()) {
        let groups = group_entries(entries.clone());
        let flattened: Vec<Entry> = groups.values().flatten().cloned().collect();
        prop_assert_eq!(tags(&flattened), tags(&entries));
    }

    /// Every entry lands in the group of its own type.
    #[test]
    fn groups_are_homogeneous(entries in entries()) {
        for (kind, group) in group_entries(entries) {
            prop_assert!(!group.is_empty());
            prop_assert!(group.iter().all(|e| e.kind == kind));
        }
    }

    /// Within a group, timestamps never increase.
    #[test]
    fn newest_first(entries in entries()) {
        for group in group_entries(entries).values() {
            prop_assert!(group.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        }
    }

    /// The same input order always yields the same output order.
    #[test]
    fn ordering_is_deterministic(entries in entries()) {
        prop_assert_eq!(group_entries(entries.clone()), group_entries(entries));
    }

    /// Fingerprints are stable and the short form is 8 hex characters.
    #[test]
    fn fingerprint_short_form(values in prop::collection::vec(".*", 0..6)) {
        let a = Fingerprint::compute(values.clone());
        let b = Fingerprint::compute(values);
        prop_assert_eq!(a.as_str(), b.as_str());
        prop_assert_eq!(a.short().len(), 8);
        prop_assert!(a.short().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
