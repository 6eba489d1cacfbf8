//! engine::aggregate
//!
//! The release aggregator: pending entries in, in-progress release out.
//!
//! # Ordering
//!
//! Entries are grouped by `type`. Within a group the newest entry comes
//! first: the group is stably sorted by ascending timestamp and then
//! reversed, so entries sharing a timestamp come out in reverse scan order.
//! Scan order is file name order, which makes the result deterministic.
//!
//! # Release Date
//!
//! Final releases and drafts are dated today. A partial release under
//! `--check` is dated from the newest modification time among the pending
//! entries and the output document, so re-running it on unchanged input
//! reproduces the same bytes on a later day.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDate};
use thiserror::Error;

use super::scan::Snapshot;
use super::{ReleaseMode, ReleaseOptions};
use crate::core::entry::Entry;
use crate::core::release::Release;
use crate::ui::prompts::{PromptError, Prompter};

/// Errors from aggregation.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("there are no entries to release; use --empty to create an empty release")]
    NoEntries,

    #[error("failed to read the release description: {0}")]
    Prompt(#[from] PromptError),
}

/// The aggregator's output.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    /// The in-progress release; `None` when a partial or draft run has
    /// nothing pending.
    pub release: Option<Release>,
    /// Entry files the release consumes (final releases only).
    pub consumed: Vec<PathBuf>,
}

/// Group entries by type, newest first within each group.
pub fn group_entries<I>(entries: I) -> BTreeMap<String, Vec<Entry>>
where
    I: IntoIterator<Item = Entry>,
{
    let mut groups: BTreeMap<String, Vec<Entry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.kind.clone()).or_default().push(entry);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|entry| entry.timestamp);
        group.reverse();
    }
    groups
}

/// Build the in-progress release for a run.
///
/// # Errors
///
/// [`AggregateError::NoEntries`] if a final release has nothing to release
/// and `allow_empty` is not set. This is checked before any prompt.
pub fn aggregate(
    snapshot: &Snapshot,
    options: &ReleaseOptions,
    today: NaiveDate,
    prompter: &mut dyn Prompter,
) -> Result<Aggregation, AggregateError> {
    if snapshot.pending.is_empty() {
        match options.mode {
            ReleaseMode::Final if !options.allow_empty => return Err(AggregateError::NoEntries),
            ReleaseMode::Final => {}
            ReleaseMode::Partial | ReleaseMode::Draft => {
                tracing::warn!("There are no pending entries; rendering the release history only");
                return Ok(Aggregation {
                    release: None,
                    consumed: Vec::new(),
                });
            }
        }
    }

    let mut release = Release::new(options.version.clone(), release_date(snapshot, options, today));
    release.entries = group_entries(snapshot.pending.iter().map(|p| p.entry.clone()));
    release.id = Some(snapshot.next_id);
    release.previous_release = snapshot.latest_version().map(String::from);

    let consumed = if options.mode == ReleaseMode::Final {
        release.release_description = description(options, prompter)?;
        snapshot.pending.iter().map(|p| p.path.clone()).collect()
    } else {
        Vec::new()
    };

    Ok(Aggregation {
        release: Some(release),
        consumed,
    })
}

/// Date stamped on the in-progress release.
pub fn release_date(snapshot: &Snapshot, options: &ReleaseOptions, today: NaiveDate) -> NaiveDate {
    if options.mode == ReleaseMode::Final || !options.check {
        return today;
    }
    snapshot
        .pending
        .iter()
        .filter_map(|p| p.modified)
        .chain(snapshot.output_modified)
        .max()
        .map(local_date)
        .unwrap_or(today)
}

fn local_date(time: SystemTime) -> NaiveDate {
    DateTime::<Local>::from(time).date_naive()
}

fn description(
    options: &ReleaseOptions,
    prompter: &mut dyn Prompter,
) -> Result<Option<String>, AggregateError> {
    if let Some(description) = &options.description {
        return Ok(Some(description.clone()).filter(|d| !d.trim().is_empty()));
    }
    match prompter.input("Release description (hit ENTER to omit)", None) {
        Ok(answer) => Ok(Some(answer.trim().to_string()).filter(|d| !d.is_empty())),
        Err(PromptError::NotInteractive) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FieldValue;
    use crate::engine::scan::PendingEntry;
    use crate::ui::prompts::{NonInteractive, ScriptedPrompter};
    use std::time::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 2, 3).unwrap()
    }

    fn pending(name: &str, kind: &str, timestamp: i64) -> PendingEntry {
        PendingEntry {
            path: PathBuf::from(format!("/c/{}", name)),
            entry: Entry::new(kind, timestamp),
            modified: None,
        }
    }

    fn snapshot(pending: Vec<PendingEntry>) -> Snapshot {
        Snapshot {
            pending,
            next_id: 2,
            history: vec![Release::new("0.2", today()), Release::new("0.1", today())],
            ..Default::default()
        }
    }

    mod grouping {
        use super::*;

        #[test]
        fn newest_first_within_group() {
            let groups = group_entries(vec![
                Entry::new("feature", 1),
                Entry::new("bug", 5),
                Entry::new("feature", 3),
                Entry::new("feature", 2),
            ]);
            let stamps: Vec<_> = groups["feature"].iter().map(|e| e.timestamp).collect();
            assert_eq!(stamps, vec![3, 2, 1]);
            assert_eq!(groups["bug"].len(), 1);
        }

        #[test]
        fn equal_timestamps_reverse_input_order() {
            let entries = vec![
                Entry::new("feature", 7).with_field("n", FieldValue::Text("a".into())),
                Entry::new("feature", 7).with_field("n", FieldValue::Text("b".into())),
            ];
            let groups = group_entries(entries);
            let names: Vec<_> = groups["feature"]
                .iter()
                .map(|e| e.fields["n"].to_string())
                .collect();
            assert_eq!(names, vec!["b", "a"]);
        }
    }

    #[test]
    fn final_without_entries_fails_before_prompt() {
        let mut prompter = ScriptedPrompter::new(["never asked"]);
        let options = ReleaseOptions::new("1.0", ReleaseMode::Final);
        let err = aggregate(&snapshot(vec![]), &options, today(), &mut prompter).unwrap_err();
        assert!(matches!(err, AggregateError::NoEntries));
        assert!(prompter.asked.is_empty());
    }

    #[test]
    fn final_empty_allowed() {
        let mut options = ReleaseOptions::new("1.0", ReleaseMode::Final);
        options.allow_empty = true;
        let result = aggregate(&snapshot(vec![]), &options, today(), &mut NonInteractive).unwrap();
        let release = result.release.unwrap();
        assert!(release.entries.is_empty());
        assert_eq!(release.id, Some(2));
        assert_eq!(release.previous_release.as_deref(), Some("0.2"));
        assert!(result.consumed.is_empty());
    }

    #[test]
    fn partial_without_entries_has_no_release() {
        let options = ReleaseOptions::new("unreleased", ReleaseMode::Partial);
        let result = aggregate(&snapshot(vec![]), &options, today(), &mut NonInteractive).unwrap();
        assert!(result.release.is_none());
    }

    #[test]
    fn final_consumes_entries_and_prompts() {
        let mut prompter = ScriptedPrompter::new(["  First release "]);
        let options = ReleaseOptions::new("1.0", ReleaseMode::Final);
        let snap = snapshot(vec![
            pending("a.entry.yaml", "feature", 1),
            pending("b.entry.yaml", "bug", 2),
        ]);

        let result = aggregate(&snap, &options, today(), &mut prompter).unwrap();
        let release = result.release.unwrap();
        assert_eq!(release.release_description.as_deref(), Some("First release"));
        assert_eq!(release.release_date, today());
        assert_eq!(release.entry_count(), 2);
        assert_eq!(result.consumed.len(), 2);
    }

    #[test]
    fn description_flag_skips_prompt() {
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let mut options = ReleaseOptions::new("1.0", ReleaseMode::Final);
        options.description = Some("Given".into());
        let snap = snapshot(vec![pending("a.entry.yaml", "feature", 1)]);

        let release = aggregate(&snap, &options, today(), &mut prompter)
            .unwrap()
            .release
            .unwrap();
        assert_eq!(release.release_description.as_deref(), Some("Given"));
        assert!(prompter.asked.is_empty());
    }

    #[test]
    fn non_interactive_final_has_no_description() {
        let options = ReleaseOptions::new("1.0", ReleaseMode::Final);
        let snap = snapshot(vec![pending("a.entry.yaml", "feature", 1)]);
        let release = aggregate(&snap, &options, today(), &mut NonInteractive)
            .unwrap()
            .release
            .unwrap();
        assert_eq!(release.release_description, None);
    }

    #[test]
    fn partial_keeps_entries_and_never_prompts() {
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let options = ReleaseOptions::new("unreleased", ReleaseMode::Partial);
        let snap = snapshot(vec![pending("a.entry.yaml", "feature", 1)]);

        let result = aggregate(&snap, &options, today(), &mut prompter).unwrap();
        assert!(result.consumed.is_empty());
        assert!(prompter.asked.is_empty());
        assert_eq!(result.release.unwrap().release_description, None);
    }

    #[test]
    fn partial_check_dates_from_newest_input() {
        let old = SystemTime::UNIX_EPOCH + Duration::from_secs(1_580_608_922);
        let new = old + Duration::from_secs(3 * 86_400);
        let mut entry = pending("a.entry.yaml", "feature", 1);
        entry.modified = Some(old);
        let mut snap = snapshot(vec![entry]);
        snap.output_modified = Some(new);

        let mut options = ReleaseOptions::new("unreleased", ReleaseMode::Partial);
        assert_eq!(release_date(&snap, &options, today()), today());

        options.check = true;
        assert_eq!(release_date(&snap, &options, today()), local_date(new));
    }
}
