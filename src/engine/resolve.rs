//! engine::resolve
//!
//! The resolution pipeline: releases in, document text out.
//!
//! Each entry is rendered through the entry template, grouped in taxonomy
//! order into `entry_groups`, and handed to the release template together
//! with the release's own fields. The main template receives the rendered
//! release fragments as `releases`, newest first.
//!
//! # Invariants
//!
//! - Groups follow the configured taxonomy order, never the order of the
//!   release's entry mapping
//! - A type without entries in a release gets no group
//! - Entries of types missing from the taxonomy land in one trailing
//!   `unknown` group

use std::collections::BTreeMap;

use minijinja::{context, Value};

use crate::core::config::MessageType;
use crate::core::entry::Entry;
use crate::core::release::Release;
use crate::render::{RenderError, TemplateKind, TemplateSet};

/// Name of the group collecting entries with unconfigured types.
pub const UNKNOWN_GROUP: &str = "unknown";

/// Render the whole document.
pub fn resolve(
    releases: &[Release],
    message_types: &[MessageType],
    templates: &TemplateSet,
) -> Result<String, RenderError> {
    let fragments = releases
        .iter()
        .map(|release| render_release(release, message_types, templates))
        .collect::<Result<Vec<_>, _>>()?;

    let mut vars = BTreeMap::new();
    vars.insert("releases".to_string(), Value::from(fragments));
    templates.render(TemplateKind::Main, vars)
}

/// Render a single release fragment.
pub fn render_release(
    release: &Release,
    message_types: &[MessageType],
    templates: &TemplateSet,
) -> Result<String, RenderError> {
    let mut vars = release.template_vars();
    vars.insert(
        "entry_groups".to_string(),
        Value::from(entry_groups(release, message_types, templates)?),
    );
    templates.render(TemplateKind::Release, vars)
}

/// Build the `entry_groups` sequence for a release.
pub fn entry_groups(
    release: &Release,
    message_types: &[MessageType],
    templates: &TemplateSet,
) -> Result<Vec<Value>, RenderError> {
    let mut groups = Vec::new();
    for message_type in message_types {
        let Some(entries) = release.entries.get(&message_type.name) else {
            continue;
        };
        if entries.is_empty() {
            continue;
        }
        groups.push(group(
            &message_type.name,
            message_type.title(),
            render_entries(entries.iter(), templates)?,
        ));
    }

    let orphaned: Vec<&str> = release
        .entries
        .iter()
        .filter(|(kind, entries)| {
            !entries.is_empty() && !message_types.iter().any(|t| &t.name == *kind)
        })
        .map(|(kind, _)| kind.as_str())
        .collect();
    if !orphaned.is_empty() {
        tracing::warn!(
            "Release '{}' has entries of unknown types: {}",
            release.release_version,
            orphaned.join(", ")
        );
        let entries = orphaned
            .iter()
            .flat_map(|kind| release.entries[*kind].iter());
        groups.push(group(UNKNOWN_GROUP, "Unknown", render_entries(entries, templates)?));
    }

    Ok(groups)
}

fn render_entries<'a>(
    entries: impl Iterator<Item = &'a Entry>,
    templates: &TemplateSet,
) -> Result<Vec<String>, RenderError> {
    entries
        .map(|entry| templates.render(TemplateKind::Entry, entry.template_vars()))
        .collect()
}

fn group(name: &str, title: &str, entries: Vec<String>) -> Value {
    context! {
        name => name,
        title => title,
        entries => entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FieldValue;
    use chrono::NaiveDate;

    fn templates() -> TemplateSet {
        TemplateSet::from_sources(
            vec![
                (TemplateKind::Entry, "entry.md".into(), "- {{ message }}".into()),
                (
                    TemplateKind::Release,
                    "release.md".into(),
                    "[{{ release_version }}]{% for g in entry_groups %} {{ g.title }}: {{ g.entries|join(',') }}{% endfor %}".into(),
                ),
                (
                    TemplateKind::Main,
                    "main.md".into(),
                    "{{ header }}\n{% for r in releases %}{{ r }}\n{% endfor %}".into(),
                ),
            ],
            &serde_yaml::from_str("header: CHANGES").unwrap(),
        )
        .unwrap()
    }

    fn taxonomy() -> Vec<MessageType> {
        serde_yaml::from_str("- name: feature\n  title: Features\n- name: bug\n- name: doc\n")
            .unwrap()
    }

    fn entry(kind: &str, message: &str) -> Entry {
        Entry::new(kind, 0).with_field("message", FieldValue::Text(message.into()))
    }

    fn release(version: &str, entries: Vec<Entry>) -> Release {
        let mut release = Release::new(version, NaiveDate::from_ymd_opt(2020, 2, 2).unwrap());
        for e in entries {
            release.entries.entry(e.kind.clone()).or_default().push(e);
        }
        release
    }

    #[test]
    fn groups_follow_taxonomy_order() {
        let r = release("v1", vec![entry("bug", "b1"), entry("feature", "f1")]);
        let out = render_release(&r, &taxonomy(), &templates()).unwrap();
        assert_eq!(out, "[v1] Features: - f1 bug: - b1");
    }

    #[test]
    fn empty_types_are_omitted() {
        let mut r = release("v1", vec![entry("bug", "b1")]);
        r.entries.insert("doc".into(), Vec::new());
        let groups = entry_groups(&r, &taxonomy(), &templates()).unwrap();
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn unknown_types_trail() {
        let r = release("v1", vec![entry("chore", "c1"), entry("bug", "b1")]);
        let out = render_release(&r, &taxonomy(), &templates()).unwrap();
        assert_eq!(out, "[v1] bug: - b1 Unknown: - c1");
    }

    #[test]
    fn document_keeps_release_order() {
        let releases = vec![
            release("unreleased", vec![entry("doc", "d1")]),
            release("v1", vec![entry("feature", "f1")]),
        ];
        let out = resolve(&releases, &taxonomy(), &templates()).unwrap();
        assert_eq!(out, "CHANGES\n[unreleased] doc: - d1\n[v1] Features: - f1\n");
    }

    #[test]
    fn render_failure_is_reported() {
        let set = TemplateSet::from_sources(
            vec![
                (TemplateKind::Entry, "entry.md".into(), "{{ message.missing() }}".into()),
                (TemplateKind::Release, "release.md".into(), "r".into()),
                (TemplateKind::Main, "main.md".into(), "m".into()),
            ],
            &serde_yaml::Mapping::new(),
        )
        .unwrap();
        let r = release("v1", vec![entry("bug", "b1")]);
        let err = render_release(&r, &taxonomy(), &set).unwrap_err();
        assert!(matches!(err, RenderError::Render { .. }));
    }
}
