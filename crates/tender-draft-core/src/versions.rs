//! Append-only document version history.
//!
//! [`save_documents`] merges an incoming collection into the stored one.
//! Each incoming document either:
//!
//! - is new, and gets a single "document created" version;
//! - differs from its stored copy, and gets one new version prepended to
//!   the stored history, with a summary naming what changed;
//! - is identical to its stored copy, and the stored copy is kept exactly
//!   as it was (same `updated_at`, same history).
//!
//! Documents are matched by `id`. The output contains exactly the
//! incoming documents, so a document left out of `incoming` is deleted
//! together with its history.
//!
//! New document ids come from an [`IdAllocator`] rather than the raw wall
//! clock, so two documents created in the same millisecond still get
//! distinct ids.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{DocumentVersion, SavedDocument};

/// Summary recorded on the first version of a document.
pub const CREATED_SUMMARY: &str = "document created";

/// A tracked field that differs between two saves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Name,
    Priority,
    Sections,
    Attachments,
}

impl Change {
    pub fn description(&self) -> &'static str {
        match self {
            Change::Name => "name changed",
            Change::Priority => "priority changed",
            Change::Sections => "section content modified",
            Change::Attachments => "attachments updated",
        }
    }
}

/// What a save did to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated { summary: String },
    Unchanged,
}

/// Tracked fields that differ, in check order: name, priority, sections,
/// attachments.
///
/// Section maps compare by key set and values, independent of insertion
/// order; attachment lists compare element by element, in order.
pub fn detect_changes(stored: &SavedDocument, incoming: &SavedDocument) -> Vec<Change> {
    let mut changes = Vec::new();
    if stored.name != incoming.name {
        changes.push(Change::Name);
    }
    if stored.priority != incoming.priority {
        changes.push(Change::Priority);
    }
    if stored.sections != incoming.sections {
        changes.push(Change::Sections);
    }
    if stored.attachments != incoming.attachments {
        changes.push(Change::Attachments);
    }
    changes
}

/// Join change descriptions into a version summary.
pub fn summarize(changes: &[Change]) -> String {
    let parts: Vec<&str> = changes.iter().map(Change::description).collect();
    format!("Changed: {}.", parts.join(", "))
}

/// Save one document against its stored copy, if any.
pub fn save_document(
    stored: Option<&SavedDocument>,
    incoming: SavedDocument,
    now: DateTime<Utc>,
) -> (SavedDocument, SaveOutcome) {
    let Some(stored) = stored else {
        let version = DocumentVersion {
            timestamp: now,
            summary: CREATED_SUMMARY.to_string(),
            sections: incoming.sections.clone(),
            attachments: incoming.attachments.clone(),
        };
        let doc = SavedDocument {
            created_at: Some(incoming.created_at.unwrap_or(now)),
            updated_at: Some(now),
            history: vec![version],
            ..incoming
        };
        return (doc, SaveOutcome::Created);
    };

    let changes = detect_changes(stored, &incoming);
    if changes.is_empty() {
        return (stored.clone(), SaveOutcome::Unchanged);
    }

    let summary = summarize(&changes);
    let version = DocumentVersion {
        timestamp: now,
        summary: summary.clone(),
        sections: incoming.sections.clone(),
        attachments: incoming.attachments.clone(),
    };
    let mut history = Vec::with_capacity(stored.history.len() + 1);
    history.push(version);
    history.extend(stored.history.iter().cloned());

    let doc = SavedDocument {
        created_at: incoming.created_at.or(stored.created_at),
        updated_at: Some(now),
        history,
        ..incoming
    };
    (doc, SaveOutcome::Updated { summary })
}

/// Merge `incoming` into `existing`, recording history for every change.
///
/// Returns each saved document with what happened to it, in incoming order.
pub fn save_documents(
    existing: &[SavedDocument],
    incoming: Vec<SavedDocument>,
    now: DateTime<Utc>,
) -> Vec<(SavedDocument, SaveOutcome)> {
    let by_id: HashMap<i64, &SavedDocument> = existing.iter().map(|d| (d.id, d)).collect();
    incoming
        .into_iter()
        .map(|doc| {
            let stored = by_id.get(&doc.id).copied();
            save_document(stored, doc, now)
        })
        .collect()
}

/// Issues ids for newly created documents.
pub trait IdAllocator {
    fn next_id(&mut self, now: DateTime<Utc>) -> i64;
}

/// Millisecond-timestamp ids that never repeat and never go backwards.
///
/// Returns `max(now_ms, last + 1)`.
#[derive(Debug, Clone, Default)]
pub struct MonotonicIdAllocator {
    last: i64,
}

impl MonotonicIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// An allocator that will not reissue any of `ids`.
    pub fn seeded(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            last: ids.into_iter().max().unwrap_or(0),
        }
    }
}

impl IdAllocator for MonotonicIdAllocator {
    fn next_id(&mut self, now: DateTime<Utc>) -> i64 {
        let id = now.timestamp_millis().max(self.last + 1);
        self.last = id;
        id
    }
}
