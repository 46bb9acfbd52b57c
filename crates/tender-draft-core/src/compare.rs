//! Side-by-side comparison of two historical versions of a document.
//!
//! Index `0` is the most recent version. Version `b` is shown on the
//! left as the "old" side and version `a` on the right as the "new" side,
//! so the usual call is `compare_versions(doc, ids, 0, 1)`: latest on the
//! right, the one before it on the left.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::diff::{diff_segments, DiffStyle};
use crate::models::{DocumentVersion, SavedDocument};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    #[error("not enough version history to compare ({available} version(s), need at least 2)")]
    InsufficientHistory { available: usize },
    #[error("version index {index} out of range (history has {len} versions)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Comparison result for one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SectionComparison {
    Same {
        content: String,
    },
    Changed {
        rendered_old: String,
        rendered_new: String,
    },
}

impl SectionComparison {
    pub fn is_same(&self) -> bool {
        matches!(self, SectionComparison::Same { .. })
    }
}

/// Header information for one side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
}

impl VersionInfo {
    fn of(index: usize, version: &DocumentVersion) -> Self {
        Self {
            index,
            timestamp: version.timestamp,
            summary: version.summary.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionComparison {
    /// Left side (version `b`).
    pub old: VersionInfo,
    /// Right side (version `a`).
    pub new: VersionInfo,
    pub sections: BTreeMap<String, SectionComparison>,
}

impl VersionComparison {
    pub fn changed_count(&self) -> usize {
        self.sections.values().filter(|s| !s.is_same()).count()
    }
}

/// Compare versions `index_a` (new side) and `index_b` (old side) of
/// `document` for every id in `section_ids`, rendering with HTML markers.
pub fn compare_versions<'a, I>(
    document: &SavedDocument,
    section_ids: I,
    index_a: usize,
    index_b: usize,
) -> Result<VersionComparison, CompareError>
where
    I: IntoIterator<Item = &'a str>,
{
    compare_versions_styled(document, section_ids, index_a, index_b, DiffStyle::Html)
}

/// [`compare_versions`] with a choice of marker style.
pub fn compare_versions_styled<'a, I>(
    document: &SavedDocument,
    section_ids: I,
    index_a: usize,
    index_b: usize,
    style: DiffStyle,
) -> Result<VersionComparison, CompareError>
where
    I: IntoIterator<Item = &'a str>,
{
    let history = &document.history;
    if history.len() < 2 {
        return Err(CompareError::InsufficientHistory {
            available: history.len(),
        });
    }
    let version_a = version_at(history, index_a)?;
    let version_b = version_at(history, index_b)?;

    let mut sections = BTreeMap::new();
    for id in section_ids {
        let text_a = version_a.sections.get(id).map(String::as_str).unwrap_or("");
        let text_b = version_b.sections.get(id).map(String::as_str).unwrap_or("");
        let result = if text_a == text_b {
            SectionComparison::Same {
                content: text_a.to_string(),
            }
        } else {
            let rendered = diff_segments(text_b, text_a).render(style);
            SectionComparison::Changed {
                rendered_old: rendered.old,
                rendered_new: rendered.new,
            }
        };
        sections.insert(id.to_string(), result);
    }

    Ok(VersionComparison {
        old: VersionInfo::of(index_b, version_b),
        new: VersionInfo::of(index_a, version_a),
        sections,
    })
}

/// Every section id that appears in any version or in the current content.
pub fn known_section_ids(document: &SavedDocument) -> Vec<String> {
    let mut ids: Vec<String> = document
        .sections
        .keys()
        .chain(document.history.iter().flat_map(|v| v.sections.keys()))
        .cloned()
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

fn version_at(history: &[DocumentVersion], index: usize) -> Result<&DocumentVersion, CompareError> {
    history.get(index).ok_or(CompareError::IndexOutOfRange {
        index,
        len: history.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SectionMap;
    use crate::versions::save_document;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn sections(pairs: &[(&str, &str)]) -> SectionMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// A document saved twice: "the cat sat" then "the dog sat".
    fn two_version_doc() -> SavedDocument {
        let (first, _) = save_document(
            None,
            SavedDocument::draft(
                1,
                "TR",
                sections(&[("objeto", "the cat sat"), ("prazo", "30 dias")]),
            ),
            ts(0),
        );
        let mut edited = first.clone();
        edited
            .sections
            .insert("objeto".to_string(), "the dog sat".to_string());
        save_document(Some(&first), edited, ts(60)).0
    }

    #[test]
    fn test_single_version_is_insufficient() {
        let (doc, _) = save_document(None, SavedDocument::draft(1, "TR", SectionMap::new()), ts(0));
        let err = compare_versions(&doc, ["objeto"], 0, 1).unwrap_err();
        assert_eq!(err, CompareError::InsufficientHistory { available: 1 });
    }

    #[test]
    fn test_out_of_range_index() {
        let doc = two_version_doc();
        let err = compare_versions(&doc, ["objeto"], 0, 5).unwrap_err();
        assert_eq!(err, CompareError::IndexOutOfRange { index: 5, len: 2 });
    }

    #[test]
    fn test_b_is_old_side_and_a_is_new_side() {
        let doc = two_version_doc();
        let cmp = compare_versions(&doc, ["objeto", "prazo"], 0, 1).unwrap();
        assert_eq!(
            cmp.sections["objeto"],
            SectionComparison::Changed {
                rendered_old: "the <del>cat</del> sat".to_string(),
                rendered_new: "the <ins>dog</ins> sat".to_string(),
            }
        );
        assert_eq!(
            cmp.sections["prazo"],
            SectionComparison::Same {
                content: "30 dias".to_string()
            }
        );
        assert_eq!(cmp.new.index, 0);
        assert_eq!(cmp.old.index, 1);
        assert_eq!(cmp.changed_count(), 1);
    }

    #[test]
    fn test_swapped_indices_swap_sides() {
        let doc = two_version_doc();
        let cmp = compare_versions(&doc, ["objeto"], 1, 0).unwrap();
        assert_eq!(
            cmp.sections["objeto"],
            SectionComparison::Changed {
                rendered_old: "the <del>dog</del> sat".to_string(),
                rendered_new: "the <ins>cat</ins> sat".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_section_defaults_to_empty() {
        let doc = two_version_doc();
        let cmp = compare_versions(&doc, ["anexos"], 0, 1).unwrap();
        assert_eq!(
            cmp.sections["anexos"],
            SectionComparison::Same {
                content: String::new()
            }
        );
    }

    #[test]
    fn test_same_index_has_no_changes() {
        let doc = two_version_doc();
        let cmp = compare_versions(&doc, ["objeto", "prazo"], 1, 1).unwrap();
        assert_eq!(cmp.changed_count(), 0);
    }

    #[test]
    fn test_known_section_ids_union() {
        let mut doc = two_version_doc();
        doc.sections.insert("extra".to_string(), String::new());
        assert_eq!(known_section_ids(&doc), vec!["extra", "objeto", "prazo"]);
    }
}
