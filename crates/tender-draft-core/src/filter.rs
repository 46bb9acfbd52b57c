//! Filtering and ordering of a saved-document collection for display.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::models::{Priority, SavedDocument};

/// Display order of a document list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Most recently updated first. Documents never saved come last.
    #[default]
    Updated,
    /// Alphabetical by name, ignoring case.
    Name,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Updated => f.write_str("updated"),
            SortOrder::Name => f.write_str("name"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "updated" => Ok(SortOrder::Updated),
            "name" => Ok(SortOrder::Name),
            other => Err(format!("unknown sort order '{}': expected updated or name", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    /// Keep only documents with exactly this priority.
    pub priority: Option<Priority>,
    /// Case-insensitive substring of the document name. Blank matches all.
    pub search: Option<String>,
    pub sort: SortOrder,
}

impl DocumentFilter {
    pub fn matches(&self, doc: &SavedDocument) -> bool {
        if let Some(priority) = self.priority {
            if doc.priority != Some(priority) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                doc.name.to_lowercase().contains(&term.to_lowercase())
            }
            _ => true,
        }
    }

    /// Matching documents in display order. The sort is stable.
    pub fn apply(&self, docs: Vec<SavedDocument>) -> Vec<SavedDocument> {
        let mut docs: Vec<SavedDocument> = docs.into_iter().filter(|d| self.matches(d)).collect();
        docs.sort_by(|a, b| self.compare(a, b));
        docs
    }

    fn compare(&self, a: &SavedDocument, b: &SavedDocument) -> Ordering {
        match self.sort {
            SortOrder::Updated => b.updated_at.cmp(&a.updated_at),
            SortOrder::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SectionMap;
    use chrono::{TimeZone, Utc};

    fn doc(id: i64, name: &str, priority: Option<Priority>, updated: Option<i64>) -> SavedDocument {
        let mut d = SavedDocument::draft(id, name, SectionMap::new());
        d.priority = priority;
        d.updated_at = updated.map(|s| Utc.timestamp_opt(1_700_000_000 + s, 0).unwrap());
        d
    }

    fn sample() -> Vec<SavedDocument> {
        vec![
            doc(1, "TR Cadeiras", Some(Priority::Low), Some(10)),
            doc(2, "tr notebooks", Some(Priority::High), Some(30)),
            doc(3, "Aquisição de Notebooks", Some(Priority::High), Some(20)),
            doc(4, "Rascunho", None, None),
        ]
    }

    fn ids(docs: &[SavedDocument]) -> Vec<i64> {
        docs.iter().map(|d| d.id).collect()
    }

    #[test]
    fn test_default_sorts_by_update_descending() {
        let out = DocumentFilter::default().apply(sample());
        assert_eq!(ids(&out), vec![2, 3, 1, 4]);
    }

    #[test]
    fn test_sort_by_name_ignores_case() {
        let filter = DocumentFilter {
            sort: SortOrder::Name,
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(sample())), vec![3, 4, 1, 2]);
    }

    #[test]
    fn test_priority_and_search_combine() {
        let filter = DocumentFilter {
            priority: Some(Priority::High),
            search: Some("NOTEBOOK".to_string()),
            sort: SortOrder::Name,
        };
        assert_eq!(ids(&filter.apply(sample())), vec![3, 2]);

        let filter = DocumentFilter {
            search: Some("cadeiras".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(sample())), vec![1]);
    }

    #[test]
    fn test_blank_search_matches_all() {
        let filter = DocumentFilter {
            search: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.apply(sample()).len(), 4);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("NAME".parse::<SortOrder>().unwrap(), SortOrder::Name);
        assert!("size".parse::<SortOrder>().is_err());
    }
}
