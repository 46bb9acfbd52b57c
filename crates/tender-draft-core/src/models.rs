//! Core data models shared by the chunker, version store, comparison
//! selector, and context selector.
//!
//! Serialized field names follow the persisted JSON layout
//! (`createdAt`, `isLocked`, `type`, ...) so that collections written by
//! earlier versions of the application load unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Section id → rich-text content (possibly HTML).
///
/// A `BTreeMap` so that equality and serialization do not depend on the
/// order in which sections were inserted.
pub type SectionMap = BTreeMap<String, String>;

/// A span of extracted text attributed to the file it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextChunk {
    pub content: String,
    pub source: String,
}

impl ContextChunk {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
        }
    }
}

/// A reference document uploaded for retrieval context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// File name; unique among stored files.
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Raw file bytes, base64 encoded.
    pub content: String,
    pub chunks: Vec<String>,
    pub selected: bool,
    #[serde(rename = "isLocked", default)]
    pub locked: bool,
}

impl UploadedFile {
    /// The file's chunks attributed to the file name.
    pub fn context_chunks(&self) -> impl Iterator<Item = ContextChunk> + '_ {
        self.chunks
            .iter()
            .map(move |c| ContextChunk::new(c.clone(), self.name.clone()))
    }
}

/// A file attached to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    /// Base64 encoded content.
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        f.write_str(s)
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!(
                "unknown priority '{}': expected low, medium, or high",
                other
            )),
        }
    }
}

/// A frozen snapshot of a document, recorded once per change-producing save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    pub sections: SectionMap,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// A drafted document together with its version history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDocument {
    pub id: i64,
    pub name: String,
    /// `None` only for a draft that has never been saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sections: SectionMap,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Most recent first.
    #[serde(default)]
    pub history: Vec<DocumentVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl SavedDocument {
    /// A new, never-saved draft.
    pub fn draft(id: i64, name: impl Into<String>, sections: SectionMap) -> Self {
        Self {
            id,
            name: name.into(),
            created_at: None,
            updated_at: None,
            sections,
            attachments: Vec::new(),
            history: Vec::new(),
            priority: None,
        }
    }
}

/// The two kinds of procurement documents, each kept in its own collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// Technical preliminary study.
    Etp,
    /// Terms of reference.
    Tr,
}

impl DocumentType {
    /// Key under which the collection is persisted.
    pub fn storage_key(&self) -> &'static str {
        match self {
            DocumentType::Etp => "savedETPs",
            DocumentType::Tr => "savedTRs",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentType::Etp => f.write_str("etp"),
            DocumentType::Tr => f.write_str("tr"),
        }
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "etp" => Ok(DocumentType::Etp),
            "tr" => Ok(DocumentType::Tr),
            other => Err(format!(
                "unknown document type '{}': expected etp or tr",
                other
            )),
        }
    }
}
