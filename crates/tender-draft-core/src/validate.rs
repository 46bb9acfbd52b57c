//! Required-section checks applied before a document is saved.
//!
//! Section content is rich text, so a section holding only markup (for
//! example `<p><br></p>` left behind by an editor) counts as empty.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::models::{DocumentType, SavedDocument, SectionMap};

/// A section that must have text before a document can be saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredField {
    pub id: &'static str,
    pub label: &'static str,
}

const ETP_REQUIRED: &[RequiredField] = &[RequiredField {
    id: "etp-2-necessidade",
    label: "2. Descrição da Necessidade",
}];

const TR_REQUIRED: &[RequiredField] = &[RequiredField {
    id: "tr-1-objeto",
    label: "1. Objeto",
}];

pub fn required_fields(doc_type: DocumentType) -> &'static [RequiredField] {
    match doc_type {
        DocumentType::Etp => ETP_REQUIRED,
        DocumentType::Tr => TR_REQUIRED,
    }
}

/// A document that cannot be saved, with every required section it lacks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{doc_type} {id} \"{name}\": required field(s) missing: {}", labels(.missing))]
pub struct ValidationError {
    pub doc_type: DocumentType,
    pub id: i64,
    pub name: String,
    pub missing: Vec<RequiredField>,
}

fn labels(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(|f| format!("\"{}\" ({})", f.label, f.id))
        .collect::<Vec<_>>()
        .join(", ")
}

fn html_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

/// Text content of a rich-text fragment: tags removed, common entities
/// decoded.
pub fn strip_html(html: &str) -> String {
    html_tag()
        .replace_all(html, "")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Required fields of `doc_type` that are absent or blank in `sections`.
pub fn missing_fields(doc_type: DocumentType, sections: &SectionMap) -> Vec<RequiredField> {
    required_fields(doc_type)
        .iter()
        .filter(|f| {
            sections
                .get(f.id)
                .map_or(true, |text| strip_html(text).trim().is_empty())
        })
        .copied()
        .collect()
}

pub fn validate_document(doc_type: DocumentType, doc: &SavedDocument) -> Result<(), ValidationError> {
    let missing = missing_fields(doc_type, &doc.sections);
    if missing.is_empty() {
        return Ok(());
    }
    Err(ValidationError {
        doc_type,
        id: doc.id,
        name: doc.name.clone(),
        missing,
    })
}

/// One error per invalid document, in input order.
pub fn validate_documents(doc_type: DocumentType, docs: &[SavedDocument]) -> Vec<ValidationError> {
    docs.iter()
        .filter_map(|doc| validate_document(doc_type, doc).err())
        .collect()
}
