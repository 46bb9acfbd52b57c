//! Saved ETP and TR collections.
//!
//! Each [`DocumentType`] has its own collection stored under
//! [`DocumentType::storage_key`]. Saving goes through the version store,
//! so every content change is recorded in the document's history. A save
//! is refused when a document leaves a required section blank.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use thiserror::Error;

use tender_draft_core::filter::{DocumentFilter, SortOrder};
use tender_draft_core::models::{DocumentType, Priority, SavedDocument, SectionMap};
use tender_draft_core::store::{self, KeyValueStore};
use tender_draft_core::templates::{self, Template};
use tender_draft_core::validate::{validate_documents, ValidationError};
use tender_draft_core::versions::{save_documents, IdAllocator, MonotonicIdAllocator, SaveOutcome};

use crate::config::Config;
use crate::db;

/// Documents rejected by a save, one entry per document.
#[derive(Debug, Error)]
#[error("{}", describe(.0))]
pub struct InvalidDocuments(pub Vec<ValidationError>);

fn describe(errors: &[ValidationError]) -> String {
    let mut out = format!("{} document(s) failed validation:", errors.len());
    for e in errors {
        out.push_str("\n  ");
        out.push_str(&e.to_string());
    }
    out
}

fn check_required(doc_type: DocumentType, docs: &[SavedDocument]) -> Result<(), InvalidDocuments> {
    let errors = validate_documents(doc_type, docs);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(InvalidDocuments(errors))
    }
}

pub struct DocumentLibrary<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> DocumentLibrary<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    pub async fn load(&self, doc_type: DocumentType) -> Result<Vec<SavedDocument>> {
        store::load_or_default(self.store, doc_type.storage_key()).await
    }

    /// The collection narrowed and ordered by `filter`.
    pub async fn list(&self, doc_type: DocumentType, filter: &DocumentFilter) -> Result<Vec<SavedDocument>> {
        Ok(filter.apply(self.load(doc_type).await?))
    }

    /// Replace the collection with `incoming`, recording history.
    ///
    /// Documents missing from `incoming` are dropped from the collection.
    /// Nothing is written if any incoming document lacks a required field.
    pub async fn save(
        &self,
        doc_type: DocumentType,
        incoming: Vec<SavedDocument>,
        now: DateTime<Utc>,
    ) -> Result<Vec<(i64, SaveOutcome)>> {
        check_required(doc_type, &incoming)?;
        self.persist(doc_type, incoming, now).await
    }

    async fn persist(
        &self,
        doc_type: DocumentType,
        incoming: Vec<SavedDocument>,
        now: DateTime<Utc>,
    ) -> Result<Vec<(i64, SaveOutcome)>> {
        let existing = self.load(doc_type).await?;
        let mut saved = Vec::with_capacity(incoming.len());
        let mut outcomes = Vec::with_capacity(incoming.len());

        for (doc, outcome) in save_documents(&existing, incoming, now) {
            match &outcome {
                SaveOutcome::Created => {
                    tracing::info!(%doc_type, id = doc.id, name = %doc.name, "document created")
                }
                SaveOutcome::Updated { summary } => {
                    tracing::info!(%doc_type, id = doc.id, %summary, "new version recorded")
                }
                SaveOutcome::Unchanged => tracing::debug!(%doc_type, id = doc.id, "no changes"),
            }
            outcomes.push((doc.id, outcome));
            saved.push(doc);
        }

        store::save(self.store, doc_type.storage_key(), &saved).await?;
        Ok(outcomes)
    }

    /// Save one document, leaving the rest of the collection as it is.
    pub async fn upsert(
        &self,
        doc_type: DocumentType,
        document: SavedDocument,
        now: DateTime<Utc>,
    ) -> Result<SaveOutcome> {
        check_required(doc_type, std::slice::from_ref(&document))?;

        let mut docs = self.load(doc_type).await?;
        let id = document.id;
        match docs.iter_mut().find(|d| d.id == id) {
            Some(slot) => *slot = document,
            None => docs.push(document),
        }
        let outcomes = self.persist(doc_type, docs, now).await?;
        Ok(outcomes
            .into_iter()
            .find(|(doc_id, _)| *doc_id == id)
            .map(|(_, outcome)| outcome)
            .unwrap_or(SaveOutcome::Unchanged))
    }

    /// Create a document with a fresh id and its first history entry.
    pub async fn create(
        &self,
        doc_type: DocumentType,
        name: &str,
        sections: SectionMap,
        priority: Option<Priority>,
        now: DateTime<Utc>,
    ) -> Result<SavedDocument> {
        let mut docs = self.load(doc_type).await?;
        let mut ids = MonotonicIdAllocator::seeded(docs.iter().map(|d| d.id));
        let mut draft = SavedDocument::draft(ids.next_id(now), name, sections);
        draft.priority = priority;
        check_required(doc_type, std::slice::from_ref(&draft))?;
        let id = draft.id;

        docs.push(draft);
        self.persist(doc_type, docs, now).await?;
        self.find(doc_type, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("document {} missing after save", id))
    }

    /// Create a document pre-filled from a built-in template.
    ///
    /// `overrides` replace individual template sections. Priority defaults to
    /// medium.
    pub async fn create_from_template(
        &self,
        template: &Template,
        name: Option<&str>,
        overrides: SectionMap,
        priority: Option<Priority>,
        now: DateTime<Utc>,
    ) -> Result<SavedDocument> {
        let mut sections = template.sections();
        sections.extend(overrides);
        self.create(
            template.doc_type,
            name.unwrap_or(template.name),
            sections,
            Some(priority.unwrap_or(Priority::Medium)),
            now,
        )
        .await
    }

    pub async fn delete(&self, doc_type: DocumentType, id: i64) -> Result<SavedDocument> {
        let mut docs = self.load(doc_type).await?;
        let Some(pos) = docs.iter().position(|d| d.id == id) else {
            bail!("No {} with id {}", doc_type, id);
        };
        let removed = docs.remove(pos);
        store::save(self.store, doc_type.storage_key(), &docs).await?;
        tracing::info!(%doc_type, id, "document deleted");
        Ok(removed)
    }

    pub async fn find(&self, doc_type: DocumentType, id: i64) -> Result<Option<SavedDocument>> {
        Ok(self.load(doc_type).await?.into_iter().find(|d| d.id == id))
    }

    /// [`find`](Self::find), failing when the document does not exist.
    pub async fn get(&self, doc_type: DocumentType, id: i64) -> Result<SavedDocument> {
        match self.find(doc_type, id).await? {
            Some(doc) => Ok(doc),
            None => bail!("No {} with id {}", doc_type, id),
        }
    }
}

// ============ CLI commands ============

/// Options for `tdraft doc list`.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub priority: Option<Priority>,
    pub search: Option<String>,
    pub sort: SortOrder,
}

pub async fn run_doc_list(config: &Config, doc_type: DocumentType, opts: &ListOptions) -> Result<()> {
    let filter = DocumentFilter {
        priority: opts.priority,
        search: opts.search.clone(),
        sort: opts.sort,
    };
    let store = db::open_store(config).await?;
    let result = DocumentLibrary::new(&store).list(doc_type, &filter).await;
    store.close().await;
    let docs = result?;

    if docs.is_empty() {
        if filter == DocumentFilter::default() {
            println!("No saved {} documents.", doc_type);
        } else {
            println!("No {} documents match.", doc_type);
        }
        return Ok(());
    }
    for doc in &docs {
        let updated = doc
            .updated_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let priority = doc.priority.map(|p| p.to_string()).unwrap_or_default();
        println!(
            "{:>14}  {:<40}  {} version(s)  updated {}  {}",
            doc.id,
            doc.name,
            doc.history.len(),
            updated,
            priority
        );
    }
    Ok(())
}

/// Save a JSON file holding one document or a whole collection.
///
/// A single object updates that document only. An array replaces the
/// collection, so documents it omits are removed.
pub async fn run_doc_save(config: &Config, doc_type: DocumentType, path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    let store = db::open_store(config).await?;
    let lib = DocumentLibrary::new(&store);
    let now = Utc::now();
    let outcomes = if value.is_array() {
        let docs: Vec<SavedDocument> =
            serde_json::from_value(value).context("Invalid document list")?;
        lib.save(doc_type, docs, now).await
    } else {
        let doc: SavedDocument = serde_json::from_value(value).context("Invalid document")?;
        let id = doc.id;
        lib.upsert(doc_type, doc, now).await.map(|o| vec![(id, o)])
    };
    store.close().await;

    for (id, outcome) in outcomes? {
        match outcome {
            SaveOutcome::Created => println!("{}: created", id),
            SaveOutcome::Updated { summary } => println!("{}: {}", id, summary),
            SaveOutcome::Unchanged => println!("{}: no changes", id),
        }
    }
    Ok(())
}

fn read_sections(path: Option<&Path>) -> Result<SectionMap> {
    let Some(path) = path else {
        return Ok(SectionMap::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Sections must be a JSON object of strings: {}", path.display()))
}

/// Options for `tdraft doc create`.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Required unless a template supplies the name.
    pub name: Option<String>,
    pub template: Option<String>,
    pub sections: Option<std::path::PathBuf>,
    pub priority: Option<Priority>,
}

pub async fn run_doc_create(config: &Config, doc_type: DocumentType, opts: &CreateOptions) -> Result<()> {
    let sections = read_sections(opts.sections.as_deref())?;
    let template = match opts.template.as_deref() {
        Some(id) => {
            let Some(template) = templates::find(id) else {
                bail!("Unknown template '{}'. Run `tdraft doc templates` to list them.", id);
            };
            if template.doc_type != doc_type {
                bail!("Template '{}' is for {} documents, not {}", id, template.doc_type, doc_type);
            }
            Some(template)
        }
        None => None,
    };

    let store = db::open_store(config).await?;
    let lib = DocumentLibrary::new(&store);
    let now = Utc::now();
    let result = match (template, opts.name.as_deref()) {
        (Some(template), name) => {
            lib.create_from_template(template, name, sections, opts.priority, now)
                .await
        }
        (None, Some(name)) => lib.create(doc_type, name, sections, opts.priority, now).await,
        (None, None) => Err(anyhow::anyhow!("--name is required unless --template is given")),
    };
    store.close().await;

    let doc = result?;
    println!("Created {} {} \"{}\"", doc_type, doc.id, doc.name);
    Ok(())
}

/// Print the built-in templates, optionally for one document type.
pub fn run_doc_templates(doc_type: Option<DocumentType>) -> Result<()> {
    for template in templates::all()
        .iter()
        .filter(|t| doc_type.map_or(true, |d| t.doc_type == d))
    {
        println!("{:<4} {:<20} {}", template.doc_type.to_string(), template.id, template.name);
        println!("     {}", template.description);
    }
    Ok(())
}

pub async fn run_doc_delete(config: &Config, doc_type: DocumentType, id: i64) -> Result<()> {
    let store = db::open_store(config).await?;
    let result = DocumentLibrary::new(&store).delete(doc_type, id).await;
    store.close().await;

    let doc = result?;
    println!("Deleted {} {} \"{}\"", doc_type, doc.id, doc.name);
    Ok(())
}
