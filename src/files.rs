//! Uploaded reference files.
//!
//! Files are read, their text extracted and chunked, and the result stored
//! as one JSON list under [`FILES_KEY`]. Selected files feed the retrieval
//! context; locked files keep their selection state.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine;
use thiserror::Error;

use tender_draft_core::chunk::chunk_text;
use tender_draft_core::models::{ContextChunk, UploadedFile};
use tender_draft_core::store::{self, KeyValueStore};

use crate::config::{Config, UploadConfig};
use crate::db;
use crate::extract::{extract_text, ExtractError};

/// Storage key for the uploaded-file list.
pub const FILES_KEY: &str = "trGeniusFiles";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("a file named '{0}' already exists")]
    Duplicate(String),
    #[error("file '{name}' is too large ({size} bytes, limit {limit})")]
    TooLarge { name: String, size: u64, limit: u64 },
    #[error("failed to read '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not extract text from '{name}': {source}")]
    Extract {
        name: String,
        #[source]
        source: ExtractError,
    },
    #[error("file '{0}' is locked")]
    Locked(String),
    #[error("no file named '{0}'")]
    NotFound(String),
}

/// Turn raw bytes into a stored file record.
///
/// New files start selected and unlocked.
pub fn process_upload(
    name: &str,
    mime_type: &str,
    bytes: &[u8],
    existing_names: &[&str],
) -> Result<UploadedFile, UploadError> {
    if existing_names.contains(&name) {
        return Err(UploadError::Duplicate(name.to_string()));
    }

    let text = extract_text(bytes, mime_type, name).map_err(|source| UploadError::Extract {
        name: name.to_string(),
        source,
    })?;

    Ok(UploadedFile {
        name: name.to_string(),
        mime_type: mime_type.to_string(),
        content: base64::engine::general_purpose::STANDARD.encode(bytes),
        chunks: chunk_text(&text),
        selected: true,
        locked: false,
    })
}

/// Result of adding one file in a batch.
#[derive(Debug)]
pub struct AddOutcome {
    pub path: PathBuf,
    pub result: Result<UploadedFile, UploadError>,
}

/// The uploaded-file list backed by a [`KeyValueStore`].
pub struct FileLibrary<'a> {
    store: &'a dyn KeyValueStore,
    max_file_bytes: u64,
}

impl<'a> FileLibrary<'a> {
    pub fn new(store: &'a dyn KeyValueStore, config: &UploadConfig) -> Self {
        Self {
            store,
            max_file_bytes: config.max_file_bytes,
        }
    }

    pub async fn list(&self) -> Result<Vec<UploadedFile>> {
        store::load_or_default(self.store, FILES_KEY).await
    }

    async fn persist(&self, files: &[UploadedFile]) -> Result<()> {
        store::save(self.store, FILES_KEY, &files).await
    }

    /// Add files from disk. A failing file is reported in its outcome and
    /// does not stop the rest of the batch.
    pub async fn add_files(&self, paths: &[PathBuf]) -> Result<Vec<AddOutcome>> {
        let mut files = self.list().await?;
        let mut outcomes = Vec::with_capacity(paths.len());
        let mut added = 0usize;

        for path in paths {
            let existing: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
            let result = self.load_path(path, &existing);
            match &result {
                Ok(file) => {
                    tracing::info!(file = %file.name, chunks = file.chunks.len(), "file added");
                    files.push(file.clone());
                    added += 1;
                }
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "file rejected"),
            }
            outcomes.push(AddOutcome {
                path: path.clone(),
                result,
            });
        }

        if added > 0 {
            self.persist(&files).await?;
        }
        Ok(outcomes)
    }

    fn load_path(&self, path: &Path, existing: &[&str]) -> Result<UploadedFile, UploadError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let io_err = |source| UploadError::Io {
            name: name.clone(),
            source,
        };
        let size = std::fs::metadata(path).map_err(io_err)?.len();
        if size > self.max_file_bytes {
            return Err(UploadError::TooLarge {
                name: name.clone(),
                size,
                limit: self.max_file_bytes,
            });
        }
        let bytes = std::fs::read(path).map_err(io_err)?;
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        process_upload(&name, mime.essence_str(), &bytes, existing)
    }

    /// Select or deselect a file. Locked files are left unchanged.
    pub async fn set_selected(&self, name: &str, selected: bool) -> Result<()> {
        let mut files = self.list().await?;
        let file = find_mut(&mut files, name)?;
        if file.locked {
            return Err(UploadError::Locked(name.to_string()).into());
        }
        file.selected = selected;
        self.persist(&files).await
    }

    pub async fn set_locked(&self, name: &str, locked: bool) -> Result<()> {
        let mut files = self.list().await?;
        find_mut(&mut files, name)?.locked = locked;
        self.persist(&files).await
    }

    pub async fn remove(&self, name: &str) -> Result<UploadedFile> {
        let mut files = self.list().await?;
        let pos = files
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| UploadError::NotFound(name.to_string()))?;
        let removed = files.remove(pos);
        self.persist(&files).await?;
        Ok(removed)
    }

    /// Chunks of every selected file, attributed to the file name.
    pub async fn context_chunks(&self) -> Result<Vec<ContextChunk>> {
        let files = self.list().await?;
        Ok(files
            .iter()
            .filter(|f| f.selected)
            .flat_map(UploadedFile::context_chunks)
            .collect())
    }
}

fn find_mut<'f>(files: &'f mut [UploadedFile], name: &str) -> Result<&'f mut UploadedFile> {
    files
        .iter_mut()
        .find(|f| f.name == name)
        .ok_or_else(|| UploadError::NotFound(name.to_string()).into())
}

// ============ CLI commands ============

/// State changes applied by `tdraft files <action> <NAME>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Select,
    Deselect,
    Lock,
    Unlock,
    Remove,
}

pub async fn run_files_add(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let store = db::open_store(config).await?;
    let outcomes = FileLibrary::new(&store, &config.upload)
        .add_files(paths)
        .await?;
    store.close().await;

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(file) => println!("added   {} ({} chunks)", file.name, file.chunks.len()),
            Err(e) => {
                failed += 1;
                println!("failed  {}: {}", outcome.path.display(), e);
            }
        }
    }
    println!("{} added, {} failed", outcomes.len() - failed, failed);
    Ok(())
}

pub async fn run_files_list(config: &Config) -> Result<()> {
    let store = db::open_store(config).await?;
    let files = FileLibrary::new(&store, &config.upload).list().await?;
    store.close().await;

    if files.is_empty() {
        println!("No uploaded files.");
        return Ok(());
    }
    for f in &files {
        println!(
            "[{}]{} {}  ({}, {} chunks)",
            if f.selected { "x" } else { " " },
            if f.locked { " locked" } else { "" },
            f.name,
            f.mime_type,
            f.chunks.len()
        );
    }
    Ok(())
}

pub async fn run_files_update(config: &Config, name: &str, action: FileAction) -> Result<()> {
    let store = db::open_store(config).await?;
    let lib = FileLibrary::new(&store, &config.upload);
    let result = match action {
        FileAction::Select => lib.set_selected(name, true).await,
        FileAction::Deselect => lib.set_selected(name, false).await,
        FileAction::Lock => lib.set_locked(name, true).await,
        FileAction::Unlock => lib.set_locked(name, false).await,
        FileAction::Remove => lib.remove(name).await.map(|_| ()),
    };
    store.close().await;
    result?;

    let verb = match action {
        FileAction::Select => "selected",
        FileAction::Deselect => "deselected",
        FileAction::Lock => "locked",
        FileAction::Unlock => "unlocked",
        FileAction::Remove => "removed",
    };
    println!("{} {}", verb, name);
    Ok(())
}

/// Print the chunks a file would be split into, without storing it.
pub fn run_chunk(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let text = extract_text(&bytes, mime.essence_str(), &name)?;

    let chunks = chunk_text(&text);
    for (i, chunk) in chunks.iter().enumerate() {
        println!("--- chunk {} ({} chars) ---", i + 1, chunk.chars().count());
        println!("{}", chunk);
    }
    println!("{} chunks", chunks.len());
    Ok(())
}
