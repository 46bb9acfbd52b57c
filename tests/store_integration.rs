//! Library-level tests against a temporary SQLite database.
//!
//! These exercise the `KeyValueStore` and `RelevanceOracle` seams end to
//! end: documents and uploaded files written through the SQLite store
//! survive a reconnect, and a custom oracle drives context selection.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

use tender_draft::config::Config;
use tender_draft::context::build_rag_context;
use tender_draft::db;
use tender_draft::documents::DocumentLibrary;
use tender_draft::files::FileLibrary;
use tender_draft_core::context::RelevanceOracle;
use tender_draft_core::models::{DocumentType, SectionMap};
use tender_draft_core::store::KeyValueStore;
use tender_draft_core::versions::SaveOutcome;

// ─── Test Oracle ────────────────────────────────────────────────────

/// Replies with a fixed chunk list and counts how often it was asked.
struct CountingOracle {
    reply: &'static str,
    calls: AtomicUsize,
}

impl CountingOracle {
    fn new(reply: &'static str) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RelevanceOracle for CountingOracle {
    async fn complete(&self, prompt: &str) -> Result<String> {
        assert!(prompt.contains("[EXCERPT 1 - File: lei.txt]"));
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.to_string())
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn test_config(tmp: &TempDir) -> Config {
    let config_content = format!(
        r#"
[db]
path = "{}"
"#,
        tmp.path().join("tdraft.sqlite").display()
    );
    toml::from_str(&config_content).unwrap()
}

fn write_law(tmp: &TempDir, articles: usize) -> std::path::PathBuf {
    let text: String = (1..=articles)
        .map(|n| format!("Art. {}º Disposição número {} da lei de teste.\n", n, n))
        .collect();
    let path = tmp.path().join("lei.txt");
    std::fs::write(&path, text).unwrap();
    path
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sqlite_store_roundtrip_and_overwrite() {
    let tmp = TempDir::new().unwrap();
    let store = db::open_store(&test_config(&tmp)).await.unwrap();

    assert_eq!(store.get("missing").await.unwrap(), None);

    store.set("k", json!({"a": 1})).await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), Some(json!({"a": 1})));

    store.set("k", json!([1, 2, 3])).await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), Some(json!([1, 2, 3])));
    store.close().await;
}

#[tokio::test]
async fn test_documents_survive_reconnect() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let t1 = Utc.timestamp_opt(1_700_000_600, 0).unwrap();

    let store = db::open_store(&config).await.unwrap();
    let mut sections = SectionMap::new();
    sections.insert("etp-2-necessidade".to_string(), "20 notebooks".to_string());
    let doc = DocumentLibrary::new(&store)
        .create(DocumentType::Etp, "ETP notebooks", sections, None, t0)
        .await
        .unwrap();
    store.close().await;

    let store = db::open_store(&config).await.unwrap();
    let lib = DocumentLibrary::new(&store);
    let mut edited = lib.get(DocumentType::Etp, doc.id).await.unwrap();
    edited.name = "ETP notebooks 2025".to_string();
    let outcome = lib.upsert(DocumentType::Etp, edited, t1).await.unwrap();
    assert_eq!(
        outcome,
        SaveOutcome::Updated {
            summary: "Changed: name changed.".to_string()
        }
    );

    let stored = lib.get(DocumentType::Etp, doc.id).await.unwrap();
    assert_eq!(stored.history.len(), 2);
    assert_eq!(stored.created_at, Some(t0));
    assert_eq!(stored.updated_at, Some(t1));
    assert!(lib.load(DocumentType::Tr).await.unwrap().is_empty());
    store.close().await;
}

#[tokio::test]
async fn test_small_file_set_skips_oracle() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let law = write_law(&tmp, 3);

    let store = db::open_store(&config).await.unwrap();
    FileLibrary::new(&store, &config.upload)
        .add_files(&[law])
        .await
        .unwrap();

    let oracle = CountingOracle::new("1");
    let context = build_rag_context(&store, &config, &oracle, "q").await.unwrap();
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    assert!(context.contains("Art. 3º"));
    store.close().await;
}

#[tokio::test]
async fn test_oracle_ranks_large_file_set() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let law = write_law(&tmp, 8);

    let store = db::open_store(&config).await.unwrap();
    FileLibrary::new(&store, &config.upload)
        .add_files(&[law])
        .await
        .unwrap();

    let oracle = CountingOracle::new("8, 99, 4");
    let context = build_rag_context(&store, &config, &oracle, "q").await.unwrap();
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);

    let art8 = context.find("Art. 8º").unwrap();
    let art4 = context.find("Art. 4º").unwrap();
    assert!(art8 < art4);
    assert!(!context.contains("Art. 1º"));
    store.close().await;
}
