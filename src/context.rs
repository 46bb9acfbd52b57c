//! Retrieval context for drafting prompts.
//!
//! Collects the chunks of every selected uploaded file, narrows them down
//! with [`select_context`], and wraps the result in the block that is
//! appended to a generation prompt.

use anyhow::Result;

use tender_draft_core::context::{
    select_context, FallbackReason, RelevanceOracle, SelectionStrategy,
};
use tender_draft_core::store::KeyValueStore;

use crate::config::Config;
use crate::db;
use crate::files::FileLibrary;
use crate::oracle::{create_oracle, DisabledOracle};

/// Wrap selected context for inclusion in a prompt. Blank text yields an
/// empty string.
pub fn wrap_supporting_documents(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    format!(
        "\n\nAdditionally, use the content of the following supporting documents as a knowledge base:\n\n\
         --- BEGIN SUPPORTING DOCUMENTS ---\n{}\n--- END SUPPORTING DOCUMENTS ---",
        text
    )
}

/// Build the supporting-documents block for `query`.
///
/// Returns an empty string when no selected file has chunks. Oracle
/// failures are logged and never returned.
pub async fn build_rag_context(
    store: &dyn KeyValueStore,
    config: &Config,
    oracle: &dyn RelevanceOracle,
    query: &str,
) -> Result<String> {
    let files = FileLibrary::new(store, &config.upload);
    let chunks = files.context_chunks().await?;
    if chunks.is_empty() {
        tracing::debug!("no selected reference files");
        return Ok(String::new());
    }

    let params = config.retrieval.selection_params();
    let selection = select_context(query, &chunks, oracle, &params).await;

    match &selection.strategy {
        SelectionStrategy::Empty => {}
        SelectionStrategy::Direct { count } => {
            tracing::info!(count, "using all chunks without ranking")
        }
        SelectionStrategy::Ranked { indices } => {
            tracing::info!(total = chunks.len(), selected = indices.len(), "oracle ranked chunks")
        }
        SelectionStrategy::Fallback { reason } => match reason {
            FallbackReason::OracleFailed(error) => tracing::warn!(
                %error,
                fallback = params.fallback_count,
                "relevance oracle failed, using first chunks"
            ),
            FallbackReason::NoValidIndices => tracing::warn!(
                fallback = params.fallback_count,
                "oracle reply held no valid chunk number, using first chunks"
            ),
        },
    }

    Ok(wrap_supporting_documents(&selection.text))
}

/// Print the supporting-documents block `query` would receive.
pub async fn run_context(config: &Config, query: &str) -> Result<()> {
    let oracle = create_oracle(&config.oracle).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "relevance oracle unavailable, ranking disabled");
        Box::new(DisabledOracle) as Box<dyn RelevanceOracle>
    });

    let store = db::open_store(config).await?;
    let result = build_rag_context(&store, config, oracle.as_ref(), query).await;
    store.close().await;

    let context = result?;
    if context.is_empty() {
        println!("No supporting context: no selected reference file has text.");
    } else {
        println!("{}", context.trim_start());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tender_draft_core::models::UploadedFile;
    use tender_draft_core::store;
    use tender_draft_core::store::memory::InMemoryKvStore;

    use crate::files::FILES_KEY;

    struct FixedOracle(&'static str);

    #[async_trait]
    impl RelevanceOracle for FixedOracle {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn file(name: &str, chunks: &[&str], selected: bool) -> UploadedFile {
        UploadedFile {
            name: name.to_string(),
            mime_type: "text/plain".to_string(),
            content: String::new(),
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            selected,
            locked: false,
        }
    }

    async fn store_with(files: Vec<UploadedFile>) -> InMemoryKvStore {
        let store = InMemoryKvStore::new();
        store::save(&store, FILES_KEY, &files).await.unwrap();
        store
    }

    #[test]
    fn test_blank_text_not_wrapped() {
        assert_eq!(wrap_supporting_documents("  \n"), "");
    }

    #[tokio::test]
    async fn test_no_files_is_empty() {
        let store = InMemoryKvStore::new();
        let out = build_rag_context(&store, &Config::minimal(), &DisabledOracle, "q")
            .await
            .unwrap();
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn test_unselected_files_ignored() {
        let store = store_with(vec![file("a.txt", &["chunk one"], false)]).await;
        let out = build_rag_context(&store, &Config::minimal(), &DisabledOracle, "q")
            .await
            .unwrap();
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn test_small_set_wrapped_verbatim() {
        let store = store_with(vec![file("lei.txt", &["chunk one", "chunk two"], true)]).await;
        let out = build_rag_context(&store, &Config::minimal(), &DisabledOracle, "q")
            .await
            .unwrap();
        assert!(out.starts_with("\n\nAdditionally, use the content"));
        assert!(out.contains(
            "--- BEGIN SUPPORTING DOCUMENTS ---\n\
             Context from file \"lei.txt\":\nchunk one\n\n---\n\n\
             Context from file \"lei.txt\":\nchunk two\n\
             --- END SUPPORTING DOCUMENTS ---"
        ));
    }

    #[tokio::test]
    async fn test_disabled_oracle_falls_back_to_first_three() {
        let chunks = ["c1", "c2", "c3", "c4", "c5", "c6", "c7"];
        let store = store_with(vec![file("lei.txt", &chunks, true)]).await;
        let out = build_rag_context(&store, &Config::minimal(), &DisabledOracle, "q")
            .await
            .unwrap();
        assert!(out.contains(":\nc3\n"));
        assert!(!out.contains(":\nc4\n"));
    }

    #[tokio::test]
    async fn test_ranked_chunks_in_reply_order() {
        let chunks = ["c1", "c2", "c3", "c4", "c5", "c6", "c7"];
        let store = store_with(vec![file("lei.txt", &chunks, true)]).await;
        let out = build_rag_context(&store, &Config::minimal(), &FixedOracle("7, 2"), "q")
            .await
            .unwrap();
        let c7 = out.find(":\nc7\n").unwrap();
        let c2 = out.find(":\nc2\n").unwrap();
        assert!(c7 < c2);
        assert!(!out.contains(":\nc1\n"));
    }
}
