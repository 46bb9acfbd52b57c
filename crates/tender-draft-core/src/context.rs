//! Retrieval-context selection for AI prompts.
//!
//! Given a query and the chunks of every selected reference file,
//! [`select_context`] produces one text block to inject into a prompt:
//!
//! | Chunks | Behaviour |
//! |--------|-----------|
//! | none | empty string, oracle not called |
//! | `≤ direct_limit` | every chunk, oracle not called |
//! | more | the oracle picks chunk numbers; those chunks in the given order |
//! | oracle failed / no valid number | the first `fallback_count` chunks |
//!
//! The oracle is any text-completion service behind [`RelevanceOracle`].
//! Its failures are never returned to the caller. The chosen path is
//! reported in [`ContextSelection::strategy`] so the caller can decide
//! whether to tell the user.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::ContextChunk;

/// A reply starting with this marker is a failure, even when returned as `Ok`.
pub const ORACLE_ERROR_PREFIX: &str = "Error:";

/// Placed between attributed chunks in the assembled context.
pub const CHUNK_SEPARATOR: &str = "\n\n---\n\n";

/// A text-completion service used to rank chunks by relevance.
#[async_trait]
pub trait RelevanceOracle: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Selection tuning, decoupled from application config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionParams {
    /// Up to this many chunks are used directly, without the oracle.
    pub direct_limit: usize,
    /// Chunks used when the oracle fails.
    pub fallback_count: usize,
    /// Characters of each chunk shown to the oracle.
    pub excerpt_chars: usize,
    /// Upper bound requested from the oracle (not enforced on the reply).
    pub max_selected: usize,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            direct_limit: 5,
            fallback_count: 3,
            excerpt_chars: 1500,
            max_selected: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The oracle returned an error or an error-marked reply.
    OracleFailed(String),
    /// The reply held no usable chunk number.
    NoValidIndices,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionStrategy {
    Empty,
    Direct { count: usize },
    /// 0-based chunk indices chosen by the oracle, in reply order.
    Ranked { indices: Vec<usize> },
    Fallback { reason: FallbackReason },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSelection {
    pub text: String,
    pub strategy: SelectionStrategy,
}

/// Build the context block for `query` from `chunks`.
pub async fn select_context(
    query: &str,
    chunks: &[ContextChunk],
    oracle: &dyn RelevanceOracle,
    params: &SelectionParams,
) -> ContextSelection {
    if chunks.is_empty() {
        return ContextSelection {
            text: String::new(),
            strategy: SelectionStrategy::Empty,
        };
    }

    if chunks.len() <= params.direct_limit {
        return ContextSelection {
            text: format_chunks(chunks.iter()),
            strategy: SelectionStrategy::Direct {
                count: chunks.len(),
            },
        };
    }

    let prompt = build_selection_prompt(query, chunks, params);
    let reply = match oracle.complete(&prompt).await {
        Ok(reply) if reply.starts_with(ORACLE_ERROR_PREFIX) => Err(reply),
        Ok(reply) => Ok(reply),
        Err(e) => Err(e.to_string()),
    };

    let reason = match reply {
        Ok(reply) => {
            let indices = parse_indices(&reply, chunks.len());
            if !indices.is_empty() {
                return ContextSelection {
                    text: format_chunks(indices.iter().map(|&i| &chunks[i])),
                    strategy: SelectionStrategy::Ranked { indices },
                };
            }
            FallbackReason::NoValidIndices
        }
        Err(message) => FallbackReason::OracleFailed(message),
    };

    ContextSelection {
        text: format_chunks(chunks.iter().take(params.fallback_count)),
        strategy: SelectionStrategy::Fallback { reason },
    }
}

/// [`select_context`] returning only the text.
pub async fn select_context_text(
    query: &str,
    chunks: &[ContextChunk],
    oracle: &dyn RelevanceOracle,
    params: &SelectionParams,
) -> String {
    select_context(query, chunks, oracle, params).await.text
}

/// Attribute each chunk to its source file and join them.
pub fn format_chunks<'a>(chunks: impl Iterator<Item = &'a ContextChunk>) -> String {
    chunks
        .map(|c| format!("Context from file \"{}\":\n{}", c.source, c.content))
        .collect::<Vec<_>>()
        .join(CHUNK_SEPARATOR)
}

/// The prompt asking the oracle which chunks matter for `query`.
///
/// Chunks are numbered from 1 and truncated to `params.excerpt_chars`
/// characters.
pub fn build_selection_prompt(
    query: &str,
    chunks: &[ContextChunk],
    params: &SelectionParams,
) -> String {
    let excerpts = chunks
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let excerpt: String = c.content.chars().take(params.excerpt_chars).collect();
            format!("[EXCERPT {} - File: {}]:\n{}...", i + 1, c.source, excerpt)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Analyse the user's QUESTION and the list of document EXCERPTS below.\n\
         Return ONLY the numbers of the excerpts (e.g. \"1, 5, 8\") that are most \
         crucial and directly relevant to answering the question. Select at most \
         the {max} most important excerpts.\n\n\
         QUESTION: \"{query}\"\n\n\
         --- BEGIN EXCERPTS ---\n\
         {excerpts}\n\
         --- END EXCERPTS ---\n\n\
         Numbers of the most relevant excerpts (comma-separated):",
        max = params.max_selected,
        query = query,
        excerpts = excerpts,
    )
}

/// Parse a comma-separated list of 1-based chunk numbers into 0-based
/// indices below `len`, keeping reply order.
///
/// Each token is trimmed and its leading integer read (`"3."` → 3,
/// `"7 (prazo)"` → 7); tokens without one, and numbers out of range, are
/// skipped.
pub fn parse_indices(reply: &str, len: usize) -> Vec<usize> {
    reply
        .split(',')
        .filter_map(|tok| leading_int(tok.trim()))
        .filter_map(|n| {
            let idx = n.checked_sub(1)?;
            usize::try_from(idx).ok().filter(|&i| i < len)
        })
        .collect()
}

fn leading_int(s: &str) -> Option<i64> {
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    rest[..end].parse::<i64>().ok().map(|n| sign * n)
}
