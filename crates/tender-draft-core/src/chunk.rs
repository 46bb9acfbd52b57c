//! Legal-article / paragraph text chunker.
//!
//! Splits text extracted from an uploaded reference document into chunks
//! used as retrieval context. Statutes and regulations are split on their
//! article markers (`Art. 5º`, `Art. 12.`) so that each chunk holds one
//! article; everything else is split on blank lines.
//!
//! # Algorithm
//!
//! 1. Collapse whitespace runs to a single space and trim.
//! 2. Find article markers (`Art\.\s\d+º?\.?`) in the normalized text.
//!    Text before the first marker is discarded.
//! 3. With two or more markers, each marker is joined with the text that
//!    follows it up to the next marker, trimmed, and kept if longer than
//!    [`MIN_CHUNK_CHARS`] characters.
//! 4. Otherwise the **original** text is split on blank lines
//!    (`\n\s*\n`) and paragraphs whose trimmed length exceeds
//!    [`MIN_CHUNK_CHARS`] are kept as-is.
//!
//! # Example
//!
//! ```rust
//! use tender_draft_core::chunk::chunk_text;
//!
//! let text = "Art. 1º Esta lei estabelece normas gerais. Art. 2º Aplica-se a todos os órgãos.";
//! let chunks = chunk_text(text);
//! assert_eq!(chunks.len(), 2);
//! assert!(chunks[0].starts_with("Art. 1º"));
//! ```

use std::sync::OnceLock;

use regex::Regex;

/// Chunks whose trimmed length (in characters) is at most this are dropped.
pub const MIN_CHUNK_CHARS: usize = 10;

fn article_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Art\.\s\d+º?\.?").expect("article marker pattern is valid"))
}

fn blank_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("blank line pattern is valid"))
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Split `text` into retrieval chunks.
///
/// # Guarantees
///
/// - Deterministic: the same input always yields the same output.
/// - No returned chunk has a trimmed length of [`MIN_CHUNK_CHARS`] or less.
/// - Empty input yields an empty vector.
pub fn chunk_text(text: &str) -> Vec<String> {
    let normalized = whitespace_run().replace_all(text, " ");
    let normalized = normalized.trim();

    if let Some(articles) = split_articles(normalized) {
        return articles;
    }

    blank_line()
        .split(text)
        .filter(|p| is_long_enough(p))
        .map(str::to_string)
        .collect()
}

/// Article segmentation. Returns `None` when fewer than two markers exist.
fn split_articles(normalized: &str) -> Option<Vec<String>> {
    let starts: Vec<usize> = article_marker()
        .find_iter(normalized)
        .map(|m| m.start())
        .collect();
    if starts.len() < 2 {
        return None;
    }

    let chunks = starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(normalized.len());
            normalized[start..end].trim()
        })
        .filter(|c| is_long_enough(c))
        .map(str::to_string)
        .collect();
    Some(chunks)
}

fn is_long_enough(s: &str) -> bool {
    s.trim().chars().count() > MIN_CHUNK_CHARS
}
