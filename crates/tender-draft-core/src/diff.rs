//! Word-level diff based on the longest common subsequence.
//!
//! Both texts are tokenized into alternating word and whitespace tokens,
//! so concatenating the tokens reproduces the input exactly. The LCS table
//! aligns the two token sequences; backtracking from the bottom-right
//! corner classifies every token as shared, inserted (new side only), or
//! deleted (old side only).
//!
//! # Tie-break
//!
//! When skipping a new-side token and skipping an old-side token lead to
//! equally long subsequences, the new-side token is treated as an
//! insertion. Rendered diffs that have been stored or compared rely on
//! this choice; changing it changes which side carries the markers.
//!
//! # Example
//!
//! ```rust
//! use tender_draft_core::diff::diff_words;
//!
//! let d = diff_words("the cat sat", "the dog sat");
//! assert_eq!(d.old, "the <del>cat</del> sat");
//! assert_eq!(d.new, "the <ins>dog</ins> sat");
//! ```
//!
//! Complexity is `O(n·m)` in time and memory for `n` and `m` tokens,
//! which is fine for form sections of a few thousand words.

use serde::Serialize;

/// One token of a rendered side, tagged with how it aligns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Equal(&'a str),
    Inserted(&'a str),
    Deleted(&'a str),
}

impl<'a> Segment<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            Segment::Equal(t) | Segment::Inserted(t) | Segment::Deleted(t) => t,
        }
    }
}

/// Marker syntax used when rendering a [`WordDiff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffStyle {
    /// `<ins>…</ins>` / `<del>…</del>`, for rich-text views.
    #[default]
    Html,
    /// `{+…+}` / `[-…-]`, for terminals.
    Plain,
}

impl DiffStyle {
    fn wrap(&self, segment: &Segment<'_>, out: &mut String) {
        let (open, close) = match (self, segment) {
            (_, Segment::Equal(_)) => ("", ""),
            (DiffStyle::Html, Segment::Inserted(_)) => ("<ins>", "</ins>"),
            (DiffStyle::Html, Segment::Deleted(_)) => ("<del>", "</del>"),
            (DiffStyle::Plain, Segment::Inserted(_)) => ("{+", "+}"),
            (DiffStyle::Plain, Segment::Deleted(_)) => ("[-", "-]"),
        };
        out.push_str(open);
        out.push_str(segment.text());
        out.push_str(close);
    }
}

/// Aligned token sequences for the old (left) and new (right) sides.
///
/// The old side holds only `Equal` and `Deleted` segments; the new side
/// only `Equal` and `Inserted` ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordDiff<'a> {
    pub old: Vec<Segment<'a>>,
    pub new: Vec<Segment<'a>>,
}

impl WordDiff<'_> {
    pub fn has_changes(&self) -> bool {
        self.old
            .iter()
            .chain(self.new.iter())
            .any(|s| !matches!(s, Segment::Equal(_)))
    }

    pub fn render(&self, style: DiffStyle) -> RenderedDiff {
        RenderedDiff {
            old: render_side(&self.old, style),
            new: render_side(&self.new, style),
        }
    }
}

/// Both sides of a diff rendered with markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedDiff {
    pub old: String,
    pub new: String,
}

fn render_side(segments: &[Segment<'_>], style: DiffStyle) -> String {
    let mut out = String::new();
    for s in segments {
        style.wrap(s, &mut out);
    }
    out
}

/// Split on whitespace runs, keeping the runs as their own tokens.
///
/// Never produces empty tokens; `tokenize(s).concat() == s`.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut prev_ws: Option<bool> = None;

    for (i, ch) in text.char_indices() {
        let ws = ch.is_whitespace();
        if prev_ws.is_some_and(|p| p != ws) {
            tokens.push(&text[start..i]);
            start = i;
        }
        prev_ws = Some(ws);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

/// Align `old` and `new` word by word.
pub fn diff_segments<'a>(old: &'a str, new: &'a str) -> WordDiff<'a> {
    let a = tokenize(old);
    let b = tokenize(new);
    let (n, m) = (a.len(), b.len());

    // dp[i * width + j] = LCS length of a[..i] and b[..j]
    let width = m + 1;
    let mut dp = vec![0usize; (n + 1) * width];
    for i in 1..=n {
        for j in 1..=m {
            dp[i * width + j] = if a[i - 1] == b[j - 1] {
                dp[(i - 1) * width + (j - 1)] + 1
            } else {
                dp[(i - 1) * width + j].max(dp[i * width + (j - 1)])
            };
        }
    }

    let mut old_side = Vec::with_capacity(n);
    let mut new_side = Vec::with_capacity(m);
    let (mut i, mut j) = (n, m);

    while i > 0 || j > 0 {
        if i > 0 && j > 0 && a[i - 1] == b[j - 1] {
            old_side.push(Segment::Equal(a[i - 1]));
            new_side.push(Segment::Equal(b[j - 1]));
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || dp[i * width + (j - 1)] >= dp[(i - 1) * width + j]) {
            new_side.push(Segment::Inserted(b[j - 1]));
            j -= 1;
        } else {
            old_side.push(Segment::Deleted(a[i - 1]));
            i -= 1;
        }
    }

    old_side.reverse();
    new_side.reverse();
    WordDiff {
        old: old_side,
        new: new_side,
    }
}

/// Diff two texts and render both sides with HTML `<ins>`/`<del>` markers.
pub fn diff_words(old: &str, new: &str) -> RenderedDiff {
    diff_segments(old, new).render(DiffStyle::Html)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unmarked(segments: &[Segment<'_>]) -> String {
        segments.iter().map(|s| s.text()).collect()
    }

    #[test]
    fn test_tokenize_keeps_whitespace() {
        assert_eq!(tokenize("the  cat\nsat"), vec!["the", "  ", "cat", "\n", "sat"]);
        assert_eq!(tokenize(" lead"), vec![" ", "lead"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_identical_texts_unmarked() {
        let d = diff_words("the cat sat", "the cat sat");
        assert_eq!(d.old, "the cat sat");
        assert_eq!(d.new, "the cat sat");
        assert!(!diff_segments("the cat sat", "the cat sat").has_changes());
    }

    #[test]
    fn test_word_replaced() {
        let d = diff_words("the cat sat", "the dog sat");
        assert_eq!(d.old, "the <del>cat</del> sat");
        assert_eq!(d.new, "the <ins>dog</ins> sat");
    }

    #[test]
    fn test_ties_prefer_insertion() {
        // Both "a" and "b" are LCS candidates; ties consume the new side
        // first, so the shared token is the old side's trailing "b".
        let d = diff_words("a b", "b a");
        assert_eq!(d.old, "<del>a</del><del> </del>b");
        assert_eq!(d.new, "b<ins> </ins><ins>a</ins>");
    }

    #[test]
    fn test_single_token_swap() {
        let d = diff_words("a", "b");
        assert_eq!(d.old, "<del>a</del>");
        assert_eq!(d.new, "<ins>b</ins>");
    }

    #[test]
    fn test_empty_sides() {
        let d = diff_words("", "new text");
        assert_eq!(d.old, "");
        assert_eq!(d.new, "<ins>new</ins><ins> </ins><ins>text</ins>");

        let d = diff_words("old", "");
        assert_eq!(d.old, "<del>old</del>");
        assert_eq!(d.new, "");
    }

    #[test]
    fn test_stripping_markers_restores_inputs() {
        let old = "Os equipamentos devem possuir  16GB de memória.\nGarantia de 3 anos.";
        let new = "Os notebooks devem possuir 32GB de memória.\nGarantia on-site de 3 anos.";
        let d = diff_segments(old, new);
        assert_eq!(unmarked(&d.old), old);
        assert_eq!(unmarked(&d.new), new);
        assert!(d.old.iter().all(|s| !matches!(s, Segment::Inserted(_))));
        assert!(d.new.iter().all(|s| !matches!(s, Segment::Deleted(_))));
    }

    #[test]
    fn test_equal_segments_match_on_both_sides() {
        let d = diff_segments("one two three four", "one three four five");
        let shared_old: Vec<&str> = d
            .old
            .iter()
            .filter(|s| matches!(s, Segment::Equal(_)))
            .map(|s| s.text())
            .collect();
        let shared_new: Vec<&str> = d
            .new
            .iter()
            .filter(|s| matches!(s, Segment::Equal(_)))
            .map(|s| s.text())
            .collect();
        assert_eq!(shared_old, shared_new);
        assert!(shared_old.contains(&"three"));
    }

    #[test]
    fn test_plain_style() {
        let d = diff_segments("the cat sat", "the dog sat").render(DiffStyle::Plain);
        assert_eq!(d.old, "the [-cat-] sat");
        assert_eq!(d.new, "the {+dog+} sat");
    }
}
