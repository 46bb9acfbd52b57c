//! Version history, comparison, and word-diff output.
//!
//! Used by `tdraft doc history`, `tdraft doc compare`, and `tdraft diff`.
//! Terminal output uses the plain `[-…-]`/`{+…+}` markers unless `--html`
//! is given.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use tender_draft_core::compare::{
    compare_versions_styled, known_section_ids, CompareError, SectionComparison,
    VersionComparison,
};
use tender_draft_core::diff::{diff_segments, DiffStyle};
use tender_draft_core::models::{DocumentType, SavedDocument};

use crate::config::Config;
use crate::db;
use crate::documents::DocumentLibrary;

fn style(html: bool) -> DiffStyle {
    if html {
        DiffStyle::Html
    } else {
        DiffStyle::Plain
    }
}

/// One line per history entry, most recent first.
pub fn render_history(doc_type: DocumentType, doc: &SavedDocument) -> String {
    let mut out = format!(
        "{} {} \"{}\": {} version(s)\n",
        doc_type,
        doc.id,
        doc.name,
        doc.history.len()
    );
    for (i, version) in doc.history.iter().enumerate() {
        let _ = writeln!(
            out,
            "  [{}] {}  {}",
            i,
            version.timestamp.format("%Y-%m-%d %H:%M:%S"),
            version.summary
        );
    }
    out
}

/// Side-by-side comparison as text: unchanged sections once, changed
/// sections as an old line and a new line.
pub fn render_comparison(cmp: &VersionComparison) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "old: [{}] {}  {}",
        cmp.old.index,
        cmp.old.timestamp.format("%Y-%m-%d %H:%M:%S"),
        cmp.old.summary
    );
    let _ = writeln!(
        out,
        "new: [{}] {}  {}",
        cmp.new.index,
        cmp.new.timestamp.format("%Y-%m-%d %H:%M:%S"),
        cmp.new.summary
    );

    for (id, section) in &cmp.sections {
        match section {
            SectionComparison::Same { content } => {
                let _ = writeln!(out, "\n== {} (unchanged)\n{}", id, content);
            }
            SectionComparison::Changed {
                rendered_old,
                rendered_new,
            } => {
                let _ = writeln!(
                    out,
                    "\n== {} (changed)\n- {}\n+ {}",
                    id, rendered_old, rendered_new
                );
            }
        }
    }
    let _ = write!(
        out,
        "\n{} of {} section(s) changed",
        cmp.changed_count(),
        cmp.sections.len()
    );
    out
}

pub async fn run_doc_history(config: &Config, doc_type: DocumentType, id: i64) -> Result<()> {
    let store = db::open_store(config).await?;
    let result = DocumentLibrary::new(&store).get(doc_type, id).await;
    store.close().await;

    print!("{}", render_history(doc_type, &result?));
    Ok(())
}

/// Options for `tdraft doc compare`.
#[derive(Debug, Clone, Default)]
pub struct CompareOptions {
    pub index_a: usize,
    pub index_b: usize,
    /// Empty means every section known to the document.
    pub sections: Vec<String>,
    pub html: bool,
    pub json: bool,
}

pub async fn run_doc_compare(
    config: &Config,
    doc_type: DocumentType,
    id: i64,
    opts: &CompareOptions,
) -> Result<()> {
    let store = db::open_store(config).await?;
    let result = DocumentLibrary::new(&store).get(doc_type, id).await;
    store.close().await;
    let doc = result?;

    let ids = if opts.sections.is_empty() {
        known_section_ids(&doc)
    } else {
        opts.sections.clone()
    };

    let cmp = match compare_versions_styled(
        &doc,
        ids.iter().map(String::as_str),
        opts.index_a,
        opts.index_b,
        style(opts.html),
    ) {
        Ok(cmp) => cmp,
        Err(e @ CompareError::InsufficientHistory { .. }) => {
            println!("{}", e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&cmp)?);
    } else {
        println!("{}", render_comparison(&cmp));
    }
    Ok(())
}

/// Word-diff two text files.
pub fn run_diff(old_path: &Path, new_path: &Path, html: bool) -> Result<()> {
    let old = std::fs::read_to_string(old_path)
        .with_context(|| format!("Failed to read {}", old_path.display()))?;
    let new = std::fs::read_to_string(new_path)
        .with_context(|| format!("Failed to read {}", new_path.display()))?;

    let diff = diff_segments(&old, &new);
    if !diff.has_changes() {
        println!("No differences.");
        return Ok(());
    }
    let rendered = diff.render(style(html));
    println!("--- {}\n{}", old_path.display(), rendered.old);
    println!("+++ {}\n{}", new_path.display(), rendered.new);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tender_draft_core::models::SectionMap;
    use tender_draft_core::versions::save_document;

    fn doc() -> SavedDocument {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let t1 = Utc.timestamp_opt(1_700_000_060, 0).unwrap();
        let mut sections = SectionMap::new();
        sections.insert("objeto".into(), "the cat sat".into());
        sections.insert("prazo".into(), "30 dias".into());
        let (first, _) = save_document(None, SavedDocument::draft(7, "TR", sections), t0);
        let mut edited = first.clone();
        edited.sections.insert("objeto".into(), "the dog sat".into());
        save_document(Some(&first), edited, t1).0
    }

    #[test]
    fn test_render_history_newest_first() {
        let out = render_history(DocumentType::Tr, &doc());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "tr 7 \"TR\": 2 version(s)");
        assert!(lines[1].starts_with("  [0] "));
        assert!(lines[1].ends_with("Changed: section content modified."));
        assert!(lines[2].ends_with("document created"));
    }

    #[test]
    fn test_render_comparison_plain() {
        let d = doc();
        let cmp = compare_versions_styled(&d, ["objeto", "prazo"], 0, 1, DiffStyle::Plain).unwrap();
        let out = render_comparison(&cmp);
        assert!(out.contains("== objeto (changed)\n- the [-cat-] sat\n+ the {+dog+} sat"));
        assert!(out.contains("== prazo (unchanged)\n30 dias"));
        assert!(out.ends_with("1 of 2 section(s) changed"));
    }
}
