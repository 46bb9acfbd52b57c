//! Text extraction for uploaded reference files.
//!
//! Supports PDF, DOCX, and UTF-8 text formats (plain text, JSON,
//! Markdown). The format is chosen from the MIME type, falling back to
//! the file extension when the MIME type is generic or missing.

use std::io::Read;

use thiserror::Error;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const TEXT_MIMES: &[&str] = &["text/plain", "application/json", "text/markdown"];
const TEXT_EXTENSIONS: &[&str] = &[".txt", ".json", ".md"];

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
    #[error("file is not valid UTF-8 text")]
    Encoding,
    #[error("file is empty or unreadable")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Pdf,
    Docx,
    Text,
}

/// Pick the extraction format from MIME type, then file extension.
pub fn detect_format(mime_type: &str, file_name: &str) -> Option<FileFormat> {
    let name = file_name.to_lowercase();
    if mime_type == MIME_PDF || name.ends_with(".pdf") {
        Some(FileFormat::Pdf)
    } else if mime_type == MIME_DOCX || name.ends_with(".docx") {
        Some(FileFormat::Docx)
    } else if TEXT_MIMES.contains(&mime_type) || TEXT_EXTENSIONS.iter().any(|e| name.ends_with(e))
    {
        Some(FileFormat::Text)
    } else {
        None
    }
}

/// Extract plain text from `bytes`. Whitespace-only results are an error.
pub fn extract_text(bytes: &[u8], mime_type: &str, file_name: &str) -> Result<String, ExtractError> {
    let format = detect_format(mime_type, file_name).ok_or_else(|| {
        ExtractError::UnsupportedFormat(if mime_type.is_empty() {
            file_name.to_string()
        } else {
            mime_type.to_string()
        })
    })?;

    let text = match format {
        FileFormat::Pdf => extract_pdf(bytes)?,
        FileFormat::Docx => extract_docx(bytes)?,
        FileFormat::Text => String::from_utf8(bytes.to_vec()).map_err(|_| ExtractError::Encoding)?,
    };

    if text.trim().is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(text)
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| ExtractError::Docx("word/document.xml not found".to_string()))?;

    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Docx(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }
    paragraphs_from_document_xml(&doc_xml)
}

/// Collect `w:t` runs. Paragraphs are separated by a blank line.
fn paragraphs_from_document_xml(xml: &[u8]) -> Result<String, ExtractError> {
    use quick_xml::events::Event;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Text(te)) if in_text => {
                let text = te.unescape().map_err(|e| ExtractError::Docx(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"tab" => out.push('\t'),
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}
