//! Integration tests for uploading reference files in each supported format.
//!
//! Asserts: DOCX text reaches the retrieval context, broken PDFs and
//! empty files are rejected per file, and the size limit applies before
//! extraction.

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn tdraft_binary() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_tdraft"))
}

fn minimal_docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file(
            "word/document.xml",
            zip::write::SimpleFileOptions::default(),
        )
        .unwrap();
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
            body
        );
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

fn setup_file_support_env(max_file_bytes: u64) -> (TempDir, std::path::PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    fs::create_dir_all(root.join("config")).unwrap();
    fs::create_dir_all(root.join("files")).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/tdraft.sqlite"

[upload]
max_file_bytes = {}
"#,
        root.display(),
        max_file_bytes
    );
    fs::write(root.join("config").join("tdraft.toml"), config_content).unwrap();

    (tmp, root.join("config").join("tdraft.toml"))
}

fn run_tdraft(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(tdraft_binary())
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run tdraft: {}", e));
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn file_support_docx_reaches_context() {
    let (tmp, config_path) = setup_file_support_env(50 * 1024 * 1024);
    let docx = tmp.path().join("files").join("modelo-tr.docx");
    fs::write(
        &docx,
        minimal_docx_with_paragraphs(&[
            "Art. 1º O objeto é a aquisição de notebooks.",
            "Art. 2º O prazo de entrega é de 30 dias.",
        ]),
    )
    .unwrap();

    let (stdout, stderr, success) =
        run_tdraft(&config_path, &["files", "add", docx.to_str().unwrap()]);
    assert!(success, "add failed: {} {}", stdout, stderr);
    assert!(stdout.contains("added   modelo-tr.docx (2 chunks)"), "{}", stdout);

    let (stdout, _, success) = run_tdraft(&config_path, &["context", "prazo"]);
    assert!(success);
    assert!(stdout.contains(
        "Context from file \"modelo-tr.docx\":\nArt. 2º O prazo de entrega é de 30 dias."
    ));
}

#[test]
fn file_support_docx_paragraphs_chunked_separately() {
    let (tmp, config_path) = setup_file_support_env(50 * 1024 * 1024);
    let docx = tmp.path().join("files").join("estudo.docx");
    fs::write(
        &docx,
        minimal_docx_with_paragraphs(&[
            "Primeiro parágrafo do estudo técnico preliminar.",
            "Segundo parágrafo com a justificativa da contratação.",
            "Terceiro parágrafo com a estimativa de quantidades.",
        ]),
    )
    .unwrap();

    let (stdout, stderr, success) =
        run_tdraft(&config_path, &["files", "add", docx.to_str().unwrap()]);
    assert!(success, "add failed: {} {}", stdout, stderr);
    assert!(stdout.contains("added   estudo.docx (3 chunks)"), "{}", stdout);

    let (stdout, _, success) = run_tdraft(&config_path, &["chunk", docx.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("3 chunks"), "{}", stdout);
    assert!(stdout.contains("Segundo parágrafo com a justificativa da contratação."));
}

#[test]
fn file_support_broken_pdf_rejected() {
    let (tmp, config_path) = setup_file_support_env(50 * 1024 * 1024);
    let files = tmp.path().join("files");
    fs::write(files.join("broken.pdf"), b"not a pdf").unwrap();
    fs::write(files.join("ok.txt"), "Texto de referência suficiente.").unwrap();

    let (stdout, _, success) = run_tdraft(
        &config_path,
        &[
            "files",
            "add",
            files.join("broken.pdf").to_str().unwrap(),
            files.join("ok.txt").to_str().unwrap(),
        ],
    );
    assert!(success, "batch must succeed");
    assert!(stdout.contains("PDF extraction failed"), "{}", stdout);
    assert!(stdout.contains("1 added, 1 failed"), "{}", stdout);
}

#[test]
fn file_support_empty_text_rejected() {
    let (tmp, config_path) = setup_file_support_env(50 * 1024 * 1024);
    let empty = tmp.path().join("files").join("vazio.txt");
    fs::write(&empty, "  \n\n ").unwrap();

    let (stdout, _, success) =
        run_tdraft(&config_path, &["files", "add", empty.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("empty or unreadable"), "{}", stdout);
}

#[test]
fn file_support_max_size_rejected() {
    let (tmp, config_path) = setup_file_support_env(1000);
    let files = tmp.path().join("files");
    fs::write(files.join("big.txt"), "x".repeat(2000)).unwrap();
    fs::write(files.join("small.txt"), "Um texto pequeno o bastante.").unwrap();

    let (stdout, _, success) = run_tdraft(
        &config_path,
        &[
            "files",
            "add",
            files.join("big.txt").to_str().unwrap(),
            files.join("small.txt").to_str().unwrap(),
        ],
    );
    assert!(success);
    assert!(stdout.contains("too large"), "{}", stdout);
    assert!(stdout.contains("1 added, 1 failed"), "{}", stdout);
}
