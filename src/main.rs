//! # Tender Draft CLI (`tdraft`)
//!
//! Manages uploaded reference files, saved ETP/TR documents with their
//! version history, and the supporting-documents context sent with
//! generation prompts.
//!
//! ## Usage
//!
//! ```bash
//! tdraft --config ./config/tdraft.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tdraft init` | Create the SQLite database and run schema migrations |
//! | `tdraft files <action>` | Add, list, select, lock, or remove reference files |
//! | `tdraft context "<query>"` | Show the supporting context selected for a query |
//! | `tdraft doc <action>` | List, save, create, delete, and inspect documents |
//! | `tdraft doc templates` | List the built-in document templates |
//! | `tdraft diff OLD NEW` | Word-level diff of two text files |
//! | `tdraft chunk FILE` | Show how a file would be chunked |
//! | `tdraft completions SHELL` | Print shell completions |

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tender_draft::config;
use tender_draft::context;
use tender_draft::documents::{self, CreateOptions, ListOptions};
use tender_draft::files::{self, FileAction};
use tender_draft::history::{self, CompareOptions};
use tender_draft::migrate;
use tender_draft_core::filter::SortOrder;
use tender_draft_core::models::{DocumentType, Priority};

/// Tender Draft CLI: versioned procurement documents with retrieval
/// context from reference files.
///
/// Commands that touch stored data read a TOML configuration file given by
/// `--config`. See `config/tdraft.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "tdraft",
    version,
    about = "Tender Draft: versioned procurement documents with retrieval context",
    long_about = None
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/tdraft.toml")]
    config: PathBuf,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the key-value table. Running
    /// it again is safe.
    Init,

    /// Manage uploaded reference files.
    Files {
        #[command(subcommand)]
        action: FilesAction,
    },

    /// Show the supporting-documents context selected for a query.
    ///
    /// Up to `retrieval.direct_limit` chunks are used as they are; larger
    /// sets are ranked by the configured oracle, falling back to the first
    /// `retrieval.fallback_count` chunks when it fails.
    Context {
        /// The drafting question or section prompt.
        query: String,
    },

    /// Manage saved ETP and TR documents.
    Doc {
        #[command(subcommand)]
        action: DocAction,
    },

    /// Word-level diff of two text files.
    Diff {
        old: PathBuf,
        new: PathBuf,
        /// Mark changes with <ins>/<del> instead of {+ +}/[- -].
        #[arg(long)]
        html: bool,
    },

    /// Extract a file's text and print its chunks.
    Chunk { path: PathBuf },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Reference file subcommands.
#[derive(Subcommand)]
enum FilesAction {
    /// Upload files (PDF, DOCX, TXT, JSON, MD). New files start selected.
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// List uploaded files with their selection and lock state.
    List,
    /// Include a file in the retrieval context.
    Select { name: String },
    /// Exclude a file from the retrieval context.
    Deselect { name: String },
    /// Freeze a file's selection state.
    Lock { name: String },
    /// Allow a file's selection state to change again.
    Unlock { name: String },
    /// Delete an uploaded file.
    Remove { name: String },
}

/// Document subcommands.
#[derive(Subcommand)]
enum DocAction {
    /// List saved documents of one type, most recently updated first.
    List {
        doc_type: DocumentType,
        /// Only documents with this priority.
        #[arg(long)]
        priority: Option<Priority>,
        /// Only documents whose name contains this text (case-insensitive).
        #[arg(long)]
        search: Option<String>,
        /// Order by `updated` (newest first) or `name`.
        #[arg(long, default_value_t = SortOrder::Updated)]
        sort: SortOrder,
    },

    /// Save a document (JSON object) or a whole collection (JSON array).
    ///
    /// A new version is recorded for every document whose name, priority,
    /// sections, or attachments changed.
    Save {
        doc_type: DocumentType,
        file: PathBuf,
    },

    /// Create a document with a fresh id.
    ///
    /// With `--template`, every section starts from the template's text and
    /// `--sections` overrides individual sections.
    Create {
        doc_type: DocumentType,
        /// Defaults to the template name when `--template` is given.
        #[arg(long, required_unless_present = "template")]
        name: Option<String>,
        /// Built-in template id (see `tdraft doc templates`).
        #[arg(long)]
        template: Option<String>,
        /// JSON object mapping section ids to their text.
        #[arg(long)]
        sections: Option<PathBuf>,
        #[arg(long)]
        priority: Option<Priority>,
    },

    /// List the built-in document templates.
    Templates { doc_type: Option<DocumentType> },

    /// Delete a document and its history.
    Delete { doc_type: DocumentType, id: i64 },

    /// Show a document's version history, most recent first.
    History { doc_type: DocumentType, id: i64 },

    /// Compare two versions of a document section by section.
    ///
    /// Version indices count from 0 (the most recent). Version `b` is shown
    /// as the old side and version `a` as the new side.
    Compare {
        doc_type: DocumentType,
        id: i64,
        #[arg(long, default_value_t = 0)]
        a: usize,
        #[arg(long, default_value_t = 1)]
        b: usize,
        /// Limit the comparison to these sections (repeatable).
        #[arg(long = "section")]
        sections: Vec<String>,
        /// Mark changes with <ins>/<del> instead of {+ +}/[- -].
        #[arg(long)]
        html: bool,
        /// Print the comparison as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Commands that don't require config
    match &cli.command {
        Commands::Diff { old, new, html } => return history::run_diff(old, new, *html),
        Commands::Chunk { path } => return files::run_chunk(path),
        Commands::Doc {
            action: DocAction::Templates { doc_type },
        } => return documents::run_doc_templates(*doc_type),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "tdraft", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Files { action } => match action {
            FilesAction::Add { paths } => files::run_files_add(&cfg, &paths).await?,
            FilesAction::List => files::run_files_list(&cfg).await?,
            FilesAction::Select { name } => {
                files::run_files_update(&cfg, &name, FileAction::Select).await?
            }
            FilesAction::Deselect { name } => {
                files::run_files_update(&cfg, &name, FileAction::Deselect).await?
            }
            FilesAction::Lock { name } => {
                files::run_files_update(&cfg, &name, FileAction::Lock).await?
            }
            FilesAction::Unlock { name } => {
                files::run_files_update(&cfg, &name, FileAction::Unlock).await?
            }
            FilesAction::Remove { name } => {
                files::run_files_update(&cfg, &name, FileAction::Remove).await?
            }
        },
        Commands::Context { query } => context::run_context(&cfg, &query).await?,
        Commands::Doc { action } => match action {
            DocAction::List {
                doc_type,
                priority,
                search,
                sort,
            } => {
                let opts = ListOptions {
                    priority,
                    search,
                    sort,
                };
                documents::run_doc_list(&cfg, doc_type, &opts).await?
            }
            DocAction::Save { doc_type, file } => {
                documents::run_doc_save(&cfg, doc_type, &file).await?
            }
            DocAction::Create {
                doc_type,
                name,
                template,
                sections,
                priority,
            } => {
                let opts = CreateOptions {
                    name,
                    template,
                    sections,
                    priority,
                };
                documents::run_doc_create(&cfg, doc_type, &opts).await?
            }
            // Handled above (before config loading)
            DocAction::Templates { .. } => unreachable!(),
            DocAction::Delete { doc_type, id } => {
                documents::run_doc_delete(&cfg, doc_type, id).await?
            }
            DocAction::History { doc_type, id } => {
                history::run_doc_history(&cfg, doc_type, id).await?
            }
            DocAction::Compare {
                doc_type,
                id,
                a,
                b,
                sections,
                html,
                json,
            } => {
                let opts = CompareOptions {
                    index_a: a,
                    index_b: b,
                    sections,
                    html,
                    json,
                };
                history::run_doc_compare(&cfg, doc_type, id, &opts).await?
            }
        },
        Commands::Diff { .. } | Commands::Chunk { .. } | Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
