//! # Tender Draft
//!
//! A drafting assistant for public-procurement documents: preliminary
//! technical studies (ETP) and terms of reference (TR).
//!
//! Documents are saved with a full version history, any two versions can
//! be compared section by section with a word-level diff, and uploaded
//! reference files (laws, templates, prior tenders) are chunked so the most
//! relevant passages can be attached to a generation prompt.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────┐
//! │ Reference    │──▶│ Extract +    │──▶│  SQLite   │
//! │ files        │   │ Chunk        │   │  kv_store │
//! └──────────────┘   └──────────────┘   └─────┬─────┘
//!                                             │
//!        ┌──────────────┬─────────────────────┤
//!        ▼              ▼                     ▼
//!  ┌───────────┐  ┌────────────┐       ┌────────────┐
//!  │ Context   │  │ Version    │       │ Compare +  │
//!  │ selection │  │ store      │       │ word diff  │
//!  └───────────┘  └────────────┘       └────────────┘
//! ```
//!
//! The pure logic (chunking, diffing, versioning, context selection) lives
//! in the `tender-draft-core` crate; this crate adds persistence, file
//! extraction, oracle providers, and the `tdraft` CLI.
//!
//! ## Quick Start
//!
//! ```bash
//! tdraft init
//! tdraft files add lei-14133.pdf modelo-tr.docx
//! tdraft context "prazo de entrega dos notebooks"
//! tdraft doc create tr --name "Aquisição de notebooks" --sections objeto.json
//! tdraft doc compare tr 1718000000000
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite key-value store |
//! | [`extract`] | PDF, DOCX, and text extraction |
//! | [`files`] | Uploaded reference files |
//! | [`documents`] | Saved ETP and TR collections |
//! | [`history`] | Version history and comparison output |
//! | [`oracle`] | Relevance oracle providers |
//! | [`context`] | Supporting-documents block for prompts |

pub mod config;
pub mod context;
pub mod db;
pub mod documents;
pub mod extract;
pub mod files;
pub mod history;
pub mod migrate;
pub mod oracle;
pub mod sqlite_store;
