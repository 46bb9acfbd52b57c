//! # Tender Draft Core
//!
//! Shared, I/O-free logic for Tender Draft: data models, chunking, the
//! word-level diff engine, document version history, version comparison,
//! retrieval-context selection, document templates and validation, and the
//! key-value store abstraction.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or HTTP
//! dependencies. Everything that talks to the outside world (the
//! relevance oracle, persistent storage) is reached through a trait.

pub mod chunk;
pub mod compare;
pub mod context;
pub mod diff;
pub mod filter;
pub mod models;
pub mod store;
pub mod templates;
pub mod validate;
pub mod versions;
