//! # Lexicon Core
//!
//! Shared, WASM-safe logic for Lexicon: data models, the tokenizer, the
//! TF-IDF index builder, query processing, similarity ranking, and the
//! document store abstraction.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! native-only dependencies. Scanning directories and persisting to SQLite
//! live in the `lexicon` application crate.
//!
//! # Pipeline
//!
//! ```text
//! text ──▶ tokenize ──▶ term counts ──▶ index::build_index ──▶ IDF + vectors
//!                                                                  │
//! query ──▶ tokenize ──▶ query::process_query ──▶ rank::rank ◀─────┘
//! ```

pub mod error;
pub mod index;
pub mod models;
pub mod query;
pub mod rank;
pub mod search;
pub mod store;
pub mod tokenize;

pub use error::IndexError;
