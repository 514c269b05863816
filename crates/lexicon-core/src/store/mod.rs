//! Storage abstraction for Lexicon.
//!
//! The [`DocumentStore`] trait defines every storage operation the index
//! maintainer and the search path need, so the core algorithm is agnostic to
//! whether the index lives in SQLite, in memory, or somewhere else.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//!
//! # Consistency
//!
//! The maintainer writes through [`commit`](DocumentStore::commit), which
//! must apply an [`IndexCommit`] atomically. Search reads through
//! [`load_snapshot`](DocumentStore::load_snapshot), which must return a view
//! of exactly one committed state. Together these guarantee that a query
//! never compares new IDF weights against old magnitudes.
//!
//! Every non-empty commit and every `clear` advances the store's
//! [`generation`](DocumentStore::generation). A pass records the generation
//! before it reads anything and hands it back in
//! [`IndexCommit::base_generation`]; the store refuses the commit if the
//! generation moved, so two overlapping passes cannot interleave.
//!
//! The granular setters (`upsert_document`, `set_idf_table`, …) write single
//! pieces and offer no cross-piece consistency; they exist for tooling and
//! tests, not for the maintenance path.

pub mod memory;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{
    Document, DocumentVector, Fingerprint, IdfTable, IndexCommit, IndexMeta, IndexSnapshot,
    TermFrequencies,
};

/// Abstract persistence for one corpus's documents and index.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_all_documents`](DocumentStore::get_all_documents) | All documents, ordered by id |
/// | [`list_fingerprints`](DocumentStore::list_fingerprints) | Id, path, hash, and mtime of every document |
/// | [`get_document`](DocumentStore::get_document) | One document by id |
/// | [`upsert_document`](DocumentStore::upsert_document) | Insert or replace a document's metadata |
/// | [`delete_document`](DocumentStore::delete_document) | Remove a document, its term counts, and its vector |
/// | [`set_term_frequencies`](DocumentStore::set_term_frequencies) | Replace a document's term counts |
/// | [`get_term_frequencies`](DocumentStore::get_term_frequencies) | Read a document's term counts |
/// | [`get_all_term_frequencies`](DocumentStore::get_all_term_frequencies) | Term counts for every document |
/// | [`set_idf_table`](DocumentStore::set_idf_table) | Replace the IDF table |
/// | [`get_idf_table`](DocumentStore::get_idf_table) | Read the IDF table |
/// | [`set_document_vector`](DocumentStore::set_document_vector) | Store a document's magnitude |
/// | [`get_all_document_vectors`](DocumentStore::get_all_document_vectors) | Read every magnitude |
/// | [`get_index_meta`](DocumentStore::get_index_meta) | Policy versions of the committed index |
/// | [`generation`](DocumentStore::generation) | Counter advanced by every commit |
/// | [`document_count`](DocumentStore::document_count) | Number of indexed documents |
/// | [`commit`](DocumentStore::commit) | Atomically apply a maintenance pass |
/// | [`load_snapshot`](DocumentStore::load_snapshot) | Consistent read view for search |
/// | [`clear`](DocumentStore::clear) | Remove everything |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_all_documents(&self) -> Result<Vec<Document>>;

    /// Change-detection fields for every document, without content.
    async fn list_fingerprints(&self) -> Result<Vec<Fingerprint>>;

    async fn get_document(&self, id: &str) -> Result<Option<Document>>;

    async fn upsert_document(&self, doc: &Document) -> Result<()>;

    /// Delete a document together with its term counts and vector.
    ///
    /// Deleting an unknown id is not an error.
    async fn delete_document(&self, id: &str) -> Result<()>;

    /// Replace all term counts for a document. Zero counts are not stored.
    async fn set_term_frequencies(&self, doc_id: &str, terms: &TermFrequencies) -> Result<()>;

    /// Term counts for a document; empty if the document is unknown.
    async fn get_term_frequencies(&self, doc_id: &str) -> Result<TermFrequencies>;

    async fn get_all_term_frequencies(&self) -> Result<HashMap<String, TermFrequencies>>;

    async fn set_idf_table(&self, idf: &IdfTable) -> Result<()>;

    async fn get_idf_table(&self) -> Result<IdfTable>;

    async fn set_document_vector(&self, doc_id: &str, vector: DocumentVector) -> Result<()>;

    async fn get_all_document_vectors(&self) -> Result<HashMap<String, DocumentVector>>;

    async fn get_index_meta(&self) -> Result<Option<IndexMeta>>;

    /// Number of commits and clears applied so far; `0` for a new store.
    async fn generation(&self) -> Result<u64>;

    async fn document_count(&self) -> Result<usize>;

    /// Apply every part of `commit` atomically.
    ///
    /// Fails with [`IndexError::Conflict`](crate::IndexError::Conflict),
    /// writing nothing, when `commit.base_generation` is set and differs
    /// from the current generation.
    async fn commit(&self, commit: &IndexCommit) -> Result<()>;

    /// Read one committed state: documents, term counts, vectors, IDF, meta.
    /// With `with_content`, each document's stored content is read in the
    /// same view.
    async fn load_snapshot(&self, with_content: bool) -> Result<IndexSnapshot>;

    /// Remove all documents and index data.
    async fn clear(&self) -> Result<()>;
}
