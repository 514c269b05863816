//! Storage backend selection.
//!
//! A corpus is served by exactly one backend for the life of the process.
//! The choice is made once in [`open_backend`]: SQLite when the database
//! opens and migrates cleanly, otherwise an in-memory store if (and only
//! if) `[db].memory_fallback = true`. The fallback is logged with
//! `tracing::warn!` and is never swapped back mid-session.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use lexicon_core::models::{
    Document, DocumentVector, Fingerprint, IdfTable, IndexCommit, IndexMeta, IndexSnapshot,
    TermFrequencies,
};
use lexicon_core::store::memory::InMemoryStore;
use lexicon_core::store::DocumentStore;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// The store serving one corpus.
pub enum StorageBackend {
    Persistent(SqliteStore),
    /// Used only after the SQLite database failed to open and the
    /// configuration allowed falling back. Nothing survives the process.
    InMemoryFallback(InMemoryStore),
}

impl StorageBackend {
    pub fn is_persistent(&self) -> bool {
        matches!(self, StorageBackend::Persistent(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StorageBackend::Persistent(_) => "sqlite",
            StorageBackend::InMemoryFallback(_) => "memory",
        }
    }

    fn inner(&self) -> &dyn DocumentStore {
        match self {
            StorageBackend::Persistent(store) => store as &dyn DocumentStore,
            StorageBackend::InMemoryFallback(store) => store as &dyn DocumentStore,
        }
    }

    pub async fn close(&self) {
        if let StorageBackend::Persistent(store) = self {
            store.close().await;
        }
    }
}

/// Open the backend for `corpus`.
pub async fn open_backend(config: &Config, corpus: &str) -> Result<StorageBackend> {
    let db_path = config.db_path(corpus);
    match SqliteStore::open(&db_path).await {
        Ok(store) => {
            tracing::debug!(corpus, path = %db_path.display(), "opened sqlite store");
            Ok(StorageBackend::Persistent(store))
        }
        Err(e) if config.db.memory_fallback => {
            tracing::warn!(
                corpus,
                path = %db_path.display(),
                error = %e,
                "sqlite store unavailable; falling back to an in-memory index for this session"
            );
            Ok(StorageBackend::InMemoryFallback(InMemoryStore::new()))
        }
        Err(e) => Err(e),
    }
}

#[async_trait]
impl DocumentStore for StorageBackend {
    async fn get_all_documents(&self) -> Result<Vec<Document>> {
        self.inner().get_all_documents().await
    }

    async fn list_fingerprints(&self) -> Result<Vec<Fingerprint>> {
        self.inner().list_fingerprints().await
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        self.inner().get_document(id).await
    }

    async fn upsert_document(&self, doc: &Document) -> Result<()> {
        self.inner().upsert_document(doc).await
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        self.inner().delete_document(id).await
    }

    async fn set_term_frequencies(&self, doc_id: &str, terms: &TermFrequencies) -> Result<()> {
        self.inner().set_term_frequencies(doc_id, terms).await
    }

    async fn get_term_frequencies(&self, doc_id: &str) -> Result<TermFrequencies> {
        self.inner().get_term_frequencies(doc_id).await
    }

    async fn get_all_term_frequencies(&self) -> Result<HashMap<String, TermFrequencies>> {
        self.inner().get_all_term_frequencies().await
    }

    async fn set_idf_table(&self, idf: &IdfTable) -> Result<()> {
        self.inner().set_idf_table(idf).await
    }

    async fn get_idf_table(&self) -> Result<IdfTable> {
        self.inner().get_idf_table().await
    }

    async fn set_document_vector(&self, doc_id: &str, vector: DocumentVector) -> Result<()> {
        self.inner().set_document_vector(doc_id, vector).await
    }

    async fn get_all_document_vectors(&self) -> Result<HashMap<String, DocumentVector>> {
        self.inner().get_all_document_vectors().await
    }

    async fn get_index_meta(&self) -> Result<Option<IndexMeta>> {
        self.inner().get_index_meta().await
    }

    async fn document_count(&self) -> Result<usize> {
        self.inner().document_count().await
    }

    async fn generation(&self) -> Result<u64> {
        self.inner().generation().await
    }

    async fn commit(&self, commit: &IndexCommit) -> Result<()> {
        self.inner().commit(commit).await
    }

    async fn load_snapshot(&self, with_content: bool) -> Result<IndexSnapshot> {
        self.inner().load_snapshot(with_content).await
    }

    async fn clear(&self) -> Result<()> {
        self.inner().clear().await
    }
}
