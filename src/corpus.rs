//! The per-corpus handle.
//!
//! A [`Corpus`] owns the resolved configuration and the storage backend of
//! one named corpus. It is opened once per command and passed explicitly to
//! whatever needs it; there is no process-wide index.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use lexicon_core::models::{mtime_seconds, Document, IndexMeta};
use lexicon_core::search::{search, SearchOptions, SearchResponse};
use lexicon_core::store::DocumentStore;
use lexicon_core::IndexError;

use crate::backend::{open_backend, StorageBackend};
use crate::config::{Config, CorpusConfig};
use crate::maintain::{IndexMaintainer, SyncOptions, SyncReport};
use crate::progress::IndexProgressReporter;
use crate::scanner::{document_id, FsScanner};

/// Summary of one corpus's index.
#[derive(Debug, Clone, Serialize)]
pub struct CorpusStats {
    pub corpus: String,
    pub root: PathBuf,
    pub backend: &'static str,
    pub db_path: Option<PathBuf>,
    pub db_size_bytes: u64,
    pub documents: usize,
    /// Distinct terms in the IDF table.
    pub terms: usize,
    /// Stored (document, term) count entries.
    pub postings: usize,
    pub meta: Option<IndexMeta>,
    /// Most recent document mtime, in Unix seconds.
    pub newest_mtime: Option<i64>,
    pub languages: BTreeMap<String, usize>,
}

pub struct Corpus {
    name: String,
    config: CorpusConfig,
    db_path: PathBuf,
    store: StorageBackend,
}

impl Corpus {
    /// Resolve `name` in `config` and open its storage backend.
    pub async fn open(config: &Config, name: &str) -> Result<Self> {
        let corpus_config = config.corpus(name)?.clone();
        let store = open_backend(config, name).await?;
        Ok(Self {
            name: name.to_string(),
            config: corpus_config,
            db_path: config.db_path(name),
            store,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &StorageBackend {
        &self.store
    }

    /// Run one maintenance pass over the corpus root.
    pub async fn sync(
        &self,
        full: bool,
        dry_run: bool,
        progress: &dyn IndexProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, IndexError> {
        let scanner = FsScanner::new(&self.config)?;
        let options = SyncOptions {
            scheme: self.config.scheme.clone(),
            keep_content: self.config.keep_content,
            full,
            dry_run,
        };
        IndexMaintainer::new(&self.name, options)
            .sync(&self.store, &scanner, progress, cancel)
            .await
    }

    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResponse, IndexError> {
        search(&self.store, query, options).await
    }

    /// Fetch a document by id, or by path relative to the corpus root.
    pub async fn get(&self, id_or_path: &str) -> Result<Option<Document>> {
        if let Some(doc) = self.store.get_document(id_or_path).await? {
            return Ok(Some(doc));
        }
        let path = id_or_path.trim_start_matches("./");
        self.store
            .get_document(&document_id(&self.config.scheme, path))
            .await
    }

    pub async fn stats(&self) -> Result<CorpusStats> {
        let snapshot = self.store.load_snapshot(false).await?;
        let newest_mtime = self
            .store
            .list_fingerprints()
            .await?
            .iter()
            .map(|fp| mtime_seconds(fp.mtime))
            .max();

        let mut languages: BTreeMap<String, usize> = BTreeMap::new();
        for doc in &snapshot.documents {
            let lang = doc.language.clone().unwrap_or_else(|| "other".to_string());
            *languages.entry(lang).or_default() += 1;
        }

        let (db_path, db_size_bytes) = if self.store.is_persistent() {
            let size = std::fs::metadata(&self.db_path)
                .map(|m| m.len())
                .unwrap_or(0);
            (Some(self.db_path.clone()), size)
        } else {
            (None, 0)
        };

        Ok(CorpusStats {
            corpus: self.name.clone(),
            root: self.config.root.clone(),
            backend: self.store.kind(),
            db_path,
            db_size_bytes,
            documents: snapshot.len(),
            terms: snapshot.idf.len(),
            postings: snapshot.documents.iter().map(|d| d.terms.len()).sum(),
            meta: snapshot.meta,
            newest_mtime,
            languages,
        })
    }

    /// Remove every document and all index data.
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await?;
        tracing::info!(corpus = %self.name, "cleared index");
        Ok(())
    }

    pub async fn close(&self) {
        self.store.close().await;
    }
}
