//! Incremental index maintenance.
//!
//! One pass of [`IndexMaintainer::sync`] brings a corpus's index in line
//! with what its [`Scanner`] currently sees:
//!
//! ```text
//! list ──▶ mtime equal? ──yes──▶ unchanged
//!               │ no
//!               ▼
//!         read + hash ──same──▶ touched (mtime only)
//!               │ differs / new
//!               ▼
//!          tokenize ──▶ upsert
//!
//! stored but not listed ──▶ removed
//! ```
//!
//! Whenever the document set or any document's content changed, or the
//! stored index was built under different tokenizer/weighting versions, the
//! IDF table and every document magnitude are recomputed from the full set
//! of term counts. Everything is written with one atomic
//! [`IndexCommit`](lexicon_core::models::IndexCommit), so a concurrent
//! search sees either the previous index or the new one.
//!
//! A file that cannot be read (I/O error, non-UTF-8, over the size limit) is
//! recorded in [`SyncReport::failures`] and excluded from the index; if it
//! was indexed before, its old copy is removed. The pass itself continues.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use lexicon_core::index::build_index;
use lexicon_core::models::{
    content_hash, CorpusWeights, Document, Fingerprint, IndexCommit, IndexMeta, IndexedDocument,
    TermFrequencies,
};
use lexicon_core::store::DocumentStore;
use lexicon_core::tokenize::term_counts;
use lexicon_core::IndexError;

use crate::progress::{IndexProgressEvent, IndexProgressReporter};
use crate::scanner::{detect_language, document_id, Scanner};

/// Emit an `Indexing` progress event every this many files.
const PROGRESS_EVERY: u64 = 100;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// URI scheme for document ids (`file` gives `file://src/lib.rs`).
    pub scheme: String,
    /// Store raw content alongside term counts.
    pub keep_content: bool,
    /// Re-read and re-tokenize every file regardless of mtime or hash.
    pub full: bool,
    /// Compute the report without writing anything.
    pub dry_run: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            scheme: "file".to_string(),
            keep_content: true,
            full: false,
            dry_run: false,
        }
    }
}

/// A file that could not be indexed during a pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileFailure {
    pub path: String,
    pub reason: String,
}

/// Outcome of one maintenance pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub corpus: String,
    /// Files listed by the scanner.
    pub scanned: usize,
    pub added: usize,
    pub updated: usize,
    /// Files whose mtime moved but whose content hash did not.
    pub touched: usize,
    pub unchanged: usize,
    pub removed: usize,
    pub failures: Vec<FileFailure>,
    /// Whether the IDF table and magnitudes were rebuilt.
    pub recomputed: bool,
    /// Whether anything was written. Always false for a dry run.
    pub committed: bool,
    pub dry_run: bool,
    /// Documents in the index after the pass.
    pub documents: usize,
}

impl SyncReport {
    pub fn changed(&self) -> bool {
        self.added > 0 || self.updated > 0 || self.removed > 0
    }
}

/// Keeps one corpus's index in sync with its files.
pub struct IndexMaintainer {
    corpus: String,
    options: SyncOptions,
}

impl IndexMaintainer {
    pub fn new(corpus: impl Into<String>, options: SyncOptions) -> Self {
        Self {
            corpus: corpus.into(),
            options,
        }
    }

    /// Run one maintenance pass.
    ///
    /// Returns [`IndexError::Cancelled`] without writing if `cancel` fires
    /// before the commit. Scanner listing and store failures are returned as
    /// [`IndexError::Store`]; per-file read failures are not errors.
    pub async fn sync(
        &self,
        store: &dyn DocumentStore,
        scanner: &dyn Scanner,
        progress: &dyn IndexProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, IndexError> {
        let corpus = self.corpus.as_str();
        let mut report = SyncReport {
            corpus: corpus.to_string(),
            dry_run: self.options.dry_run,
            ..Default::default()
        };

        progress.report(IndexProgressEvent::Discovering {
            corpus: corpus.to_string(),
        });
        let entries = scanner.list().await?;
        report.scanned = entries.len();

        // Read before anything else so a commit landing mid-pass is caught.
        let base_generation = store.generation().await?;
        let stored: HashMap<String, Fingerprint> = store
            .list_fingerprints()
            .await?
            .into_iter()
            .map(|fp| (fp.id.clone(), fp))
            .collect();

        let meta = store.get_index_meta().await?;
        let current = IndexMeta::current();
        let tokenizer_stale = match meta {
            Some(m) => m.tokenizer_version != current.tokenizer_version,
            None => !stored.is_empty(),
        };
        let weights_stale = meta != Some(current);
        let retokenize_all = self.options.full || tokenizer_stale;
        if tokenizer_stale {
            tracing::info!(
                corpus,
                stored = ?meta,
                current = ?current,
                "index built by a different tokenizer; re-tokenizing every document"
            );
        } else if weights_stale && !stored.is_empty() {
            tracing::info!(
                corpus,
                stored = ?meta,
                current = ?current,
                "index built with different weighting; recomputing weights"
            );
        }

        let mut commit = IndexCommit {
            base_generation: Some(base_generation),
            ..Default::default()
        };
        let mut seen: HashSet<String> = HashSet::with_capacity(entries.len());
        let total = entries.len() as u64;

        for (i, entry) in entries.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!(corpus, "index pass cancelled; nothing was written");
                return Err(IndexError::Cancelled);
            }

            let n = i as u64 + 1;
            if n % PROGRESS_EVERY == 0 || n == total {
                progress.report(IndexProgressEvent::Indexing {
                    corpus: corpus.to_string(),
                    n,
                    total,
                });
            }

            let id = document_id(&self.options.scheme, &entry.path);
            seen.insert(id.clone());
            let previous = stored.get(&id);

            if let Some(prev) = previous {
                if !retokenize_all && prev.mtime == entry.mtime {
                    report.unchanged += 1;
                    continue;
                }
            }

            let text = match scanner.read(&entry.path).await {
                Ok(text) => text,
                Err(e) => {
                    let reason = format!("{:#}", e);
                    tracing::warn!(corpus, path = %entry.path, %reason, "skipping file");
                    report.failures.push(FileFailure {
                        path: entry.path.clone(),
                        reason,
                    });
                    if previous.is_some() {
                        commit.removed.push(id);
                        report.removed += 1;
                    }
                    continue;
                }
            };

            let hash = content_hash(text.as_bytes());
            if let Some(prev) = previous {
                if !retokenize_all && prev.content_hash == hash {
                    tracing::debug!(corpus, path = %entry.path, "mtime changed, content did not");
                    commit.touched.push(Fingerprint {
                        mtime: entry.mtime,
                        ..prev.clone()
                    });
                    report.touched += 1;
                    continue;
                }
            }

            let terms = term_counts(&text);
            tracing::debug!(
                corpus,
                path = %entry.path,
                terms = terms.len(),
                "tokenized"
            );
            if previous.is_some() {
                report.updated += 1;
            } else {
                report.added += 1;
            }
            commit.upserts.push(IndexedDocument {
                document: Document {
                    id,
                    path: entry.path.clone(),
                    content_hash: hash,
                    mtime: entry.mtime,
                    language: detect_language(&entry.path),
                    raw_content: self.options.keep_content.then_some(text),
                },
                terms,
            });
        }

        let mut gone: Vec<&String> = stored.keys().filter(|id| !seen.contains(*id)).collect();
        gone.sort();
        for id in gone {
            tracing::debug!(corpus, id = %id, "removed from disk");
            commit.removed.push(id.clone());
            report.removed += 1;
        }

        let remaining: HashSet<&String> = stored
            .keys()
            .filter(|id| !commit.removed.contains(*id))
            .chain(commit.upserts.iter().map(|u| &u.document.id))
            .collect();
        report.documents = remaining.len();

        if report.changed() || weights_stale {
            let weights = self.recompute(store, &commit).await?;
            report.recomputed = true;
            commit.weights = Some(weights);
        }

        if cancel.is_cancelled() {
            tracing::warn!(corpus, "index pass cancelled before commit; nothing was written");
            return Err(IndexError::Cancelled);
        }

        if self.options.dry_run {
            tracing::info!(corpus, ?report, "dry run; nothing was written");
            return Ok(report);
        }

        if !commit.is_empty() {
            progress.report(IndexProgressEvent::Committing {
                corpus: corpus.to_string(),
                documents: report.documents as u64,
            });
            if let Err(e) = store.commit(&commit).await {
                let err = IndexError::from_store(e);
                if matches!(err, IndexError::Conflict { .. }) {
                    tracing::warn!(
                        corpus,
                        error = %err,
                        "index changed during the pass; nothing was written"
                    );
                }
                return Err(err);
            }
            report.committed = true;
        }

        tracing::info!(
            corpus,
            scanned = report.scanned,
            added = report.added,
            updated = report.updated,
            touched = report.touched,
            removed = report.removed,
            failures = report.failures.len(),
            documents = report.documents,
            "index pass complete"
        );
        Ok(report)
    }

    /// Rebuild IDF and magnitudes over the stored term counts with this
    /// pass's removals and upserts applied.
    async fn recompute(
        &self,
        store: &dyn DocumentStore,
        commit: &IndexCommit,
    ) -> Result<CorpusWeights, IndexError> {
        let mut all: BTreeMap<String, TermFrequencies> = BTreeMap::new();
        for fp in store.list_fingerprints().await? {
            all.insert(fp.id, TermFrequencies::new());
        }
        for (id, terms) in store.get_all_term_frequencies().await? {
            if let Some(slot) = all.get_mut(&id) {
                *slot = terms;
            }
        }
        for id in &commit.removed {
            all.remove(id);
        }
        for upsert in &commit.upserts {
            all.insert(upsert.document.id.clone(), upsert.terms.clone());
        }

        let built = build_index(all.iter().map(|(id, terms)| (id.as_str(), terms)));
        tracing::debug!(
            corpus = %self.corpus,
            documents = all.len(),
            terms = built.idf.len(),
            "recomputed weights"
        );
        Ok(CorpusWeights {
            idf: built.idf,
            vectors: built.vectors,
            meta: Some(IndexMeta::current()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::progress::NoProgress;
    use crate::scanner::{FsScanner, ScanEntry};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
    use filetime::{set_file_mtime, FileTime};
    use lexicon_core::models::NANOS_PER_SEC;
    use lexicon_core::search::{search, SearchOptions};
    use lexicon_core::store::memory::InMemoryStore;
    use std::path::Path;
    use tempfile::TempDir;

    fn scanner_for(root: &Path) -> FsScanner {
        let cfg = parse_config(&format!(
            "[db]\ndir = \"./data\"\n\n[corpus.code]\nroot = \"{}\"\nmax_file_bytes = 4096\n",
            root.display()
        ))
        .unwrap();
        FsScanner::new(cfg.corpus("code").unwrap()).unwrap()
    }

    fn write(root: &Path, rel: &str, body: &str, mtime: i64) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, body).unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(mtime, 0)).unwrap();
    }

    async fn run(store: &InMemoryStore, root: &Path, options: SyncOptions) -> SyncReport {
        IndexMaintainer::new("code", options)
            .sync(
                store,
                &scanner_for(root),
                &NoProgress,
                &CancellationToken::new(),
            )
            .await
            .unwrap()
    }

    async fn magnitudes(store: &InMemoryStore) -> HashMap<String, f64> {
        store
            .get_all_document_vectors()
            .await
            .unwrap()
            .into_iter()
            .map(|(id, v)| (id, v.magnitude))
            .collect()
    }

    #[tokio::test]
    async fn test_first_pass_adds_everything() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.md", "apple banana", 1_000);
        write(tmp.path(), "b.md", "banana cherry", 1_000);

        let store = InMemoryStore::new();
        let report = run(&store, tmp.path(), SyncOptions::default()).await;
        assert_eq!(report.added, 2);
        assert!(report.recomputed && report.committed);
        assert_eq!(report.documents, 2);

        let snap = store.load_snapshot(false).await.unwrap();
        assert_eq!(snap.meta, Some(IndexMeta::current()));
        assert!(snap.idf.contains_key("apple"));
        assert!(snap.documents.iter().all(|d| d.vector.is_some()));
    }

    #[tokio::test]
    async fn test_second_pass_is_noop() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.md", "apple banana", 1_000);

        let store = InMemoryStore::new();
        run(&store, tmp.path(), SyncOptions::default()).await;
        let report = run(&store, tmp.path(), SyncOptions::default()).await;
        assert_eq!(report.unchanged, 1);
        assert!(!report.recomputed);
        assert!(!report.committed);
    }

    #[tokio::test]
    async fn test_touch_without_content_change() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.md", "apple banana", 1_000);
        write(tmp.path(), "b.md", "banana cherry", 1_000);

        let store = InMemoryStore::new();
        run(&store, tmp.path(), SyncOptions::default()).await;
        let before = magnitudes(&store).await;

        write(tmp.path(), "a.md", "apple banana", 2_000);
        let report = run(&store, tmp.path(), SyncOptions::default()).await;
        assert_eq!(report.touched, 1);
        assert_eq!(report.unchanged, 1);
        assert!(!report.recomputed);
        assert!(report.committed);

        assert_eq!(magnitudes(&store).await, before);
        let doc = store.get_document("file://a.md").await.unwrap().unwrap();
        assert_eq!(doc.mtime, 2_000 * NANOS_PER_SEC);
    }

    #[tokio::test]
    async fn test_edit_within_same_second_is_reindexed() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.md");
        std::fs::write(&a, "apple banana").unwrap();
        set_file_mtime(&a, FileTime::from_unix_time(1_000, 100)).unwrap();
        write(tmp.path(), "b.md", "banana cherry", 1_000);

        let store = InMemoryStore::new();
        run(&store, tmp.path(), SyncOptions::default()).await;

        std::fs::write(&a, "cherry durian").unwrap();
        set_file_mtime(&a, FileTime::from_unix_time(1_000, 900_000_000)).unwrap();
        let report = run(&store, tmp.path(), SyncOptions::default()).await;
        assert_eq!(report.updated, 1);
        assert_eq!(report.unchanged, 1);

        let options = SearchOptions::default();
        let fresh = search(&store, "durian", &options).await.unwrap();
        assert_eq!(fresh.results.len(), 1);
        assert_eq!(fresh.results[0].id, "file://a.md");
        let stale = search(&store, "apple", &options).await.unwrap();
        assert!(stale.results.is_empty());
    }

    #[tokio::test]
    async fn test_update_propagates_idf() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.md", "apple banana", 1_000);
        write(tmp.path(), "b.md", "banana cherry", 1_000);

        let store = InMemoryStore::new();
        run(&store, tmp.path(), SyncOptions::default()).await;
        let before_idf = store.get_idf_table().await.unwrap();
        let before = magnitudes(&store).await;

        // docA now shares "cherry" with docB, so docB's weights move too.
        write(tmp.path(), "a.md", "apple cherry", 2_000);
        let report = run(&store, tmp.path(), SyncOptions::default()).await;
        assert_eq!(report.updated, 1);
        assert!(report.recomputed);

        let after_idf = store.get_idf_table().await.unwrap();
        let after = magnitudes(&store).await;
        assert_ne!(before_idf["cherry"], after_idf["cherry"]);
        assert_ne!(before["file://a.md"], after["file://a.md"]);
        assert_ne!(before["file://b.md"], after["file://b.md"]);
    }

    #[tokio::test]
    async fn test_deleted_file_removed() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.md", "apple banana", 1_000);
        write(tmp.path(), "b.md", "banana cherry", 1_000);

        let store = InMemoryStore::new();
        run(&store, tmp.path(), SyncOptions::default()).await;

        std::fs::remove_file(tmp.path().join("b.md")).unwrap();
        let report = run(&store, tmp.path(), SyncOptions::default()).await;
        assert_eq!(report.removed, 1);
        assert_eq!(report.documents, 1);

        assert!(store
            .get_term_frequencies("file://b.md")
            .await
            .unwrap()
            .is_empty());
        assert!(!magnitudes(&store).await.contains_key("file://b.md"));

        let response = search(&store, "cherry banana", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(response.total_indexed, 1);
        assert!(response.results.iter().all(|h| h.id != "file://b.md"));
    }

    #[tokio::test]
    async fn test_incremental_matches_full_rebuild() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.rs", "fn parse_request() { body }", 1_000);
        write(tmp.path(), "b.rs", "fn render_response() { body }", 1_000);
        write(tmp.path(), "c.md", "request and response notes", 1_000);

        let incremental = InMemoryStore::new();
        run(&incremental, tmp.path(), SyncOptions::default()).await;

        write(tmp.path(), "b.rs", "fn render_response(body: Body) {}", 2_000);
        write(tmp.path(), "d.md", "parse everything", 2_000);
        std::fs::remove_file(tmp.path().join("a.rs")).unwrap();
        run(&incremental, tmp.path(), SyncOptions::default()).await;

        let rebuilt = InMemoryStore::new();
        run(&rebuilt, tmp.path(), SyncOptions::default()).await;

        let a = incremental.get_idf_table().await.unwrap();
        let b = rebuilt.get_idf_table().await.unwrap();
        assert_eq!(a.len(), b.len());
        for (term, w) in &a {
            assert!((w - b[term]).abs() < 1e-12, "idf differs for {}", term);
        }

        let ma = magnitudes(&incremental).await;
        let mb = magnitudes(&rebuilt).await;
        assert_eq!(ma.len(), mb.len());
        for (id, m) in &ma {
            assert!((m - mb[id]).abs() < 1e-12, "magnitude differs for {}", id);
        }
    }

    #[tokio::test]
    async fn test_unreadable_file_recorded_and_removed() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.md", "apple banana", 1_000);
        write(tmp.path(), "b.md", "banana cherry", 1_000);

        let store = InMemoryStore::new();
        run(&store, tmp.path(), SyncOptions::default()).await;

        let bad = tmp.path().join("b.md");
        std::fs::write(&bad, [0xff, 0xfe, 0xfd]).unwrap();
        set_file_mtime(&bad, FileTime::from_unix_time(2_000, 0)).unwrap();
        write(tmp.path(), "big.md", &"word ".repeat(2_000), 2_000);

        let report = run(&store, tmp.path(), SyncOptions::default()).await;
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].path, "b.md");
        assert_eq!(report.failures[1].path, "big.md");
        assert_eq!(report.removed, 1);
        assert_eq!(report.documents, 1);
        assert!(store.get_document("file://b.md").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.md", "apple banana", 1_000);

        let store = InMemoryStore::new();
        let report = run(
            &store,
            tmp.path(),
            SyncOptions {
                dry_run: true,
                ..Default::default()
            },
        )
        .await;
        assert_eq!(report.added, 1);
        assert!(!report.committed);
        assert_eq!(store.document_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cancel_leaves_previous_index() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.md", "apple banana", 1_000);

        let store = InMemoryStore::new();
        run(&store, tmp.path(), SyncOptions::default()).await;

        write(tmp.path(), "b.md", "banana cherry", 2_000);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = IndexMaintainer::new("code", SyncOptions::default())
            .sync(&store, &scanner_for(tmp.path()), &NoProgress, &cancel)
            .await;
        assert!(matches!(result, Err(IndexError::Cancelled)));
        assert_eq!(store.document_count().await.unwrap(), 1);
    }

    /// Clears the store the first time a file is read, as a second
    /// `lex clear`/`lex index` on the same corpus would.
    struct ClearsMidPass<'a> {
        inner: FsScanner,
        store: &'a InMemoryStore,
        fired: AtomicBool,
    }

    #[async_trait]
    impl Scanner for ClearsMidPass<'_> {
        async fn list(&self) -> anyhow::Result<Vec<ScanEntry>> {
            self.inner.list().await
        }

        async fn read(&self, path: &str) -> anyhow::Result<String> {
            if !self.fired.swap(true, AtomicOrdering::SeqCst) {
                self.store.clear().await?;
            }
            self.inner.read(path).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_commit_rejects_pass() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.md", "apple banana", 1_000);

        let store = InMemoryStore::new();
        run(&store, tmp.path(), SyncOptions::default()).await;

        write(tmp.path(), "b.md", "banana cherry", 2_000);
        let scanner = ClearsMidPass {
            inner: scanner_for(tmp.path()),
            store: &store,
            fired: AtomicBool::new(false),
        };
        let result = IndexMaintainer::new("code", SyncOptions::default())
            .sync(&store, &scanner, &NoProgress, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(IndexError::Conflict { .. })));
        // the weights computed from the pre-clear document set were not applied
        assert_eq!(store.document_count().await.unwrap(), 0);
        assert!(store.get_idf_table().await.unwrap().is_empty());

        let report = run(&store, tmp.path(), SyncOptions::default()).await;
        assert_eq!(report.added, 2);
    }

    #[tokio::test]
    async fn test_version_mismatch_retokenizes() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.md", "apple banana", 1_000);
        write(tmp.path(), "b.md", "banana cherry", 1_000);

        let store = InMemoryStore::new();
        run(&store, tmp.path(), SyncOptions::default()).await;

        // Pretend the index came from an older tokenizer.
        let mut weights = CorpusWeights {
            idf: store.get_idf_table().await.unwrap(),
            vectors: store.get_all_document_vectors().await.unwrap(),
            meta: Some(IndexMeta {
                tokenizer_version: 0,
                weighting_version: IndexMeta::current().weighting_version,
            }),
        };
        store
            .commit(&IndexCommit {
                weights: Some(weights.clone()),
                ..Default::default()
            })
            .await
            .unwrap();

        let report = run(&store, tmp.path(), SyncOptions::default()).await;
        assert_eq!(report.updated, 2);
        assert!(report.recomputed);
        assert_eq!(
            store.get_index_meta().await.unwrap(),
            Some(IndexMeta::current())
        );

        // A weighting-only mismatch recomputes without re-reading files.
        weights.meta = Some(IndexMeta {
            tokenizer_version: IndexMeta::current().tokenizer_version,
            weighting_version: 0,
        });
        store
            .commit(&IndexCommit {
                weights: Some(weights),
                ..Default::default()
            })
            .await
            .unwrap();
        let report = run(&store, tmp.path(), SyncOptions::default()).await;
        assert_eq!(report.unchanged, 2);
        assert!(report.recomputed && report.committed);
    }

    #[tokio::test]
    async fn test_full_option_rereads() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.md", "apple banana", 1_000);

        let store = InMemoryStore::new();
        run(&store, tmp.path(), SyncOptions::default()).await;
        let report = run(
            &store,
            tmp.path(),
            SyncOptions {
                full: true,
                ..Default::default()
            },
        )
        .await;
        assert_eq!(report.updated, 1);
        assert!(report.recomputed);
    }

    #[tokio::test]
    async fn test_keep_content_off() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.md", "apple banana", 1_000);

        let store = InMemoryStore::new();
        run(
            &store,
            tmp.path(),
            SyncOptions {
                keep_content: false,
                ..Default::default()
            },
        )
        .await;
        let doc = store.get_document("file://a.md").await.unwrap().unwrap();
        assert_eq!(doc.raw_content, None);
        assert_eq!(doc.language.as_deref(), Some("markdown"));
    }
}
