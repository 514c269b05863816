//! In-memory [`DocumentStore`] implementation for tests, WASM targets, and
//! the explicit in-memory storage fallback.
//!
//! All state sits behind a single `std::sync::RwLock`, so a commit is one
//! write-locked critical section and a snapshot is one read-locked copy.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::error::IndexError;
use crate::models::{
    Document, DocumentVector, Fingerprint, IdfTable, IndexCommit, IndexMeta, IndexSnapshot,
    SnapshotDocument, TermFrequencies,
};

use super::DocumentStore;

#[derive(Default)]
struct State {
    docs: BTreeMap<String, Document>,
    terms: HashMap<String, TermFrequencies>,
    vectors: HashMap<String, DocumentVector>,
    idf: IdfTable,
    meta: Option<IndexMeta>,
    generation: u64,
}

impl State {
    fn remove(&mut self, id: &str) {
        self.docs.remove(id);
        self.terms.remove(id);
        self.vectors.remove(id);
    }
}

/// In-memory store. Contents vanish when the process exits.
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn non_zero(terms: &TermFrequencies) -> TermFrequencies {
    terms
        .iter()
        .filter(|(_, &c)| c > 0)
        .map(|(t, &c)| (t.clone(), c))
        .collect()
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get_all_documents(&self) -> Result<Vec<Document>> {
        Ok(self.read()?.docs.values().cloned().collect())
    }

    async fn list_fingerprints(&self) -> Result<Vec<Fingerprint>> {
        Ok(self.read()?.docs.values().map(Fingerprint::from).collect())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.read()?.docs.get(id).cloned())
    }

    async fn upsert_document(&self, doc: &Document) -> Result<()> {
        self.write()?.docs.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        self.write()?.remove(id);
        Ok(())
    }

    async fn set_term_frequencies(&self, doc_id: &str, terms: &TermFrequencies) -> Result<()> {
        self.write()?
            .terms
            .insert(doc_id.to_string(), non_zero(terms));
        Ok(())
    }

    async fn get_term_frequencies(&self, doc_id: &str) -> Result<TermFrequencies> {
        Ok(self.read()?.terms.get(doc_id).cloned().unwrap_or_default())
    }

    async fn get_all_term_frequencies(&self) -> Result<HashMap<String, TermFrequencies>> {
        Ok(self.read()?.terms.clone())
    }

    async fn set_idf_table(&self, idf: &IdfTable) -> Result<()> {
        self.write()?.idf = idf.clone();
        Ok(())
    }

    async fn get_idf_table(&self) -> Result<IdfTable> {
        Ok(self.read()?.idf.clone())
    }

    async fn set_document_vector(&self, doc_id: &str, vector: DocumentVector) -> Result<()> {
        self.write()?.vectors.insert(doc_id.to_string(), vector);
        Ok(())
    }

    async fn get_all_document_vectors(&self) -> Result<HashMap<String, DocumentVector>> {
        Ok(self.read()?.vectors.clone())
    }

    async fn get_index_meta(&self) -> Result<Option<IndexMeta>> {
        Ok(self.read()?.meta)
    }

    async fn document_count(&self) -> Result<usize> {
        Ok(self.read()?.docs.len())
    }

    async fn generation(&self) -> Result<u64> {
        Ok(self.read()?.generation)
    }

    async fn commit(&self, commit: &IndexCommit) -> Result<()> {
        let mut state = self.write()?;

        if let Some(expected) = commit.base_generation {
            if expected != state.generation {
                return Err(IndexError::Conflict {
                    expected,
                    found: state.generation,
                }
                .into());
            }
        }
        if commit.is_empty() {
            return Ok(());
        }
        state.generation += 1;

        for id in &commit.removed {
            state.remove(id);
        }
        for indexed in &commit.upserts {
            let id = indexed.document.id.clone();
            state.docs.insert(id.clone(), indexed.document.clone());
            state.terms.insert(id, non_zero(&indexed.terms));
        }
        for touch in &commit.touched {
            if let Some(doc) = state.docs.get_mut(&touch.id) {
                doc.mtime = touch.mtime;
                doc.content_hash = touch.content_hash.clone();
            }
        }
        if let Some(weights) = &commit.weights {
            state.idf = weights.idf.clone();
            state.vectors = weights.vectors.clone();
            state.meta = weights.meta;
        }
        Ok(())
    }

    async fn load_snapshot(&self, with_content: bool) -> Result<IndexSnapshot> {
        let state = self.read()?;
        let documents = state
            .docs
            .values()
            .map(|doc| SnapshotDocument {
                id: doc.id.clone(),
                path: doc.path.clone(),
                language: doc.language.clone(),
                terms: state.terms.get(&doc.id).cloned().unwrap_or_default(),
                vector: state.vectors.get(&doc.id).copied(),
                raw_content: if with_content {
                    doc.raw_content.clone()
                } else {
                    None
                },
            })
            .collect();

        Ok(IndexSnapshot {
            idf: state.idf.clone(),
            documents,
            meta: state.meta,
        })
    }

    async fn clear(&self) -> Result<()> {
        let mut state = self.write()?;
        let generation = state.generation + 1;
        *state = State {
            generation,
            ..State::default()
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CorpusWeights, IndexedDocument};
    use crate::tokenize::term_counts;

    fn doc(id: &str, body: &str) -> Document {
        Document {
            id: format!("file://{}", id),
            path: id.to_string(),
            content_hash: crate::models::content_hash(body.as_bytes()),
            mtime: 1_700_000_000,
            language: Some("rust".to_string()),
            raw_content: Some(body.to_string()),
        }
    }

    #[tokio::test]
    async fn test_document_round_trip() {
        let store = InMemoryStore::new();
        let d = doc("src/lib.rs", "pub mod index;");
        store.upsert_document(&d).await.unwrap();
        assert_eq!(store.get_document(&d.id).await.unwrap(), Some(d.clone()));
        assert_eq!(store.document_count().await.unwrap(), 1);

        store.delete_document(&d.id).await.unwrap();
        assert_eq!(store.get_document(&d.id).await.unwrap(), None);
        // deleting twice is fine
        store.delete_document(&d.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_term_frequencies_round_trip() {
        let store = InMemoryStore::new();
        let terms = term_counts("alpha beta beta");
        store.set_term_frequencies("d1", &terms).await.unwrap();
        assert_eq!(store.get_term_frequencies("d1").await.unwrap(), terms);
        assert!(store.get_term_frequencies("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_counts_not_stored() {
        let store = InMemoryStore::new();
        let mut terms = TermFrequencies::new();
        terms.insert("kept".to_string(), 2);
        terms.insert("dropped".to_string(), 0);
        store.set_term_frequencies("d1", &terms).await.unwrap();
        let stored = store.get_term_frequencies("d1").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored.contains_key("kept"));
    }

    #[tokio::test]
    async fn test_idf_and_vectors_round_trip() {
        let store = InMemoryStore::new();
        let mut idf = IdfTable::new();
        idf.insert("apple".to_string(), 1.69);
        store.set_idf_table(&idf).await.unwrap();
        assert_eq!(store.get_idf_table().await.unwrap(), idf);

        let v = DocumentVector {
            magnitude: 2.5,
            term_count: 3,
        };
        store.set_document_vector("d1", v).await.unwrap();
        assert_eq!(store.get_all_document_vectors().await.unwrap()["d1"], v);
    }

    #[tokio::test]
    async fn test_commit_and_snapshot() {
        let store = InMemoryStore::new();
        let a = doc("a.rs", "apple banana");
        let b = doc("b.rs", "banana cherry");

        let mut vectors = HashMap::new();
        vectors.insert(
            a.id.clone(),
            DocumentVector {
                magnitude: 1.0,
                term_count: 2,
            },
        );
        vectors.insert(
            b.id.clone(),
            DocumentVector {
                magnitude: 2.0,
                term_count: 2,
            },
        );

        let commit = IndexCommit {
            upserts: vec![
                IndexedDocument {
                    document: a.clone(),
                    terms: term_counts("apple banana"),
                },
                IndexedDocument {
                    document: b.clone(),
                    terms: term_counts("banana cherry"),
                },
            ],
            weights: Some(CorpusWeights {
                idf: IdfTable::from([("banana".to_string(), 1.0)]),
                vectors,
                meta: Some(IndexMeta::current()),
            }),
            ..Default::default()
        };
        store.commit(&commit).await.unwrap();

        let snap = store.load_snapshot(false).await.unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.documents[0].id, a.id);
        assert_eq!(snap.documents[1].vector.unwrap().magnitude, 2.0);
        assert_eq!(snap.meta, Some(IndexMeta::current()));
        assert_eq!(store.get_all_documents().await.unwrap().len(), 2);

        let removal = IndexCommit {
            removed: vec![b.id.clone()],
            ..Default::default()
        };
        store.commit(&removal).await.unwrap();
        let snap = store.load_snapshot(false).await.unwrap();
        assert_eq!(snap.len(), 1);
        assert!(store.get_term_frequencies(&b.id).await.unwrap().is_empty());

        let touch = IndexCommit {
            touched: vec![Fingerprint {
                mtime: a.mtime + 60,
                ..Fingerprint::from(&a)
            }],
            ..Default::default()
        };
        store.commit(&touch).await.unwrap();
        let fps = store.list_fingerprints().await.unwrap();
        assert_eq!(fps.len(), 1);
        assert_eq!(fps[0].mtime, a.mtime + 60);
        let stored = store.get_document(&a.id).await.unwrap().unwrap();
        assert_eq!(stored.raw_content, a.raw_content);
        // weights untouched by a commit without weights
        let snap = store.load_snapshot(false).await.unwrap();
        assert_eq!(snap.meta, Some(IndexMeta::current()));
        assert_eq!(snap.documents[0].vector.unwrap().magnitude, 1.0);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = InMemoryStore::new();
        store.upsert_document(&doc("x.md", "x")).await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.document_count().await.unwrap(), 0);
        assert!(store.load_snapshot(false).await.unwrap().is_empty());
        assert_eq!(store.generation().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_content_is_opt_in() {
        let store = InMemoryStore::new();
        let a = doc("a.rs", "apple banana");
        store
            .commit(&IndexCommit {
                upserts: vec![IndexedDocument {
                    document: a.clone(),
                    terms: term_counts("apple banana"),
                }],
                ..Default::default()
            })
            .await
            .unwrap();

        let bare = store.load_snapshot(false).await.unwrap();
        assert_eq!(bare.documents[0].raw_content, None);
        let full = store.load_snapshot(true).await.unwrap();
        assert_eq!(full.documents[0].raw_content, a.raw_content);
    }

    #[tokio::test]
    async fn test_commit_rejected_when_generation_moved() {
        let store = InMemoryStore::new();
        assert_eq!(store.generation().await.unwrap(), 0);

        let base = store.generation().await.unwrap();
        let first = IndexCommit {
            upserts: vec![IndexedDocument {
                document: doc("a.rs", "apple"),
                terms: term_counts("apple"),
            }],
            base_generation: Some(base),
            ..Default::default()
        };
        let second = IndexCommit {
            upserts: vec![IndexedDocument {
                document: doc("b.rs", "banana"),
                terms: term_counts("banana"),
            }],
            base_generation: Some(base),
            ..Default::default()
        };

        store.commit(&first).await.unwrap();
        assert_eq!(store.generation().await.unwrap(), 1);

        let err = store.commit(&second).await.unwrap_err();
        assert!(matches!(
            IndexError::from_store(err),
            IndexError::Conflict {
                expected: 0,
                found: 1
            }
        ));
        assert!(store.get_document("file://b.rs").await.unwrap().is_none());
        assert_eq!(store.generation().await.unwrap(), 1);
    }
}
