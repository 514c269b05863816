//! Core data models shared by the index builder, the ranker, and every
//! [`DocumentStore`](crate::store::DocumentStore) backend.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Raw occurrence counts of each term within one document.
///
/// A `BTreeMap` keeps iteration order stable so that magnitudes summed over
/// the same counts are bit-identical between runs.
pub type TermFrequencies = BTreeMap<String, u32>;

/// Corpus-wide inverse-document-frequency weight per term.
pub type IdfTable = HashMap<String, f64>;

/// One indexable unit: a source file or a knowledge markdown file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable URI, unique per corpus (e.g. `file://src/main.rs`).
    pub id: String,
    /// Path relative to the corpus root.
    pub path: String,
    /// SHA-256 hex digest of the raw content.
    pub content_hash: String,
    /// Last-modified time in Unix nanoseconds. Whole seconds are too coarse
    /// to tell apart two writes within the same second.
    pub mtime: i64,
    /// Language classification, used for filtering only.
    pub language: Option<String>,
    /// Full text, retained when the corpus keeps content for snippets.
    pub raw_content: Option<String>,
}

/// The fields the maintainer compares against the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub id: String,
    pub path: String,
    pub content_hash: String,
    /// Unix nanoseconds, as in [`Document::mtime`].
    pub mtime: i64,
}

impl From<&Document> for Fingerprint {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            path: doc.path.clone(),
            content_hash: doc.content_hash.clone(),
            mtime: doc.mtime,
        }
    }
}

pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Truncate a nanosecond mtime to whole Unix seconds, for display.
pub fn mtime_seconds(mtime: i64) -> i64 {
    mtime.div_euclid(NANOS_PER_SEC)
}

/// Derived per-document data needed to normalize cosine similarity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentVector {
    /// L2 norm of the document's TF-IDF weighted term vector.
    pub magnitude: f64,
    /// Number of distinct terms in the document.
    pub term_count: u32,
}

/// Versions of the tokenization and weighting policies an index was built with.
///
/// Stored with every commit. An index built under different versions must be
/// rebuilt before it can be queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub tokenizer_version: u32,
    pub weighting_version: u32,
}

impl IndexMeta {
    /// The versions implemented by this build.
    pub fn current() -> Self {
        Self {
            tokenizer_version: crate::tokenize::TOKENIZER_VERSION,
            weighting_version: crate::index::WEIGHTING_VERSION,
        }
    }
}

/// A document with its term counts, as written by a maintenance pass.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedDocument {
    pub document: Document,
    pub terms: TermFrequencies,
}

/// One atomic maintenance write.
///
/// Backends must apply every field in a single transaction (or under a
/// single lock) so queries never observe an IDF table that disagrees with
/// the document vectors.
#[derive(Debug, Clone, Default)]
pub struct IndexCommit {
    /// New or re-tokenized documents; their term counts are replaced.
    pub upserts: Vec<IndexedDocument>,
    /// Documents whose content is unchanged but whose mtime moved. Only
    /// `mtime` is written; content and term counts stay as they are.
    pub touched: Vec<Fingerprint>,
    /// Document ids to delete together with their term counts and vectors.
    pub removed: Vec<String>,
    /// Replacement IDF table and vectors for the whole corpus.
    ///
    /// `None` when the pass only touched metadata and the previous
    /// weights remain valid.
    pub weights: Option<CorpusWeights>,
    /// Store generation the pass read before computing this commit. The
    /// store rejects the commit with [`IndexError::Conflict`] if another
    /// commit landed in between. `None` commits unconditionally.
    ///
    /// [`IndexError::Conflict`]: crate::IndexError::Conflict
    pub base_generation: Option<u64>,
}

impl IndexCommit {
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty()
            && self.touched.is_empty()
            && self.removed.is_empty()
            && self.weights.is_none()
    }
}

/// Full replacement of the corpus-level weights.
#[derive(Debug, Clone, Default)]
pub struct CorpusWeights {
    pub idf: IdfTable,
    pub vectors: HashMap<String, DocumentVector>,
    pub meta: Option<IndexMeta>,
}

/// Everything the ranker needs for one document.
#[derive(Debug, Clone)]
pub struct SnapshotDocument {
    pub id: String,
    pub path: String,
    pub language: Option<String>,
    pub terms: TermFrequencies,
    pub vector: Option<DocumentVector>,
    /// Stored content, read in the same view as everything else. Only
    /// filled when the snapshot is loaded with content.
    pub raw_content: Option<String>,
}

/// A consistent, read-only view of one committed index.
#[derive(Debug, Clone, Default)]
pub struct IndexSnapshot {
    pub idf: IdfTable,
    pub documents: Vec<SnapshotDocument>,
    pub meta: Option<IndexMeta>,
}

impl IndexSnapshot {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Compute the SHA-256 hex digest used as a document's `content_hash`.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_stable() {
        let a = content_hash(b"fn main() {}");
        let b = content_hash(b"fn main() {}");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, content_hash(b"fn main() { }"));
    }

    #[test]
    fn test_empty_commit() {
        assert!(IndexCommit::default().is_empty());
        let commit = IndexCommit {
            removed: vec!["file://a.rs".to_string()],
            ..Default::default()
        };
        assert!(!commit.is_empty());
    }
}
