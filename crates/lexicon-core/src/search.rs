//! Search entry point over a [`DocumentStore`].
//!
//! The search path only reads. It loads one committed [`IndexSnapshot`]
//! (with stored content when the caller wants content, so snippets come from
//! the same commit as the scores), runs [`check_snapshot`] over it, applies
//! path/extension/language filters, weights the query with the snapshot's
//! IDF table, ranks, and attaches content.
//!
//! [`check_snapshot`] costs one comparison per document. The full
//! recomputation in [`verify_snapshot`] costs as much as rebuilding every
//! magnitude and only runs when [`SearchOptions::verify`] is set.
//!
//! # Outcomes
//!
//! | Situation | Result |
//! |-----------|--------|
//! | Nothing indexed | `Err(IndexError::NotIndexed)` |
//! | Snapshot violates an invariant | `Err(IndexError::Inconsistent)` (logged) |
//! | Filters exclude every document | `Ok`, empty `results`, `candidates == 0` |
//! | Empty or unknown-term query | `Ok`, empty `results` |

use std::collections::HashMap;

use serde::Serialize;

use crate::error::IndexError;
use crate::index::document_vector;
use crate::models::{IndexMeta, IndexSnapshot, SnapshotDocument};
use crate::query::process_query;
use crate::rank::{rank, RankOptions};
use crate::store::DocumentStore;
use crate::tokenize::tokenize;

/// Relative tolerance when checking stored magnitudes against recomputed ones.
const MAGNITUDE_TOLERANCE: f64 = 1e-6;

/// Longest snippet returned in [`ContentMode::Snippet`], in characters.
pub const SNIPPET_MAX_CHARS: usize = 480;

/// Candidate filters. Empty filters match every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    /// File extensions without the dot, compared case-insensitively.
    pub extensions: Vec<String>,
    /// Only documents under this directory (or exactly this file). Matched
    /// on whole path components, so `src` does not match `srcgen/`.
    pub path_prefix: Option<String>,
    /// Only documents classified as this language (case-insensitive).
    pub language: Option<String>,
}

impl SearchFilters {
    pub fn matches(&self, doc: &SnapshotDocument) -> bool {
        if !self.extensions.is_empty() {
            let ext = doc
                .path
                .rsplit_once('.')
                .map(|(_, ext)| ext)
                .filter(|ext| !ext.contains('/'));
            let wanted = match ext {
                Some(ext) => self
                    .extensions
                    .iter()
                    .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext)),
                None => false,
            };
            if !wanted {
                return false;
            }
        }

        if let Some(prefix) = &self.path_prefix {
            if !under_prefix(&doc.path, prefix) {
                return false;
            }
        }

        if let Some(lang) = &self.language {
            match &doc.language {
                Some(l) if l.eq_ignore_ascii_case(lang) => {}
                _ => return false,
            }
        }

        true
    }
}

fn under_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_start_matches("./").trim_end_matches('/');
    if prefix.is_empty() || prefix == "." {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// How much document content to attach to each hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentMode {
    #[default]
    Omit,
    /// A few lines around the first matched term.
    Snippet,
    /// The full stored content.
    Full,
}

/// All inputs for one search besides the query text.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub rank: RankOptions,
    pub filters: SearchFilters,
    pub content: ContentMode,
    /// Recompute every magnitude and check it against the stored one
    /// before ranking.
    pub verify: bool,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub path: String,
    pub score: f64,
    pub matched_terms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// The caller-facing search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
    /// Documents in the corpus, before filters.
    pub total_indexed: usize,
    /// Documents left after filters.
    pub candidates: usize,
}

/// Run a search against a corpus's store.
///
/// This is the shared implementation behind the CLI and any embedding
/// application.
pub async fn search<S>(
    store: &S,
    query: &str,
    options: &SearchOptions,
) -> Result<SearchResponse, IndexError>
where
    S: DocumentStore + ?Sized,
{
    let snapshot = store
        .load_snapshot(options.content != ContentMode::Omit)
        .await?;
    if snapshot.is_empty() {
        return Err(IndexError::NotIndexed);
    }

    let checked = if options.verify {
        verify_snapshot(&snapshot)
    } else {
        check_snapshot(&snapshot)
    };
    if let Err(reason) = checked {
        tracing::error!(%reason, "index invariant violated");
        return Err(IndexError::Inconsistent(reason));
    }

    let candidates: Vec<&SnapshotDocument> = snapshot
        .documents
        .iter()
        .filter(|doc| options.filters.matches(doc))
        .collect();

    let mut response = SearchResponse {
        query: query.to_string(),
        results: Vec::new(),
        total_indexed: snapshot.len(),
        candidates: candidates.len(),
    };

    if candidates.is_empty() {
        tracing::debug!(total = snapshot.len(), "filters excluded every document");
        return Ok(response);
    }

    let query_vec = process_query(query, &snapshot.idf);
    let ranked = rank(
        &query_vec,
        candidates.iter().copied(),
        &snapshot.idf,
        &options.rank,
    );

    let by_id: HashMap<&str, &SnapshotDocument> =
        candidates.iter().map(|d| (d.id.as_str(), *d)).collect();

    for hit in ranked {
        let Some(doc) = by_id.get(hit.id.as_str()) else {
            continue;
        };

        let content = match options.content {
            ContentMode::Omit => None,
            ContentMode::Full => doc.raw_content.clone(),
            ContentMode::Snippet => doc
                .raw_content
                .as_deref()
                .map(|raw| extract_snippet(raw, &hit.matched_terms, SNIPPET_MAX_CHARS)),
        };

        response.results.push(SearchHit {
            id: hit.id,
            path: doc.path.clone(),
            score: hit.score,
            matched_terms: hit.matched_terms,
            language: doc.language.clone(),
            content,
        });
    }

    tracing::debug!(
        query,
        hits = response.results.len(),
        candidates = response.candidates,
        "search complete"
    );
    Ok(response)
}

/// Cheap structural checks: policy versions match this build, and every
/// document has a vector covering exactly its stored terms.
///
/// Returns a description of the first violation found.
pub fn check_snapshot(snapshot: &IndexSnapshot) -> Result<(), String> {
    let current = IndexMeta::current();
    match snapshot.meta {
        Some(meta) if meta == current => {}
        Some(meta) => {
            return Err(format!(
                "index built with tokenizer v{} / weighting v{}, this build uses v{} / v{}",
                meta.tokenizer_version,
                meta.weighting_version,
                current.tokenizer_version,
                current.weighting_version
            ))
        }
        None => return Err("index metadata missing".to_string()),
    }

    for doc in &snapshot.documents {
        let Some(stored) = doc.vector else {
            return Err(format!("document {} has no vector", doc.id));
        };
        if stored.term_count as usize != doc.terms.len() {
            return Err(format!(
                "vector of {} covers {} terms, document has {}",
                doc.id,
                stored.term_count,
                doc.terms.len()
            ));
        }
    }

    Ok(())
}

/// [`check_snapshot`] plus a full recomputation: every term is in the IDF
/// table and every stored magnitude matches the one the IDF table implies.
pub fn verify_snapshot(snapshot: &IndexSnapshot) -> Result<(), String> {
    check_snapshot(snapshot)?;

    for doc in &snapshot.documents {
        let Some(stored) = doc.vector else {
            continue;
        };

        if let Some(term) = doc.terms.keys().find(|t| !snapshot.idf.contains_key(*t)) {
            return Err(format!(
                "term '{}' of document {} missing from IDF table",
                term, doc.id
            ));
        }

        let expected = document_vector(&doc.terms, &snapshot.idf);
        let diff = (expected.magnitude - stored.magnitude).abs();
        if diff > MAGNITUDE_TOLERANCE * expected.magnitude.max(1.0) {
            return Err(format!(
                "stale magnitude for {}: stored {:.6}, expected {:.6}",
                doc.id, stored.magnitude, expected.magnitude
            ));
        }
    }

    Ok(())
}

/// Extract a few lines of `content` around the first line containing any of
/// `terms`, truncated to `max_chars` characters.
///
/// Falls back to the start of the content when no line matches.
pub fn extract_snippet(content: &str, terms: &[String], max_chars: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    if lines.is_empty() {
        return String::new();
    }

    let hit = lines
        .iter()
        .position(|line| {
            let line_terms = tokenize(line);
            terms.iter().any(|t| line_terms.contains(t))
        })
        .unwrap_or(0);

    let start = hit.saturating_sub(1);
    let end = (hit + 2).min(lines.len());
    let snippet = lines[start..end].join("\n");

    if snippet.chars().count() > max_chars {
        snippet.chars().take(max_chars).collect()
    } else {
        snippet
    }
}
