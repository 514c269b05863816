//! Cosine-similarity ranking over a committed index snapshot.
//!
//! # Algorithm
//!
//! 1. For each candidate document, take the sparse dot product of the query
//!    vector with the document's weights, visiting only query terms the
//!    document contains.
//! 2. Divide by `‖q‖ × ‖d‖`; either magnitude being 0 yields 0.
//! 3. Multiply nonzero similarities by the configured boosts.
//! 4. Drop scores below `max(min_score, SCORE_EPSILON)`.
//! 5. Sort by score (desc), then id (asc), and truncate to `limit`.

use std::cmp::Ordering;

use serde::Serialize;

use crate::index::tf_weight;
use crate::models::{IdfTable, SnapshotDocument};
use crate::query::QueryVector;
use crate::tokenize::tokenize;

/// Floor for the minimum-score threshold, so true zero matches are always
/// excluded even when callers pass `min_score = 0`.
pub const SCORE_EPSILON: f64 = 1e-9;

/// Multiplicative score boosts. A factor of `1.0` disables a boost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostConfig {
    /// Applied when a matched query term also appears in the document path.
    pub path_match: f64,
    /// Applied when a multi-term query matches every one of its terms.
    pub full_coverage: f64,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            path_match: 1.25,
            full_coverage: 1.10,
        }
    }
}

impl BoostConfig {
    /// Boosts that leave raw cosine similarity untouched.
    pub fn none() -> Self {
        Self {
            path_match: 1.0,
            full_coverage: 1.0,
        }
    }
}

/// Ranking parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankOptions {
    pub limit: usize,
    pub min_score: f64,
    pub boosts: BoostConfig,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            min_score: 0.0,
            boosts: BoostConfig::default(),
        }
    }
}

/// One ranked document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDocument {
    pub id: String,
    pub score: f64,
    /// Query terms present in the document, in lexical order.
    pub matched_terms: Vec<String>,
}

/// `dot / (‖q‖ × ‖d‖)`, defined as 0 when either magnitude is 0.
pub fn cosine_similarity(dot: f64, query_magnitude: f64, doc_magnitude: f64) -> f64 {
    let denom = query_magnitude * doc_magnitude;
    if query_magnitude <= 0.0 || doc_magnitude <= 0.0 || !denom.is_finite() || denom == 0.0 {
        return 0.0;
    }
    let sim = dot / denom;
    if sim.is_finite() {
        sim
    } else {
        0.0
    }
}

/// Score a single document against the query, before boosts.
///
/// Returns the raw cosine similarity and the matched terms.
pub fn score_document(
    query: &QueryVector,
    doc: &SnapshotDocument,
    idf: &IdfTable,
) -> (f64, Vec<String>) {
    let mut dot = 0.0;
    let mut matched = Vec::new();

    for (term, &query_weight) in &query.weights {
        let count = match doc.terms.get(term) {
            Some(&c) if c > 0 => c,
            _ => continue,
        };
        let idf_weight = idf.get(term).copied().unwrap_or(0.0);
        dot += query_weight * tf_weight(count) * idf_weight;
        matched.push(term.clone());
    }

    let magnitude = doc.vector.map(|v| v.magnitude).unwrap_or(0.0);
    (cosine_similarity(dot, query.magnitude, magnitude), matched)
}

fn apply_boosts(
    score: f64,
    query: &QueryVector,
    doc: &SnapshotDocument,
    matched: &[String],
    boosts: &BoostConfig,
) -> f64 {
    let mut boosted = score;

    if boosts.path_match != 1.0 {
        let path_terms = tokenize(&doc.path);
        if matched.iter().any(|t| path_terms.contains(t)) {
            boosted *= boosts.path_match;
        }
    }

    if boosts.full_coverage != 1.0
        && query.weights.len() > 1
        && matched.len() == query.weights.len()
    {
        boosted *= boosts.full_coverage;
    }

    boosted
}

/// Rank `docs` against `query`.
///
/// An empty query vector produces an empty result list.
pub fn rank<'a, I>(
    query: &QueryVector,
    docs: I,
    idf: &IdfTable,
    options: &RankOptions,
) -> Vec<RankedDocument>
where
    I: IntoIterator<Item = &'a SnapshotDocument>,
{
    if query.is_empty() || options.limit == 0 {
        return Vec::new();
    }

    let threshold = options.min_score.max(SCORE_EPSILON);

    let mut ranked: Vec<RankedDocument> = docs
        .into_iter()
        .filter_map(|doc| {
            let (raw, matched) = score_document(query, doc, idf);
            if raw <= 0.0 {
                return None;
            }
            let score = apply_boosts(raw, query, doc, &matched, &options.boosts);
            if score < threshold {
                return None;
            }
            Some(RankedDocument {
                id: doc.id.clone(),
                score,
                matched_terms: matched,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked.truncate(options.limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;
    use crate::query::process_query;
    use crate::tokenize::term_counts;

    fn snapshot(texts: &[(&str, &str)]) -> (IdfTable, Vec<SnapshotDocument>) {
        let counts: Vec<(String, _)> = texts
            .iter()
            .map(|(id, text)| (id.to_string(), term_counts(text)))
            .collect();
        let built = build_index(counts.iter().map(|(id, t)| (id.as_str(), t)));
        let docs = counts
            .into_iter()
            .map(|(id, terms)| SnapshotDocument {
                vector: built.vectors.get(&id).copied(),
                path: id.clone(),
                id,
                language: None,
                terms,
                raw_content: None,
            })
            .collect();
        (built.idf, docs)
    }

    fn plain(limit: usize) -> RankOptions {
        RankOptions {
            limit,
            min_score: 0.0,
            boosts: BoostConfig::none(),
        }
    }

    #[test]
    fn test_cosine_zero_magnitudes() {
        assert_eq!(cosine_similarity(1.0, 0.0, 1.0), 0.0);
        assert_eq!(cosine_similarity(1.0, 1.0, 0.0), 0.0);
        assert_eq!(cosine_similarity(0.0, 0.0, 0.0), 0.0);
        assert!(!cosine_similarity(1.0, f64::MIN_POSITIVE, f64::MIN_POSITIVE).is_nan());
    }

    #[test]
    fn test_apple_ranks_doc_a_first() {
        let (idf, docs) = snapshot(&[("docA", "apple banana"), ("docB", "banana cherry")]);
        let q = process_query("apple", &idf);
        let ranked = rank(&q, &docs, &idf, &plain(10));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, "docA");
        assert_eq!(ranked[0].matched_terms, vec!["apple"]);
    }

    #[test]
    fn test_identical_single_term_document_matches() {
        let (idf, docs) = snapshot(&[("only", "tokenizer")]);
        let q = process_query("tokenizer", &idf);
        let ranked = rank(&q, &docs, &idf, &plain(10));
        assert_eq!(ranked.len(), 1);
        assert!((ranked[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_magnitude_document_never_returned() {
        let (idf, docs) = snapshot(&[("punct", "!!! ... ---"), ("words", "hello world")]);
        let q = process_query("hello", &idf);
        let (raw, _) = score_document(&q, &docs[0], &idf);
        assert_eq!(raw, 0.0);
        let ranked = rank(&q, &docs, &idf, &plain(10));
        assert!(ranked.iter().all(|r| r.id != "punct"));
    }

    #[test]
    fn test_empty_query_empty_results() {
        let (idf, docs) = snapshot(&[("a", "apple")]);
        let q = process_query("", &idf);
        assert!(rank(&q, &docs, &idf, &plain(10)).is_empty());
        let q = process_query("???", &idf);
        assert!(rank(&q, &docs, &idf, &plain(10)).is_empty());
    }

    #[test]
    fn test_limit_and_tie_break() {
        let (idf, docs) = snapshot(&[
            ("e", "shared"),
            ("c", "shared"),
            ("a", "shared"),
            ("d", "shared"),
            ("b", "shared"),
        ]);
        let q = process_query("shared", &idf);
        let ranked = rank(&q, &docs, &idf, &plain(2));
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, "a");
        assert_eq!(ranked[1].id, "b");
    }

    #[test]
    fn test_higher_scores_survive_cap() {
        let (idf, docs) = snapshot(&[
            ("weak1", "parser lexer lexer lexer lexer"),
            ("strong", "parser"),
            ("weak2", "parser grammar grammar grammar"),
            ("mid", "parser lexer"),
            ("weak3", "parser token token token token token"),
        ]);
        let q = process_query("parser", &idf);
        let all = rank(&q, &docs, &idf, &plain(10));
        let top = rank(&q, &docs, &idf, &plain(2));
        assert_eq!(all.len(), 5);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, "strong");
        assert_eq!(top, all[..2].to_vec());
    }

    #[test]
    fn test_deterministic() {
        let (idf, docs) = snapshot(&[
            ("x", "alpha beta"),
            ("y", "beta gamma"),
            ("z", "alpha gamma"),
        ]);
        let q = process_query("alpha gamma", &idf);
        let first = rank(&q, &docs, &idf, &RankOptions::default());
        let second = rank(&q, &docs, &idf, &RankOptions::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_min_score_threshold() {
        let (idf, docs) = snapshot(&[("a", "apple banana cherry date"), ("b", "apple")]);
        let q = process_query("apple", &idf);
        let all = rank(&q, &docs, &idf, &plain(10));
        assert_eq!(all.len(), 2);
        let cutoff = (all[0].score + all[1].score) / 2.0;
        let opts = RankOptions {
            min_score: cutoff,
            ..plain(10)
        };
        let filtered = rank(&q, &docs, &idf, &opts);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "b");
    }

    #[test]
    fn test_path_boost() {
        let (idf, mut docs) = snapshot(&[("1", "config loader"), ("2", "config loader")]);
        docs[0].path = "src/util.rs".to_string();
        docs[1].path = "src/config.rs".to_string();
        let q = process_query("config", &idf);
        let opts = RankOptions {
            boosts: BoostConfig {
                path_match: 1.5,
                full_coverage: 1.0,
            },
            ..plain(10)
        };
        let ranked = rank(&q, &docs, &idf, &opts);
        assert_eq!(ranked[0].id, "2");
        assert!((ranked[0].score / ranked[1].score - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_coverage_boost_multi_term_only() {
        let (idf, docs) = snapshot(&[("both", "alpha beta"), ("one", "alpha")]);
        let boosts = BoostConfig {
            path_match: 1.0,
            full_coverage: 2.0,
        };
        let opts = RankOptions {
            boosts,
            ..plain(10)
        };

        let single = process_query("alpha", &idf);
        let unboosted = rank(&single, &docs, &idf, &plain(10));
        let boosted = rank(&single, &docs, &idf, &opts);
        assert_eq!(unboosted, boosted);

        let multi = process_query("alpha beta", &idf);
        let raw = rank(&multi, &docs, &idf, &plain(10));
        let with = rank(&multi, &docs, &idf, &opts);
        let raw_both = raw.iter().find(|r| r.id == "both").unwrap().score;
        let with_both = with.iter().find(|r| r.id == "both").unwrap().score;
        assert!((with_both - 2.0 * raw_both).abs() < 1e-9);
    }
}
