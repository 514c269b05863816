//! TF-IDF index builder.
//!
//! Pure functions that turn per-document term counts into a corpus-wide
//! IDF table and per-document vector magnitudes. The incremental maintainer
//! calls [`build_index`] over the full post-change corpus on every mutating
//! pass, so a from-scratch build and an incremental update run the exact same
//! arithmetic.
//!
//! # Weighting
//!
//! | Quantity | Formula |
//! |----------|---------|
//! | term frequency | `tf(c) = 1 + ln(c)` for `c >= 1` |
//! | inverse document frequency | `idf(df) = ln((1 + N) / (1 + df)) + 1` |
//! | weight | `w(d, t) = tf(count(d, t)) × idf(df(t))` |
//! | magnitude | `‖d‖ = sqrt(Σ_t w(d, t)²)` |
//!
//! The smoothed IDF is strictly decreasing in `df` and always positive, so a
//! term present in every document (including a single-document corpus) still
//! contributes to similarity.

use std::collections::HashMap;

use crate::models::{DocumentVector, IdfTable, TermFrequencies};

/// Bumped whenever [`tf_weight`] or [`idf_weight`] change. Stored IDF tables
/// and magnitudes built under another version are recomputed by the
/// maintainer and rejected by search.
pub const WEIGHTING_VERSION: u32 = 1;

/// Output of a full index build.
#[derive(Debug, Clone, Default)]
pub struct BuiltIndex {
    pub idf: IdfTable,
    pub vectors: HashMap<String, DocumentVector>,
}

/// Sublinear term-frequency weight for a raw count.
pub fn tf_weight(count: u32) -> f64 {
    if count == 0 {
        0.0
    } else {
        1.0 + (count as f64).ln()
    }
}

/// Smoothed inverse document frequency for a term found in `df` of
/// `total_docs` documents.
pub fn idf_weight(df: usize, total_docs: usize) -> f64 {
    ((1.0 + total_docs as f64) / (1.0 + df as f64)).ln() + 1.0
}

/// Count, for every term, how many documents contain it.
pub fn document_frequencies<'a, I>(docs: I) -> HashMap<String, usize>
where
    I: IntoIterator<Item = &'a TermFrequencies>,
{
    let mut df: HashMap<String, usize> = HashMap::new();
    for terms in docs {
        for (term, &count) in terms {
            if count > 0 {
                *df.entry(term.clone()).or_insert(0) += 1;
            }
        }
    }
    df
}

/// Build the IDF table from document frequencies over `total_docs` documents.
///
/// Terms with zero document frequency never appear in the table.
pub fn compute_idf(df: &HashMap<String, usize>, total_docs: usize) -> IdfTable {
    df.iter()
        .filter(|(_, &n)| n > 0)
        .map(|(term, &n)| (term.clone(), idf_weight(n, total_docs)))
        .collect()
}

/// Compute a document's magnitude and distinct term count under `idf`.
///
/// Terms missing from `idf` contribute nothing. A document with no
/// recognized terms has magnitude 0.
pub fn document_vector(terms: &TermFrequencies, idf: &IdfTable) -> DocumentVector {
    let mut sum_sq = 0.0;
    let mut term_count = 0u32;
    for (term, &count) in terms {
        if count == 0 {
            continue;
        }
        term_count += 1;
        if let Some(&w) = idf.get(term) {
            let weight = tf_weight(count) * w;
            sum_sq += weight * weight;
        }
    }
    DocumentVector {
        magnitude: sum_sq.sqrt(),
        term_count,
    }
}

/// Build an index from scratch over `(document id, term counts)` pairs.
///
/// An empty corpus yields an empty index; callers decide what that means.
pub fn build_index<'a, I>(docs: I) -> BuiltIndex
where
    I: IntoIterator<Item = (&'a str, &'a TermFrequencies)>,
{
    let docs: Vec<(&str, &TermFrequencies)> = docs.into_iter().collect();
    if docs.is_empty() {
        return BuiltIndex::default();
    }

    let df = document_frequencies(docs.iter().map(|(_, terms)| *terms));
    let idf = compute_idf(&df, docs.len());

    let vectors = docs
        .iter()
        .map(|(id, terms)| (id.to_string(), document_vector(terms, &idf)))
        .collect();

    BuiltIndex { idf, vectors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::term_counts;

    fn corpus(texts: &[(&str, &str)]) -> Vec<(String, TermFrequencies)> {
        texts
            .iter()
            .map(|(id, text)| (id.to_string(), term_counts(text)))
            .collect()
    }

    fn build(docs: &[(String, TermFrequencies)]) -> BuiltIndex {
        build_index(docs.iter().map(|(id, t)| (id.as_str(), t)))
    }

    #[test]
    fn test_tf_weight() {
        assert_eq!(tf_weight(0), 0.0);
        assert!((tf_weight(1) - 1.0).abs() < 1e-12);
        assert!(tf_weight(10) > tf_weight(2));
        assert!(tf_weight(10) < 10.0);
    }

    #[test]
    fn test_idf_monotonic_decreasing() {
        let n = 50;
        let mut prev = f64::INFINITY;
        for df in 1..=n {
            let w = idf_weight(df, n);
            assert!(w < prev, "idf not decreasing at df={}", df);
            assert!(w > 0.0);
            prev = w;
        }
    }

    #[test]
    fn test_empty_corpus() {
        let index = build(&[]);
        assert!(index.idf.is_empty());
        assert!(index.vectors.is_empty());
    }

    #[test]
    fn test_rarer_terms_weigh_more() {
        let docs = corpus(&[
            ("a", "apple banana"),
            ("b", "banana cherry"),
            ("c", "banana"),
        ]);
        let index = build(&docs);
        assert!(index.idf["apple"] > index.idf["banana"]);
        assert!((index.idf["apple"] - index.idf["cherry"]).abs() < 1e-12);
        assert!(!index.idf.contains_key("durian"));
    }

    #[test]
    fn test_single_document_corpus_nonzero() {
        let docs = corpus(&[("only", "needle")]);
        let index = build(&docs);
        assert!(index.idf["needle"] > 0.0);
        assert!(index.vectors["only"].magnitude > 0.0);
    }

    #[test]
    fn test_magnitude_formula() {
        let docs = corpus(&[("a", "x x y"), ("b", "y z")]);
        let index = build(&docs);
        let wx = tf_weight(2) * index.idf["x"];
        let wy = tf_weight(1) * index.idf["y"];
        let expected = (wx * wx + wy * wy).sqrt();
        let v = index.vectors["a"];
        assert!((v.magnitude - expected).abs() < 1e-12);
        assert_eq!(v.term_count, 2);
    }

    #[test]
    fn test_termless_document_zero_magnitude() {
        let docs = corpus(&[("punct", "!!! ... ---"), ("words", "hello world")]);
        let index = build(&docs);
        assert_eq!(index.vectors["punct"].magnitude, 0.0);
        assert_eq!(index.vectors["punct"].term_count, 0);
        assert!(index.vectors["words"].magnitude > 0.0);
    }

    #[test]
    fn test_membership_change_moves_idf() {
        let before = build(&corpus(&[("a", "apple banana"), ("b", "banana cherry")]));
        let after = build(&corpus(&[
            ("a", "apple banana"),
            ("b", "banana cherry"),
            ("c", "cherry"),
        ]));
        assert!(after.idf["cherry"] != before.idf["cherry"]);
        assert!(after.vectors["b"].magnitude != before.vectors["b"].magnitude);
    }
}
