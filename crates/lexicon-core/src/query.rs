//! Query processing.
//!
//! Turns free text into a TF-IDF weighted term vector using the corpus's
//! committed IDF table. IDF is a corpus statistic: nothing in the query ever
//! changes it.

use std::collections::BTreeMap;

use crate::index::tf_weight;
use crate::models::IdfTable;
use crate::tokenize::term_counts;

/// A weighted query term vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryVector {
    /// Term → `tf(count) × idf(term)`, only for terms the corpus knows.
    pub weights: BTreeMap<String, f64>,
    /// L2 norm of `weights`.
    pub magnitude: f64,
}

impl QueryVector {
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Weight the query's terms by the existing IDF table.
///
/// Terms absent from `idf` are dropped: no document contains them, so they
/// cannot contribute to any dot product.
pub fn process_query(text: &str, idf: &IdfTable) -> QueryVector {
    let mut weights = BTreeMap::new();
    for (term, count) in term_counts(text) {
        if let Some(&w) = idf.get(&term) {
            weights.insert(term, tf_weight(count) * w);
        }
    }

    let magnitude = weights.values().map(|w| w * w).sum::<f64>().sqrt();
    QueryVector { weights, magnitude }
}
