//! Typed corpus-level outcomes.
//!
//! Document-level failures never surface here; they are recorded in the
//! maintainer's sync report. Storage errors are carried as `anyhow::Error`
//! because every [`DocumentStore`](crate::store::DocumentStore) method
//! returns `anyhow::Result`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    /// A query was issued against a corpus with zero indexed documents.
    #[error("corpus has not been indexed yet; run an index pass first")]
    NotIndexed,

    /// The committed IDF table, document vectors, and term counts disagree.
    #[error("index is inconsistent: {0}; reindex the corpus with --full")]
    Inconsistent(String),

    /// A maintenance pass was cancelled before committing.
    #[error("indexing cancelled; the previously committed index is unchanged")]
    Cancelled,

    /// Another commit landed while a pass was computing its own.
    #[error("index changed during this pass (generation {found}, expected {expected}); run the pass again")]
    Conflict { expected: u64, found: u64 },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl IndexError {
    /// Recover a typed error that a store raised through `anyhow`.
    pub fn from_store(err: anyhow::Error) -> Self {
        match err.downcast::<IndexError>() {
            Ok(typed) => typed,
            Err(err) => IndexError::Store(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_store_recovers_conflict() {
        let err = anyhow::Error::from(IndexError::Conflict {
            expected: 3,
            found: 4,
        });
        assert!(matches!(
            IndexError::from_store(err),
            IndexError::Conflict {
                expected: 3,
                found: 4
            }
        ));

        let other = IndexError::from_store(anyhow::anyhow!("disk full"));
        assert!(matches!(other, IndexError::Store(_)));
    }
}
