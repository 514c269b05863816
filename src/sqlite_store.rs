//! SQLite-backed [`DocumentStore`] implementation.
//!
//! Every maintenance pass lands through [`DocumentStore::commit`], which runs
//! as a single SQLite transaction. [`DocumentStore::load_snapshot`] reads all
//! tables inside one read transaction, so under WAL a query sees exactly one
//! committed index even while an index pass is writing the next.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Row, SqlitePool};

use lexicon_core::models::{
    CorpusWeights, Document, DocumentVector, Fingerprint, IdfTable, IndexCommit, IndexMeta,
    IndexSnapshot, SnapshotDocument, TermFrequencies,
};
use lexicon_core::store::DocumentStore;
use lexicon_core::IndexError;

use crate::{db, migrate};

const META_TOKENIZER: &str = "tokenizer_version";
const META_WEIGHTING: &str = "weighting_version";
const META_GENERATION: &str = "generation";

/// SQLite implementation of the [`DocumentStore`] trait.
///
/// Wraps a [`SqlitePool`] over one corpus's database file (tables
/// documents, term_frequencies, idf, document_vectors, index_meta).
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `db_path`, creating and migrating the database as needed.
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = db::connect(db_path).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn row_to_document(row: &SqliteRow) -> Document {
    Document {
        id: row.get("id"),
        path: row.get("path"),
        content_hash: row.get("content_hash"),
        mtime: row.get("mtime"),
        language: row.get("language"),
        raw_content: row.get("raw_content"),
    }
}

async fn write_document(conn: &mut SqliteConnection, doc: &Document) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO documents (id, path, content_hash, mtime, language, raw_content)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            path = excluded.path,
            content_hash = excluded.content_hash,
            mtime = excluded.mtime,
            language = excluded.language,
            raw_content = excluded.raw_content
        "#,
    )
    .bind(&doc.id)
    .bind(&doc.path)
    .bind(&doc.content_hash)
    .bind(doc.mtime)
    .bind(&doc.language)
    .bind(&doc.raw_content)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn write_terms(
    conn: &mut SqliteConnection,
    doc_id: &str,
    terms: &TermFrequencies,
) -> Result<()> {
    sqlx::query("DELETE FROM term_frequencies WHERE document_id = ?")
        .bind(doc_id)
        .execute(&mut *conn)
        .await?;

    for (term, &count) in terms.iter().filter(|(_, &c)| c > 0) {
        sqlx::query(
            "INSERT INTO term_frequencies (document_id, term, frequency) VALUES (?, ?, ?)",
        )
        .bind(doc_id)
        .bind(term)
        .bind(count as i64)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn write_vector(
    conn: &mut SqliteConnection,
    doc_id: &str,
    vector: DocumentVector,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO document_vectors (document_id, magnitude, term_count)
        VALUES (?, ?, ?)
        ON CONFLICT(document_id) DO UPDATE SET
            magnitude = excluded.magnitude,
            term_count = excluded.term_count
        "#,
    )
    .bind(doc_id)
    .bind(vector.magnitude)
    .bind(vector.term_count as i64)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn write_idf(conn: &mut SqliteConnection, idf: &IdfTable) -> Result<()> {
    sqlx::query("DELETE FROM idf").execute(&mut *conn).await?;

    // Sorted so the write order (and thus the page layout) is reproducible.
    let mut entries: Vec<_> = idf.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    for (term, weight) in entries {
        sqlx::query("INSERT INTO idf (term, weight) VALUES (?, ?)")
            .bind(term)
            .bind(*weight)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn write_weights(conn: &mut SqliteConnection, weights: &CorpusWeights) -> Result<()> {
    write_idf(conn, &weights.idf).await?;

    sqlx::query("DELETE FROM document_vectors")
        .execute(&mut *conn)
        .await?;
    for (doc_id, vector) in &weights.vectors {
        write_vector(conn, doc_id, *vector).await?;
    }

    match weights.meta {
        Some(meta) => {
            for (key, value) in [
                (META_TOKENIZER, meta.tokenizer_version),
                (META_WEIGHTING, meta.weighting_version),
            ] {
                sqlx::query(
                    r#"
                    INSERT INTO index_meta (key, value) VALUES (?, ?)
                    ON CONFLICT(key) DO UPDATE SET value = excluded.value
                    "#,
                )
                .bind(key)
                .bind(value as i64)
                .execute(&mut *conn)
                .await?;
            }
        }
        None => {
            sqlx::query("DELETE FROM index_meta WHERE key IN (?, ?)")
                .bind(META_TOKENIZER)
                .bind(META_WEIGHTING)
                .execute(&mut *conn)
                .await?;
        }
    }
    Ok(())
}

async fn read_generation(conn: &mut SqliteConnection) -> Result<u64> {
    let value: Option<i64> = sqlx::query_scalar("SELECT value FROM index_meta WHERE key = ?")
        .bind(META_GENERATION)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(value.unwrap_or(0) as u64)
}

/// Advance the generation counter and return the value it had before.
///
/// Issued as the first statement of a write transaction so the transaction
/// holds the write lock before it reads anything.
async fn bump_generation(conn: &mut SqliteConnection) -> Result<u64> {
    sqlx::query(
        r#"
        INSERT INTO index_meta (key, value) VALUES (?, 1)
        ON CONFLICT(key) DO UPDATE SET value = value + 1
        "#,
    )
    .bind(META_GENERATION)
    .execute(&mut *conn)
    .await?;
    Ok(read_generation(conn).await? - 1)
}

async fn delete_document_rows(conn: &mut SqliteConnection, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM term_frequencies WHERE document_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM document_vectors WHERE document_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn read_all_terms(conn: &mut SqliteConnection) -> Result<HashMap<String, TermFrequencies>> {
    let rows = sqlx::query("SELECT document_id, term, frequency FROM term_frequencies")
        .fetch_all(&mut *conn)
        .await?;

    let mut all: HashMap<String, TermFrequencies> = HashMap::new();
    for row in rows {
        let doc_id: String = row.get("document_id");
        let term: String = row.get("term");
        let frequency: i64 = row.get("frequency");
        all.entry(doc_id).or_default().insert(term, frequency as u32);
    }
    Ok(all)
}

async fn read_vectors(conn: &mut SqliteConnection) -> Result<HashMap<String, DocumentVector>> {
    let rows = sqlx::query("SELECT document_id, magnitude, term_count FROM document_vectors")
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let doc_id: String = row.get("document_id");
            let term_count: i64 = row.get("term_count");
            (
                doc_id,
                DocumentVector {
                    magnitude: row.get("magnitude"),
                    term_count: term_count as u32,
                },
            )
        })
        .collect())
}

async fn read_idf(conn: &mut SqliteConnection) -> Result<IdfTable> {
    let rows = sqlx::query("SELECT term, weight FROM idf")
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows
        .iter()
        .map(|row| {
            let term: String = row.get("term");
            let weight: f64 = row.get("weight");
            (term, weight)
        })
        .collect())
}

async fn read_meta(conn: &mut SqliteConnection) -> Result<Option<IndexMeta>> {
    let rows = sqlx::query("SELECT key, value FROM index_meta")
        .fetch_all(&mut *conn)
        .await?;

    let mut tokenizer = None;
    let mut weighting = None;
    for row in &rows {
        let key: String = row.get("key");
        let value: i64 = row.get("value");
        match key.as_str() {
            META_TOKENIZER => tokenizer = Some(value as u32),
            META_WEIGHTING => weighting = Some(value as u32),
            _ => {}
        }
    }

    Ok(match (tokenizer, weighting) {
        (Some(tokenizer_version), Some(weighting_version)) => Some(IndexMeta {
            tokenizer_version,
            weighting_version,
        }),
        _ => None,
    })
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get_all_documents(&self) -> Result<Vec<Document>> {
        let rows = sqlx::query(
            "SELECT id, path, content_hash, mtime, language, raw_content FROM documents ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_document).collect())
    }

    async fn list_fingerprints(&self) -> Result<Vec<Fingerprint>> {
        let rows = sqlx::query("SELECT id, path, content_hash, mtime FROM documents ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| Fingerprint {
                id: row.get("id"),
                path: row.get("path"),
                content_hash: row.get("content_hash"),
                mtime: row.get("mtime"),
            })
            .collect())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let row = sqlx::query(
            "SELECT id, path, content_hash, mtime, language, raw_content FROM documents WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_document))
    }

    async fn upsert_document(&self, doc: &Document) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        write_document(&mut conn, doc).await
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        delete_document_rows(&mut tx, id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn set_term_frequencies(&self, doc_id: &str, terms: &TermFrequencies) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        write_terms(&mut tx, doc_id, terms).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_term_frequencies(&self, doc_id: &str) -> Result<TermFrequencies> {
        let rows = sqlx::query("SELECT term, frequency FROM term_frequencies WHERE document_id = ?")
            .bind(doc_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| {
                let term: String = row.get("term");
                let frequency: i64 = row.get("frequency");
                (term, frequency as u32)
            })
            .collect())
    }

    async fn get_all_term_frequencies(&self) -> Result<HashMap<String, TermFrequencies>> {
        let mut conn = self.pool.acquire().await?;
        read_all_terms(&mut conn).await
    }

    async fn set_idf_table(&self, idf: &IdfTable) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        write_idf(&mut tx, idf).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_idf_table(&self) -> Result<IdfTable> {
        let mut conn = self.pool.acquire().await?;
        read_idf(&mut conn).await
    }

    async fn set_document_vector(&self, doc_id: &str, vector: DocumentVector) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        write_vector(&mut conn, doc_id, vector).await
    }

    async fn get_all_document_vectors(&self) -> Result<HashMap<String, DocumentVector>> {
        let mut conn = self.pool.acquire().await?;
        read_vectors(&mut conn).await
    }

    async fn get_index_meta(&self) -> Result<Option<IndexMeta>> {
        let mut conn = self.pool.acquire().await?;
        read_meta(&mut conn).await
    }

    async fn document_count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn generation(&self) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;
        read_generation(&mut conn).await
    }

    async fn commit(&self, commit: &IndexCommit) -> Result<()> {
        if commit.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        let previous = bump_generation(&mut tx).await?;
        if let Some(expected) = commit.base_generation {
            if expected != previous {
                // dropping `tx` rolls the bump back
                return Err(IndexError::Conflict {
                    expected,
                    found: previous,
                }
                .into());
            }
        }

        for id in &commit.removed {
            delete_document_rows(&mut tx, id).await?;
        }

        for indexed in &commit.upserts {
            write_document(&mut tx, &indexed.document).await?;
            write_terms(&mut tx, &indexed.document.id, &indexed.terms).await?;
        }

        for touch in &commit.touched {
            sqlx::query("UPDATE documents SET mtime = ?, content_hash = ? WHERE id = ?")
                .bind(touch.mtime)
                .bind(&touch.content_hash)
                .bind(&touch.id)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(weights) = &commit.weights {
            write_weights(&mut tx, weights).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn load_snapshot(&self, with_content: bool) -> Result<IndexSnapshot> {
        let mut tx = self.pool.begin().await?;

        let columns = if with_content {
            "id, path, language, raw_content"
        } else {
            "id, path, language, NULL AS raw_content"
        };
        let rows = sqlx::query(&format!(
            "SELECT {} FROM documents ORDER BY id",
            columns
        ))
        .fetch_all(&mut *tx)
        .await?;
        let mut terms = read_all_terms(&mut tx).await?;
        let vectors = read_vectors(&mut tx).await?;
        let idf = read_idf(&mut tx).await?;
        let meta = read_meta(&mut tx).await?;

        tx.commit().await?;

        let documents = rows
            .iter()
            .map(|row| {
                let id: String = row.get("id");
                SnapshotDocument {
                    path: row.get("path"),
                    language: row.get("language"),
                    terms: terms.remove(&id).unwrap_or_default(),
                    vector: vectors.get(&id).copied(),
                    raw_content: row.get("raw_content"),
                    id,
                }
            })
            .collect();

        Ok(IndexSnapshot {
            idf,
            documents,
            meta,
        })
    }

    async fn clear(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        bump_generation(&mut tx).await?;
        for table in ["term_frequencies", "document_vectors", "idf", "documents"] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query("DELETE FROM index_meta WHERE key != ?")
            .bind(META_GENERATION)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
