//! Database schema migrations (idempotent).

use anyhow::Result;
use sqlx::SqlitePool;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Documents
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            path TEXT NOT NULL,
            content_hash TEXT NOT NULL,
            mtime INTEGER NOT NULL,
            language TEXT,
            raw_content TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Term-frequency entries, one row per (document, term) with count > 0
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS term_frequencies (
            document_id TEXT NOT NULL,
            term TEXT NOT NULL,
            frequency INTEGER NOT NULL CHECK (frequency > 0),
            PRIMARY KEY (document_id, term),
            FOREIGN KEY (document_id) REFERENCES documents(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS idf (
            term TEXT PRIMARY KEY,
            weight REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS document_vectors (
            document_id TEXT PRIMARY KEY,
            magnitude REAL NOT NULL,
            term_count INTEGER NOT NULL,
            FOREIGN KEY (document_id) REFERENCES documents(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Policy versions of the committed index
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS index_meta (
            key TEXT PRIMARY KEY,
            value INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_path ON documents(path)")
        .execute(pool)
        .await?;

    Ok(())
}
