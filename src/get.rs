//! `lex get`: print one indexed document with its term counts.

use anyhow::{bail, Result};
use serde::Serialize;

use lexicon_core::models::{mtime_seconds, Document};
use lexicon_core::store::DocumentStore;

use crate::config::Config;
use crate::corpus::Corpus;

/// A document plus its most frequent terms.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResponse {
    #[serde(flatten)]
    pub document: Document,
    pub distinct_terms: usize,
    pub top_terms: Vec<(String, u32)>,
}

const TOP_TERMS: usize = 15;

pub async fn get_document(corpus: &Corpus, id_or_path: &str) -> Result<DocumentResponse> {
    let document = match corpus.get(id_or_path).await? {
        Some(doc) => doc,
        None => bail!("document not found in '{}': {}", corpus.name(), id_or_path),
    };

    let terms = corpus.store().get_term_frequencies(&document.id).await?;
    let mut top: Vec<(String, u32)> = terms.iter().map(|(t, &c)| (t.clone(), c)).collect();
    top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top.truncate(TOP_TERMS);

    Ok(DocumentResponse {
        document,
        distinct_terms: terms.len(),
        top_terms: top,
    })
}

pub async fn run_get(config: &Config, corpus_name: &str, id: &str, json: bool) -> Result<()> {
    let corpus = Corpus::open(config, corpus_name).await?;
    let result = get_document(&corpus, id).await;
    corpus.close().await;
    let doc = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("--- Document ---");
    println!("id: {}", doc.document.id);
    println!("path: {}", doc.document.path);
    if let Some(lang) = &doc.document.language {
        println!("language: {}", lang);
    }
    println!("modified: {}", format_ts_iso(mtime_seconds(doc.document.mtime)));
    println!("hash: {}", doc.document.content_hash);
    println!("distinct terms: {}", doc.distinct_terms);
    let top: Vec<String> = doc
        .top_terms
        .iter()
        .map(|(t, c)| format!("{}×{}", t, c))
        .collect();
    println!("top terms: {}", top.join(" "));
    println!();
    match &doc.document.raw_content {
        Some(body) => println!("{}", body),
        None => println!("(content not stored; set keep_content = true)"),
    }

    Ok(())
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
