//! Index statistics and health overview.
//!
//! Provides a quick summary of what's indexed: document and term counts,
//! the policy versions the index was built with, and a per-language
//! breakdown. Used by `lex stats` to confirm that index passes are working.

use anyhow::Result;

use lexicon_core::models::IndexMeta;

use crate::config::Config;
use crate::corpus::{Corpus, CorpusStats};

pub async fn run_stats(config: &Config, corpus_name: &str, json: bool) -> Result<()> {
    let corpus = Corpus::open(config, corpus_name).await?;
    let result = corpus.stats().await;
    corpus.close().await;
    let stats = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_human(&stats);
    }
    Ok(())
}

fn print_human(stats: &CorpusStats) {
    println!("Lexicon Corpus Stats: {}", stats.corpus);
    println!("================================");
    println!();
    println!("  Root:        {}", stats.root.display());
    match &stats.db_path {
        Some(path) => {
            println!("  Database:    {}", path.display());
            println!("  Size:        {}", format_bytes(stats.db_size_bytes));
        }
        None => println!("  Database:    (in-memory fallback)"),
    }
    println!();
    println!("  Documents:   {}", stats.documents);
    println!("  Terms:       {}", stats.terms);
    println!("  Postings:    {}", stats.postings);
    println!("  Index:       {}", describe_meta(stats.meta));
    println!(
        "  Newest file: {}",
        stats
            .newest_mtime
            .map(format_ts_relative)
            .unwrap_or_else(|| "never".to_string())
    );

    if !stats.languages.is_empty() {
        let mut by_count: Vec<(&String, &usize)> = stats.languages.iter().collect();
        by_count.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        println!();
        println!("  By language:");
        println!("  {:<16} {:>8}", "LANGUAGE", "DOCS");
        println!("  {}", "-".repeat(25));
        for (lang, count) in by_count {
            println!("  {:<16} {:>8}", lang, count);
        }
    }
    println!();
}

fn describe_meta(meta: Option<IndexMeta>) -> String {
    match meta {
        None => "not built".to_string(),
        Some(m) if m == IndexMeta::current() => format!(
            "tokenizer v{}, weighting v{}",
            m.tokenizer_version, m.weighting_version
        ),
        Some(m) => format!(
            "tokenizer v{}, weighting v{} (stale; run `lex index --full`)",
            m.tokenizer_version, m.weighting_version
        ),
    }
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
