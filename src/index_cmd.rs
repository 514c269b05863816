//! `lex init` and `lex index`: create databases and run maintenance passes.

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::corpus::Corpus;
use crate::maintain::SyncReport;
use crate::progress::ProgressMode;

/// Create (and migrate) the database of every corpus named by `selector`.
pub async fn run_init(config: &Config, selector: &str) -> Result<()> {
    for name in config.corpus_names(selector)? {
        let corpus = Corpus::open(config, &name).await?;
        let persistent = corpus.store().is_persistent();
        corpus.close().await;
        if persistent {
            println!("initialized {} ({})", name, config.db_path(&name).display());
        } else {
            println!("initialized {} (in-memory fallback)", name);
        }
    }
    Ok(())
}

/// Index every corpus named by `selector` (a name or `all`).
pub async fn run_index(
    config: &Config,
    selector: &str,
    full: bool,
    dry_run: bool,
    progress: ProgressMode,
    cancel: &CancellationToken,
) -> Result<()> {
    let reporter = progress.reporter();
    for name in config.corpus_names(selector)? {
        let corpus = Corpus::open(config, &name).await?;
        let result = corpus.sync(full, dry_run, reporter.as_ref(), cancel).await;
        corpus.close().await;
        print_report(&result?);
    }
    Ok(())
}

fn print_report(report: &SyncReport) {
    if report.dry_run {
        println!("index {} (dry-run)", report.corpus);
    } else {
        println!("index {}", report.corpus);
    }
    println!("  scanned:   {} files", report.scanned);
    println!("  added:     {}", report.added);
    println!("  updated:   {}", report.updated);
    println!("  touched:   {}", report.touched);
    println!("  unchanged: {}", report.unchanged);
    println!("  removed:   {}", report.removed);
    println!("  documents: {}", report.documents);
    if report.recomputed {
        println!("  weights:   recomputed");
    }
    if !report.failures.is_empty() {
        println!("  failures:  {}", report.failures.len());
        for failure in &report.failures {
            println!("    {}: {}", failure.path, failure.reason);
        }
    }
    println!("ok");
}
