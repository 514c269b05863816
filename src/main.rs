//! # Lexicon CLI (`lex`)
//!
//! The `lex` binary creates per-corpus index databases, runs incremental
//! index passes, and answers free-text queries.
//!
//! ## Usage
//!
//! ```bash
//! lex --config ./config/lexicon.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lex init [corpus\|all]` | Create and migrate corpus databases |
//! | `lex corpora` | List configured corpora and their status |
//! | `lex index <corpus\|all>` | Bring a corpus index up to date |
//! | `lex search <corpus> "<query>"` | Rank documents against a query |
//! | `lex get <corpus> <id\|path>` | Show one indexed document |
//! | `lex stats <corpus>` | Summarize an index |
//! | `lex clear <corpus>` | Drop every document and weight |
//!
//! Logging goes to stderr and is controlled by `LEX_LOG` (an `EnvFilter`
//! directive such as `lexicon=debug`) or `-v`/`-vv`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use lexicon::config;
use lexicon::corpus::Corpus;
use lexicon::progress::ProgressMode;
use lexicon::search::SearchArgs;
use lexicon::{corpora, get, index_cmd, search, stats};
use lexicon_core::search::ContentMode;
use lexicon_core::IndexError;

/// Lexicon: local TF-IDF search for codebases and knowledge bases.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/lexicon.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "lex",
    about = "Lexicon: local TF-IDF search for codebases and knowledge bases",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/lexicon.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database of one corpus, or of every corpus.
    ///
    /// Idempotent: running it again only re-applies missing tables.
    Init {
        #[arg(default_value = "all")]
        corpus: String,
    },

    /// List configured corpora and whether their roots exist.
    Corpora,

    /// Bring a corpus index up to date with its files.
    ///
    /// Unchanged files are skipped by mtime; changed files are re-tokenized
    /// and the corpus weights are recomputed and committed atomically.
    Index {
        /// Corpus name, or `all`.
        corpus: String,
        /// Re-read and re-tokenize every file.
        #[arg(long)]
        full: bool,
        /// Report what would change without writing.
        #[arg(long)]
        dry_run: bool,
        /// Progress on stderr: `off`, `human`, or `json`. Defaults to
        /// `human` when stderr is a terminal.
        #[arg(long, value_parser = parse_progress)]
        progress: Option<ProgressMode>,
    },

    /// Rank a corpus's documents against a query.
    Search {
        corpus: String,
        query: String,
        /// Maximum number of results.
        #[arg(long)]
        limit: Option<usize>,
        /// Drop results scoring below this.
        #[arg(long)]
        min_score: Option<f64>,
        /// Only these extensions (comma-separated, e.g. `rs,md`).
        #[arg(long = "ext")]
        extensions: Vec<String>,
        /// Only paths starting with this prefix.
        #[arg(long = "path")]
        path_prefix: Option<String>,
        /// Only documents of this language (e.g. `rust`, `markdown`).
        #[arg(long = "lang")]
        language: Option<String>,
        /// Attach a snippet around the first match.
        #[arg(long)]
        content: bool,
        /// Attach the full stored content.
        #[arg(long, conflicts_with = "content")]
        full_content: bool,
        /// Check every stored weight against the term counts before
        /// ranking. Slower; use after an `Inconsistent` error or a crash.
        #[arg(long)]
        verify: bool,
        /// Print the response as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show one indexed document by id or relative path.
    Get {
        corpus: String,
        id: String,
        #[arg(long)]
        json: bool,
    },

    /// Summarize a corpus index.
    Stats {
        corpus: String,
        #[arg(long)]
        json: bool,
    },

    /// Remove every document and weight from a corpus index.
    Clear { corpus: String },
}

fn parse_progress(s: &str) -> Result<ProgressMode, String> {
    match s {
        "off" => Ok(ProgressMode::Off),
        "human" => Ok(ProgressMode::Human),
        "json" => Ok(ProgressMode::Json),
        _ => Err(format!("invalid progress mode '{}': use off, human, or json", s)),
    }
}

fn init_tracing(verbose: u8) {
    let filter = if let Ok(env) = std::env::var("LEX_LOG") {
        EnvFilter::new(env)
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Cancel `token` on the first Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; cancelling");
            token.cancel();
        }
    });
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init { corpus } => {
            index_cmd::run_init(&cfg, &corpus).await?;
        }
        Commands::Corpora => {
            corpora::list_corpora(&cfg)?;
        }
        Commands::Index {
            corpus,
            full,
            dry_run,
            progress,
        } => {
            let cancel = CancellationToken::new();
            cancel_on_interrupt(cancel.clone());
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            index_cmd::run_index(&cfg, &corpus, full, dry_run, mode, &cancel).await?;
        }
        Commands::Search {
            corpus,
            query,
            limit,
            min_score,
            extensions,
            path_prefix,
            language,
            content,
            full_content,
            verify,
            json,
        } => {
            let args = SearchArgs {
                limit,
                min_score,
                extensions,
                path_prefix,
                language,
                content: if full_content {
                    ContentMode::Full
                } else if content {
                    ContentMode::Snippet
                } else {
                    ContentMode::Omit
                },
                verify,
                json,
            };
            search::run_search(&cfg, &corpus, &query, &args).await?;
        }
        Commands::Get { corpus, id, json } => {
            get::run_get(&cfg, &corpus, &id, json).await?;
        }
        Commands::Stats { corpus, json } => {
            stats::run_stats(&cfg, &corpus, json).await?;
        }
        Commands::Clear { corpus } => {
            let handle = Corpus::open(&cfg, &corpus).await?;
            let result = handle.clear().await;
            handle.close().await;
            result?;
            println!("cleared {}", corpus);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<IndexError>() {
                Some(IndexError::NotIndexed) => {
                    eprintln!("Error: {}", e);
                    eprintln!("hint: run `lex index <corpus>` first");
                }
                Some(IndexError::Cancelled) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::from(130);
                }
                _ => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}
