//! TOML configuration parsing and validation.
//!
//! A config file declares where index databases live, the retrieval tuning
//! defaults, and one `[corpus.<name>]` table per independent corpus (e.g. a
//! codebase and a knowledge base).
//!
//! ```toml
//! [db]
//! dir = "./data"
//!
//! [retrieval]
//! limit = 10
//! min_score = 0.01
//!
//! [corpus.codebase]
//! root = "."
//!
//! [corpus.knowledge]
//! root = "./knowledge"
//! scheme = "knowledge"
//! include_globs = ["**/*.md"]
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lexicon_core::rank::{BoostConfig, RankOptions};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub corpus: BTreeMap<String, CorpusConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    /// Directory holding one `<corpus>.sqlite` file per corpus.
    pub dir: PathBuf,
    /// Fall back to an in-memory index when the database cannot be opened.
    #[serde(default)]
    pub memory_fallback: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    #[serde(default = "default_path_boost")]
    pub path_boost: f64,
    #[serde(default = "default_coverage_boost")]
    pub coverage_boost: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            min_score: default_min_score(),
            path_boost: default_path_boost(),
            coverage_boost: default_coverage_boost(),
        }
    }
}

fn default_limit() -> usize {
    10
}
fn default_min_score() -> f64 {
    0.01
}
fn default_path_boost() -> f64 {
    1.25
}
fn default_coverage_boost() -> f64 {
    1.10
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    pub root: PathBuf,
    /// URI scheme for document ids: `file` for code, anything else for
    /// knowledge corpora.
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Files larger than this are recorded as failures and skipped.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// Keep raw content in the store for snippets.
    #[serde(default = "default_keep_content")]
    pub keep_content: bool,
}

fn default_scheme() -> String {
    "file".to_string()
}

fn default_include_globs() -> Vec<String> {
    [
        "**/*.rs", "**/*.py", "**/*.js", "**/*.jsx", "**/*.ts", "**/*.tsx", "**/*.go",
        "**/*.java", "**/*.kt", "**/*.c", "**/*.h", "**/*.cpp", "**/*.hpp", "**/*.cs",
        "**/*.rb", "**/*.php", "**/*.swift", "**/*.sh", "**/*.md", "**/*.txt", "**/*.toml",
        "**/*.yaml", "**/*.yml",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_file_bytes() -> u64 {
    1024 * 1024
}

fn default_keep_content() -> bool {
    true
}

impl Config {
    /// Look up a corpus by name.
    pub fn corpus(&self, name: &str) -> Result<&CorpusConfig> {
        self.corpus.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.corpus.keys().map(|k| k.as_str()).collect();
            anyhow::anyhow!(
                "Unknown corpus: '{}'. Configured: {}",
                name,
                known.join(", ")
            )
        })
    }

    /// Resolve `all` or a single name into corpus names.
    pub fn corpus_names(&self, selector: &str) -> Result<Vec<String>> {
        if selector == "all" {
            return Ok(self.corpus.keys().cloned().collect());
        }
        self.corpus(selector)?;
        Ok(vec![selector.to_string()])
    }

    /// Path of the SQLite database backing a corpus.
    pub fn db_path(&self, corpus: &str) -> PathBuf {
        self.db.dir.join(format!("{}.sqlite", corpus))
    }

    /// Ranking options from config, with optional CLI overrides.
    pub fn rank_options(&self, limit: Option<usize>, min_score: Option<f64>) -> RankOptions {
        RankOptions {
            limit: limit.unwrap_or(self.retrieval.limit),
            min_score: min_score.unwrap_or(self.retrieval.min_score),
            boosts: BoostConfig {
                path_match: self.retrieval.path_boost,
                full_coverage: self.retrieval.coverage_boost,
            },
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Parse and validate a config from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.corpus.is_empty() {
        bail!("at least one [corpus.<name>] table is required");
    }

    // Validate retrieval
    if config.retrieval.limit < 1 {
        bail!("retrieval.limit must be >= 1");
    }
    if config.retrieval.min_score.is_nan() || config.retrieval.min_score < 0.0 {
        bail!("retrieval.min_score must be >= 0");
    }
    if config.retrieval.path_boost < 1.0 || config.retrieval.coverage_boost < 1.0 {
        bail!("retrieval.path_boost and retrieval.coverage_boost must be >= 1.0");
    }

    // Validate corpora
    for (name, corpus) in &config.corpus {
        if name == "all"
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            bail!(
                "corpus name '{}' must be alphanumeric (with '-' or '_') and not 'all'",
                name
            );
        }
        if !valid_scheme(&corpus.scheme) {
            bail!(
                "corpus.{}.scheme '{}' is not a valid URI scheme",
                name,
                corpus.scheme
            );
        }
        if corpus.max_file_bytes == 0 {
            bail!("corpus.{}.max_file_bytes must be > 0", name);
        }
        if corpus.include_globs.is_empty() {
            bail!("corpus.{}.include_globs must not be empty", name);
        }
    }

    Ok(config)
}

fn valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
}
