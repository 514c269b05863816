//! `lex search`: rank a corpus against a free-text query.

use anyhow::{bail, Result};

use lexicon_core::search::{ContentMode, SearchFilters, SearchOptions, SearchResponse};

use crate::config::Config;
use crate::corpus::Corpus;

/// Command-line search parameters; `None` falls back to `[retrieval]`.
#[derive(Debug, Clone, Default)]
pub struct SearchArgs {
    pub limit: Option<usize>,
    pub min_score: Option<f64>,
    pub extensions: Vec<String>,
    pub path_prefix: Option<String>,
    pub language: Option<String>,
    pub content: ContentMode,
    /// Recompute and check every stored magnitude first.
    pub verify: bool,
    pub json: bool,
}

impl SearchArgs {
    pub fn options(&self, config: &Config) -> Result<SearchOptions> {
        if self.limit == Some(0) {
            bail!("--limit must be >= 1");
        }
        if let Some(min) = self.min_score {
            if min.is_nan() || min < 0.0 {
                bail!("--min-score must be >= 0");
            }
        }
        Ok(SearchOptions {
            rank: config.rank_options(self.limit, self.min_score),
            filters: SearchFilters {
                extensions: self
                    .extensions
                    .iter()
                    .flat_map(|e| e.split(','))
                    .map(|e| e.trim().trim_start_matches('.').to_string())
                    .filter(|e| !e.is_empty())
                    .collect(),
                path_prefix: self.path_prefix.clone(),
                language: self.language.clone(),
            },
            content: self.content,
            verify: self.verify,
        })
    }
}

pub async fn run_search(
    config: &Config,
    corpus_name: &str,
    query: &str,
    args: &SearchArgs,
) -> Result<()> {
    let options = args.options(config)?;
    let corpus = Corpus::open(config, corpus_name).await?;
    let result = corpus.search(query, &options).await;
    corpus.close().await;
    let response = result?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_human(&response);
    }
    Ok(())
}

fn print_human(response: &SearchResponse) {
    if response.results.is_empty() {
        println!("No results.");
    }

    for (i, hit) in response.results.iter().enumerate() {
        let lang = hit
            .language
            .as_deref()
            .map(|l| format!("  ({})", l))
            .unwrap_or_default();
        println!("{}. [{:.4}] {}{}", i + 1, hit.score, hit.path, lang);
        println!("   id: {}", hit.id);
        println!("   matched: {}", hit.matched_terms.join(", "));
        if let Some(content) = &hit.content {
            for line in content.lines() {
                println!("   | {}", line);
            }
        }
        println!();
    }

    println!(
        "{} result{} ({} of {} documents matched filters)",
        response.results.len(),
        if response.results.len() == 1 { "" } else { "s" },
        response.candidates,
        response.total_indexed
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    fn config() -> Config {
        parse_config("[db]\ndir = \"./data\"\n\n[corpus.code]\nroot = \".\"\n").unwrap()
    }

    #[test]
    fn test_options_from_args() {
        let args = SearchArgs {
            limit: Some(3),
            extensions: vec!["rs,.MD".to_string(), " toml ".to_string()],
            path_prefix: Some("src/".to_string()),
            ..Default::default()
        };
        let opts = args.options(&config()).unwrap();
        assert_eq!(opts.rank.limit, 3);
        assert_eq!(opts.rank.min_score, 0.01);
        assert_eq!(opts.filters.extensions, vec!["rs", "MD", "toml"]);
        assert_eq!(opts.filters.path_prefix.as_deref(), Some("src/"));
        assert_eq!(opts.content, ContentMode::Omit);
        assert!(!opts.verify);
    }

    #[test]
    fn test_invalid_args() {
        let zero = SearchArgs {
            limit: Some(0),
            ..Default::default()
        };
        assert!(zero.options(&config()).is_err());

        let negative = SearchArgs {
            min_score: Some(-0.5),
            ..Default::default()
        };
        assert!(negative.options(&config()).is_err());
    }
}
