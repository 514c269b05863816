//! # Lexicon
//!
//! A local-first TF-IDF search engine for codebases and knowledge bases.
//!
//! Each configured corpus (a source tree, a folder of markdown notes) is
//! tokenized into term counts, weighted with TF-IDF, and stored in its own
//! SQLite database. Free-text queries are ranked by cosine similarity.
//! Index passes are incremental: unchanged files are skipped by mtime, files
//! whose mtime moved but whose content did not are only touched, and the
//! corpus-wide weights are recomputed and committed atomically whenever the
//! document set changes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌────────────────┐
//! │  FsScanner  │──▶│  Maintainer  │──▶│     SQLite     │
//! │ walk + glob │   │ tokenize+IDF │   │ one per corpus │
//! └─────────────┘   └──────────────┘   └───────┬────────┘
//!                                              │ snapshot
//!                                              ▼
//!                                        ┌──────────┐
//!                                        │  search  │──▶ lex CLI
//!                                        └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! lex init all                      # create databases
//! lex index codebase                # index a corpus
//! lex search codebase "parse request" --content
//! lex stats codebase
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite `DocumentStore` |
//! | [`backend`] | Storage backend selection |
//! | [`scanner`] | Filesystem scanning |
//! | [`maintain`] | Incremental index maintenance |
//! | [`progress`] | Index progress reporting |
//! | [`corpus`] | Per-corpus handle |
//! | [`search`], [`get`], [`stats`], [`corpora`], [`index_cmd`] | CLI commands |
//!
//! The scoring algorithms themselves live in the `lexicon-core` crate.

pub mod backend;
pub mod config;
pub mod corpora;
pub mod corpus;
pub mod db;
pub mod get;
pub mod index_cmd;
pub mod maintain;
pub mod migrate;
pub mod progress;
pub mod scanner;
pub mod search;
pub mod sqlite_store;
pub mod stats;
