//! Corpus scanning.
//!
//! A [`Scanner`] enumerates the files of one corpus and reads their text.
//! [`FsScanner`] walks a directory with `walkdir`, keeps files matching the
//! corpus `include_globs`, and drops anything under `.git/`, `target/`,
//! `node_modules/`, or a configured `exclude_globs` pattern.
//!
//! Entries are returned sorted by relative path so that index passes are
//! deterministic regardless of directory iteration order.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::config::CorpusConfig;

/// One file discovered by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    /// Path relative to the corpus root, always `/`-separated.
    pub path: String,
    /// Last-modified time in Unix nanoseconds.
    pub mtime: i64,
}

#[async_trait]
pub trait Scanner: Send + Sync {
    /// Enumerate the files currently in the corpus.
    async fn list(&self) -> Result<Vec<ScanEntry>>;

    /// Read one file's text. Fails for missing, oversized, or non-UTF-8 files.
    async fn read(&self, path: &str) -> Result<String>;
}

/// Filesystem scanner over a corpus root.
pub struct FsScanner {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
    follow_symlinks: bool,
    max_file_bytes: u64,
}

impl FsScanner {
    pub fn new(config: &CorpusConfig) -> Result<Self> {
        let include = build_globset(&config.include_globs)?;

        let mut excludes = vec![
            "**/.git/**".to_string(),
            "**/target/**".to_string(),
            "**/node_modules/**".to_string(),
        ];
        excludes.extend(config.exclude_globs.iter().cloned());
        let exclude = build_globset(&excludes)?;

        Ok(Self {
            root: config.root.clone(),
            include,
            exclude,
            follow_symlinks: config.follow_symlinks,
            max_file_bytes: config.max_file_bytes,
        })
    }

    fn walk(&self) -> Result<Vec<ScanEntry>> {
        if !self.root.is_dir() {
            bail!("Corpus root does not exist: {}", self.root.display());
        }

        let mut entries = Vec::new();
        let walker = WalkDir::new(&self.root).follow_links(self.follow_symlinks);
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            let rel_str = relative_to_string(relative);

            if self.exclude.is_match(&rel_str) {
                continue;
            }
            if !self.include.is_match(&rel_str) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(path = %rel_str, error = %e, "skipping file without metadata");
                    continue;
                }
            };

            entries.push(ScanEntry {
                path: rel_str,
                mtime: unix_nanos(metadata.modified().ok()),
            });
        }

        // Sort for deterministic ordering
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}

#[async_trait]
impl Scanner for FsScanner {
    async fn list(&self) -> Result<Vec<ScanEntry>> {
        self.walk()
    }

    async fn read(&self, path: &str) -> Result<String> {
        let full = self.root.join(path);
        let metadata = tokio::fs::metadata(&full)
            .await
            .with_context(|| format!("cannot stat {}", path))?;
        if metadata.len() > self.max_file_bytes {
            bail!(
                "file is {} bytes, over the {} byte limit",
                metadata.len(),
                self.max_file_bytes
            );
        }

        let bytes = tokio::fs::read(&full)
            .await
            .with_context(|| format!("cannot read {}", path))?;
        String::from_utf8(bytes).map_err(|_| anyhow::anyhow!("file is not valid UTF-8"))
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}

fn relative_to_string(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn unix_nanos(time: Option<SystemTime>) -> i64 {
    let nanos = time
        .unwrap_or(SystemTime::UNIX_EPOCH)
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    i64::try_from(nanos).unwrap_or(i64::MAX)
}

/// Build the stable document id for a relative path.
pub fn document_id(scheme: &str, path: &str) -> String {
    format!("{}://{}", scheme, path)
}

/// Classify a path by extension. Used only for the `--lang` filter.
pub fn detect_language(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let ext = file_name.rsplit_once('.')?.1;
    let lang = match ext.to_ascii_lowercase().as_str() {
        "rs" => "rust",
        "py" | "pyi" => "python",
        "js" | "mjs" | "cjs" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "c" | "h" => "c",
        "cpp" | "cc" | "cxx" | "hpp" | "hh" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "php" => "php",
        "swift" => "swift",
        "scala" => "scala",
        "sh" | "bash" | "zsh" => "shell",
        "sql" => "sql",
        "html" | "htm" => "html",
        "css" | "scss" => "css",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "md" | "markdown" => "markdown",
        "rst" => "rst",
        "txt" => "text",
        _ => return None,
    };
    Some(lang.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use tempfile::TempDir;

    fn corpus_config(root: &Path, extra: &str) -> CorpusConfig {
        let cfg = parse_config(&format!(
            "[db]\ndir = \"./data\"\n\n[corpus.code]\nroot = \"{}\"\n{}",
            root.display(),
            extra
        ))
        .unwrap();
        cfg.corpus("code").unwrap().clone()
    }

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[tokio::test]
    async fn test_list_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "src/main.rs", "fn main() {}");
        write(tmp.path(), "README.md", "# readme");
        write(tmp.path(), "image.png", "binary");
        write(tmp.path(), "target/debug/build.rs", "generated");
        write(tmp.path(), ".git/config.toml", "x");

        let scanner = FsScanner::new(&corpus_config(tmp.path(), "")).unwrap();
        let paths: Vec<String> = scanner
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.path)
            .collect();
        assert_eq!(paths, vec!["README.md", "src/main.rs"]);
    }

    #[tokio::test]
    async fn test_exclude_globs() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "src/lib.rs", "pub fn a() {}");
        write(tmp.path(), "vendor/dep.rs", "pub fn b() {}");

        let scanner = FsScanner::new(&corpus_config(
            tmp.path(),
            "exclude_globs = [\"vendor/**\"]",
        ))
        .unwrap();
        let entries = scanner.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "src/lib.rs");
    }

    #[tokio::test]
    async fn test_missing_root() {
        let tmp = TempDir::new().unwrap();
        let scanner = FsScanner::new(&corpus_config(&tmp.path().join("nope"), "")).unwrap();
        assert!(scanner.list().await.is_err());
    }

    #[tokio::test]
    async fn test_read_failures() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "big.txt", &"x".repeat(64));
        std::fs::write(tmp.path().join("bad.txt"), [0xff, 0xfe, 0x00]).unwrap();
        write(tmp.path(), "ok.txt", "fine");

        let scanner =
            FsScanner::new(&corpus_config(tmp.path(), "max_file_bytes = 32")).unwrap();
        assert!(scanner.read("big.txt").await.is_err());
        assert!(scanner.read("bad.txt").await.is_err());
        assert!(scanner.read("gone.txt").await.is_err());
        assert_eq!(scanner.read("ok.txt").await.unwrap(), "fine");
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("src/main.rs"), Some("rust".to_string()));
        assert_eq!(detect_language("docs/Guide.MD"), Some("markdown".to_string()));
        assert_eq!(detect_language("Makefile"), None);
        assert_eq!(detect_language("dir.d/file"), None);
    }

    #[test]
    fn test_document_id() {
        assert_eq!(document_id("file", "src/lib.rs"), "file://src/lib.rs");
    }
}
