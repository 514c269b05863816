//! Index progress reporting.
//!
//! Reports observable progress during `lex index` so users see what is being
//! scanned, how much is left, and when the new index is committed.
//! Progress is emitted on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event for an index pass.
#[derive(Clone, Debug, PartialEq)]
pub enum IndexProgressEvent {
    /// The corpus root is being walked. Total unknown.
    Discovering { corpus: String },
    /// `n` of `total` scanned files have been checked.
    Indexing { corpus: String, n: u64, total: u64 },
    /// Weights are being recomputed and written.
    Committing { corpus: String, documents: u64 },
}

/// Reports index progress. Implementations write to stderr (human or JSON).
pub trait IndexProgressReporter: Send + Sync {
    fn report(&self, event: IndexProgressEvent);
}

/// Human-friendly progress on stderr: "index code  indexing  1,234 / 5,000 files".
pub struct StderrProgress;

impl IndexProgressReporter for StderrProgress {
    fn report(&self, event: IndexProgressEvent) {
        let line = match &event {
            IndexProgressEvent::Discovering { corpus } => {
                format!("index {}  discovering...\n", corpus)
            }
            IndexProgressEvent::Indexing { corpus, n, total } => format!(
                "index {}  indexing  {} / {} files\n",
                corpus,
                format_number(*n),
                format_number(*total)
            ),
            IndexProgressEvent::Committing { corpus, documents } => format!(
                "index {}  committing  {} documents\n",
                corpus,
                format_number(*documents)
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl IndexProgressReporter for JsonProgress {
    fn report(&self, event: IndexProgressEvent) {
        let obj = match &event {
            IndexProgressEvent::Discovering { corpus } => serde_json::json!({
                "event": "progress",
                "corpus": corpus,
                "phase": "discovering"
            }),
            IndexProgressEvent::Indexing { corpus, n, total } => serde_json::json!({
                "event": "progress",
                "corpus": corpus,
                "phase": "indexing",
                "n": n,
                "total": total
            }),
            IndexProgressEvent::Committing { corpus, documents } => serde_json::json!({
                "event": "progress",
                "corpus": corpus,
                "phase": "committing",
                "documents": documents
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl IndexProgressReporter for NoProgress {
    fn report(&self, _event: IndexProgressEvent) {}
}

pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn IndexProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }
}
