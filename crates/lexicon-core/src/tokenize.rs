//! Term extraction shared by indexing and querying.
//!
//! The same [`tokenize`] function runs over document content, query text,
//! and document paths. Any divergence between index time and query time
//! would make similarity scores meaningless, so there is exactly one
//! implementation and no configuration.
//!
//! # Rules
//!
//! 1. Split on every character that is neither alphanumeric nor `_`.
//! 2. Trim leading/trailing `_` from each word and drop empty words.
//! 3. Drop words longer than [`MAX_TERM_LEN`] bytes.
//! 4. Emit the lower-cased word.
//! 5. If the word is a compound identifier (`snake_case`, `camelCase`,
//!    `PascalCase`, letter/digit transitions), also emit each lower-cased
//!    part, so `parseHttpRequest` matches queries for `http` as well as
//!    for the whole identifier.
//!
//! # Example
//!
//! ```rust
//! use lexicon_core::tokenize::tokenize;
//!
//! assert_eq!(
//!     tokenize("fn parseHttpRequest()"),
//!     vec!["fn", "parsehttprequest", "parse", "http", "request"],
//! );
//! ```

use crate::models::TermFrequencies;

/// Bumped whenever the rules above change. Indexes built with another
/// version are re-tokenized on the next maintenance pass.
pub const TOKENIZER_VERSION: u32 = 1;

/// Longest word, in bytes, that is kept as a term.
pub const MAX_TERM_LEN: usize = 64;

/// Split text into normalized terms, in order of appearance.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut terms = Vec::new();
    for word in text.split(|c: char| !(c.is_alphanumeric() || c == '_')) {
        push_word(word, &mut terms);
    }
    terms
}

/// Count occurrences of each term in `text`.
pub fn term_counts(text: &str) -> TermFrequencies {
    let mut counts = TermFrequencies::new();
    for term in tokenize(text) {
        *counts.entry(term).or_insert(0) += 1;
    }
    counts
}

fn push_word(word: &str, out: &mut Vec<String>) {
    let word = word.trim_matches('_');
    if word.is_empty() || word.len() > MAX_TERM_LEN {
        return;
    }

    out.push(word.to_lowercase());

    let parts = split_identifier(word);
    if parts.len() > 1 {
        out.extend(parts);
    }
}

/// Break a compound identifier into lower-cased parts.
///
/// Acronym runs stay together: `HTTPServer` → `http`, `server`.
fn split_identifier(word: &str) -> Vec<String> {
    let mut parts = Vec::new();

    for segment in word.split('_').filter(|s| !s.is_empty()) {
        let chars: Vec<char> = segment.chars().collect();
        let mut start = 0;

        for i in 1..chars.len() {
            let prev = chars[i - 1];
            let cur = chars[i];
            let next = chars.get(i + 1).copied();

            let boundary = (prev.is_lowercase() && cur.is_uppercase())
                || (prev.is_uppercase()
                    && cur.is_uppercase()
                    && next.is_some_and(|n| n.is_lowercase()))
                || prev.is_alphabetic() != cur.is_alphabetic();

            if boundary {
                parts.push(chars[start..i].iter().collect::<String>().to_lowercase());
                start = i;
            }
        }
        parts.push(chars[start..].iter().collect::<String>().to_lowercase());
    }

    parts
}
