//! Ingestion engines that load autocompleters from text files.
//!
//! Each engine owns the tree and decides what a value and its prefix are:
//!
//! - [`LetterEngine`]: one string per line, prefixed by its characters.
//! - [`SentenceEngine`]: `text,weight` records, prefixed by their words.
//! - [`MelodyEngine`]: `name,pitch,duration,...` records, prefixed by the
//!   intervals between successive pitches.

mod melody;
mod text;

use std::io;
use std::mem;

use thiserror::Error;

use crate::{Aggregation, Backend, Config, DEFAULT_MAX_PREFIX_LEN};

pub use melody::{Melody, MelodyEngine, Note};
pub use text::{LetterEngine, SentenceEngine};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Tree(#[from] crate::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Which tree an engine builds and how it aggregates weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    pub backend: Backend,
    pub aggregation: Aggregation,
    /// Longest prefix stored; longer records are skipped on load.
    pub max_prefix_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            aggregation: Aggregation::default(),
            max_prefix_len: DEFAULT_MAX_PREFIX_LEN,
        }
    }
}

impl EngineConfig {
    /// Use `backend` for the engine's tree.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Aggregate internal weights with `aggregation`.
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Accept prefixes up to `max_prefix_len` tokens.
    pub fn with_max_prefix_len(mut self, max_prefix_len: usize) -> Self {
        self.max_prefix_len = max_prefix_len;
        self
    }

    pub(crate) fn tree_config(&self) -> Config {
        Config::default()
            .with_aggregation(self.aggregation)
            .with_max_prefix_len(self.max_prefix_len)
    }
}

/// Log and count a record that could not be stored.
pub(crate) fn skip_record(line: usize, reason: &dyn std::fmt::Display, skipped: &mut usize) {
    tracing::warn!(line, %reason, "skipping record");
    *skipped += 1;
}

/// Lowercase `text` and drop everything but alphanumerics and spaces.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect()
}

/// Split one CSV record into its fields.
///
/// A field starting with `"` runs to the next lone `"`; inside it commas are
/// literal and `""` stands for one quote.
pub(crate) fn split_record(record: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = record.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    quoted = false;
                }
            }
            '"' if field.is_empty() => quoted = true,
            ',' if !quoted => fields.push(mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}
