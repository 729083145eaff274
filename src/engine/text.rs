use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{sanitize, skip_record, split_record, EngineConfig, EngineError};
use crate::{Autocompleter, Result};

/// Suggests lines of text from their first few characters.
pub struct LetterEngine {
    tree: Box<dyn Autocompleter<String, char>>,
    config: EngineConfig,
}

impl LetterEngine {
    /// An empty engine built as `config` says.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            tree: config.backend.build(config.tree_config()),
            config,
        }
    }

    /// Load one value per line. The same line seen twice is stored once with
    /// twice the weight. Lines the tree rejects are skipped.
    pub fn from_reader(reader: impl BufRead, config: EngineConfig) -> Result<Self, EngineError> {
        let mut engine = Self::new(config);
        let mut skipped = 0usize;
        for (idx, line) in reader.lines().enumerate() {
            match engine.add(&line?) {
                Ok(true) => {}
                Ok(false) => skip_record(idx + 1, &"no alphanumerics", &mut skipped),
                Err(e) => skip_record(idx + 1, &e, &mut skipped),
            }
        }
        tracing::debug!(
            values = engine.len(),
            skipped,
            backend = %config.backend,
            "loaded letter engine"
        );
        Ok(engine)
    }

    /// [`Self::from_reader`] over the file at `path`.
    pub fn from_path(path: impl AsRef<Path>, config: EngineConfig) -> Result<Self, EngineError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), config)
    }

    /// Store the sanitized `text` with weight one. Returns `false` when
    /// nothing alphanumeric is left to store.
    pub fn add(&mut self, text: &str) -> Result<bool> {
        let clean = sanitize(text);
        if !clean.chars().any(char::is_alphanumeric) {
            return Ok(false);
        }
        let prefix: Vec<char> = clean.chars().collect();
        self.tree.insert(clean, 1.0, &prefix)?;
        Ok(true)
    }

    /// Stored lines starting with the sanitized `query`, heaviest first.
    pub fn autocomplete(&self, query: &str, limit: Option<usize>) -> Result<Vec<(&str, f64)>> {
        let prefix: Vec<char> = sanitize(query).chars().collect();
        let found = self.tree.autocomplete(&prefix, limit)?;
        Ok(found.into_iter().map(|(v, w)| (v.as_str(), w)).collect())
    }

    /// Remove every line starting with the sanitized `query`.
    pub fn remove(&mut self, query: &str) -> usize {
        let prefix: Vec<char> = sanitize(query).chars().collect();
        self.tree.remove(&prefix)
    }

    /// Number of distinct values stored.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

fn words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Digits and dots of `field`, read as a finite positive weight.
fn parse_weight(field: &str) -> Option<f64> {
    let digits: String = field
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits
        .parse()
        .ok()
        .filter(|weight: &f64| weight.is_finite() && *weight > 0.0)
}

/// Suggests sentences from their first few words.
pub struct SentenceEngine {
    tree: Box<dyn Autocompleter<String, String>>,
    config: EngineConfig,
}

impl SentenceEngine {
    /// An empty engine built as `config` says.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            tree: config.backend.build(config.tree_config()),
            config,
        }
    }

    /// Load `text,weight` records, one per line.
    ///
    /// Records without words, without a finite positive weight, or rejected
    /// by the tree are skipped.
    pub fn from_reader(reader: impl BufRead, config: EngineConfig) -> Result<Self, EngineError> {
        let mut engine = Self::new(config);
        let mut skipped = 0usize;
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let fields = split_record(&line);
            let weight = fields.get(1).and_then(|f| parse_weight(f));
            match (fields.first(), weight) {
                (Some(text), Some(weight)) => match engine.add(text, weight) {
                    Ok(true) => {}
                    Ok(false) => skip_record(idx + 1, &"no words", &mut skipped),
                    Err(e) => skip_record(idx + 1, &e, &mut skipped),
                },
                _ => skip_record(idx + 1, &"no usable weight", &mut skipped),
            }
        }
        tracing::debug!(
            values = engine.len(),
            skipped,
            backend = %config.backend,
            "loaded sentence engine"
        );
        Ok(engine)
    }

    /// [`Self::from_reader`] over the file at `path`.
    pub fn from_path(path: impl AsRef<Path>, config: EngineConfig) -> Result<Self, EngineError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), config)
    }

    /// Store the sanitized `text` under its words. Returns `false` when it
    /// has no words.
    ///
    /// # Errors
    ///
    /// [`crate::Error::InvalidWeight`] unless `weight` is finite and positive.
    pub fn add(&mut self, text: &str, weight: f64) -> Result<bool> {
        let clean = sanitize(text);
        let prefix = words(&clean);
        if prefix.is_empty() {
            return Ok(false);
        }
        self.tree.insert(clean, weight, &prefix)?;
        Ok(true)
    }

    /// Stored sentences starting with the words of `query`, heaviest first.
    pub fn autocomplete(&self, query: &str, limit: Option<usize>) -> Result<Vec<(&str, f64)>> {
        let found = self.tree.autocomplete(&words(&sanitize(query)), limit)?;
        Ok(found.into_iter().map(|(v, w)| (v.as_str(), w)).collect())
    }

    /// Remove every sentence starting with the words of `query`.
    pub fn remove(&mut self, query: &str) -> usize {
        self.tree.remove(&words(&sanitize(query)))
    }

    /// Number of distinct values stored.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
