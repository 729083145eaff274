use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use super::{skip_record, split_record, EngineConfig, EngineError};
use crate::{Autocompleter, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Note {
    pub pitch: i32,
    pub duration: u32,
}

/// A named sequence of notes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Melody {
    pub name: String,
    pub notes: Vec<Note>,
}

impl Melody {
    /// A melody called `name` playing `notes` in order.
    pub fn new(name: impl Into<String>, notes: Vec<Note>) -> Self {
        Self {
            name: name.into(),
            notes,
        }
    }

    /// Pitch change from each note to the next. Empty for fewer than two
    /// notes.
    pub fn intervals(&self) -> Vec<i32> {
        self.notes
            .windows(2)
            .map(|pair| pair[1].pitch - pair[0].pitch)
            .collect()
    }
}

impl fmt::Display for Melody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} notes)", self.name, self.notes.len())
    }
}

fn parse_field<N>(line: usize, what: &str, field: &str) -> Result<N, EngineError>
where
    N: FromStr,
    N::Err: fmt::Display,
{
    field.trim().parse().map_err(|e| EngineError::Parse {
        line,
        message: format!("invalid {what} {field:?}: {e}"),
    })
}

/// Parse a `name,pitch,duration,...` record, stopping at the first blank
/// entry. `None` when there is no name or no complete note.
fn parse_melody(line: usize, record: &str) -> Result<Option<Melody>, EngineError> {
    let mut fields = split_record(record).into_iter();
    let name = match fields.next() {
        Some(name) if !name.trim().is_empty() => name,
        _ => return Ok(None),
    };

    let mut notes = Vec::new();
    while let (Some(pitch), Some(duration)) = (fields.next(), fields.next()) {
        if pitch.trim().is_empty() || duration.trim().is_empty() {
            break;
        }
        notes.push(Note {
            pitch: parse_field(line, "pitch", &pitch)?,
            duration: parse_field(line, "duration", &duration)?,
        });
    }

    if notes.is_empty() {
        return Ok(None);
    }
    Ok(Some(Melody::new(name, notes)))
}

/// Suggests melodies from the intervals of their opening notes.
///
/// Intervals ignore starting pitch and durations, so transposed or re-timed
/// melodies share a prefix.
pub struct MelodyEngine {
    tree: Box<dyn Autocompleter<Melody, i32>>,
    config: EngineConfig,
}

impl MelodyEngine {
    /// An empty engine built as `config` says.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            tree: config.backend.build(config.tree_config()),
            config,
        }
    }

    /// Load one melody per record, each with weight one.
    ///
    /// # Errors
    ///
    /// [`EngineError::Parse`] when a pitch or duration before the first blank
    /// entry is not an integer. Melodies the tree rejects are skipped.
    pub fn from_reader(reader: impl BufRead, config: EngineConfig) -> Result<Self, EngineError> {
        let mut engine = Self::new(config);
        let mut skipped = 0usize;
        for (idx, line) in reader.lines().enumerate() {
            match parse_melody(idx + 1, &line?)? {
                Some(melody) => {
                    if let Err(e) = engine.add(melody) {
                        skip_record(idx + 1, &e, &mut skipped);
                    }
                }
                None => skip_record(idx + 1, &"no named melody", &mut skipped),
            }
        }
        tracing::debug!(
            values = engine.len(),
            skipped,
            backend = %config.backend,
            "loaded melody engine"
        );
        Ok(engine)
    }

    /// [`Self::from_reader`] over the file at `path`.
    pub fn from_path(path: impl AsRef<Path>, config: EngineConfig) -> Result<Self, EngineError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), config)
    }

    /// Store `melody` under its intervals with weight one.
    pub fn add(&mut self, melody: Melody) -> Result<()> {
        let intervals = melody.intervals();
        self.tree.insert(melody, 1.0, &intervals)
    }

    /// Melodies whose intervals start with `intervals`, heaviest first.
    pub fn autocomplete(&self, intervals: &[i32], limit: Option<usize>) -> Result<Vec<(&Melody, f64)>> {
        self.tree.autocomplete(intervals, limit)
    }

    /// Remove every melody whose intervals start with `intervals`.
    pub fn remove(&mut self, intervals: &[i32]) -> usize {
        self.tree.remove(intervals)
    }

    /// Number of distinct melodies stored.
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
