//! Value → prefix index kept alongside each tree.
//!
//! Leaves only know their value, so finding out whether a value already lives
//! somewhere else in the tree would otherwise take a full walk.

use std::collections::HashMap;
use std::hash::Hash;

use crate::{Error, Result};

#[derive(Clone, Debug)]
struct Entry<T> {
    prefix: Vec<T>,
    seq: u64,
}

#[derive(Clone, Debug)]
pub(crate) struct Registry<V, T> {
    entries: HashMap<V, Entry<T>>,
    next_seq: u64,
}

impl<V, T> Registry<V, T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_seq: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<V: Clone + Eq + Hash, T: Clone + Eq> Registry<V, T> {
    /// Validate an insertion and return the sequence number of `value`.
    ///
    /// New values are recorded under `prefix` and get a fresh sequence
    /// number. Nothing is recorded when validation fails.
    pub(crate) fn admit(
        &mut self,
        value: &V,
        weight: f64,
        prefix: &[T],
        max_prefix_len: usize,
    ) -> Result<u64> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(Error::InvalidWeight(weight));
        }
        if prefix.len() > max_prefix_len {
            return Err(Error::PrefixTooLong {
                len: prefix.len(),
                max: max_prefix_len,
            });
        }

        if let Some(entry) = self.entries.get(value) {
            if entry.prefix != prefix {
                return Err(Error::PrefixMismatch {
                    stored_len: entry.prefix.len(),
                    given_len: prefix.len(),
                });
            }
            return Ok(entry.seq);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            value.clone(),
            Entry {
                prefix: prefix.to_vec(),
                seq,
            },
        );
        Ok(seq)
    }

    pub(crate) fn forget(&mut self, values: &[V]) {
        for value in values {
            self.entries.remove(value);
        }
    }

    pub(crate) fn contains(&self, value: &V) -> bool {
        self.entries.contains_key(value)
    }
}
