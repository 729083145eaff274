//! # autocomplete-tree
//!
//! Weighted prefix trees for autocompletion.
//!
//! Values are stored with a weight under a *prefix sequence*: the letters of
//! a word, the words of a sentence, the intervals of a melody. Queries return
//! every value whose prefix starts with the query, heaviest first.
//!
//! Two interchangeable backends implement [`Autocompleter`]:
//!
//! - [`SimplePrefixTree`]: one internal node per token.
//! - [`CompressedPrefixTree`]: runs of single-child nodes are merged into one
//!   node spanning several tokens.
//!
//! Internal nodes carry an aggregate of their children's weights, either the
//! [`Aggregation::Sum`] or the value-count-weighted [`Aggregation::Average`].
//!
//! ## Example
//!
//! ```rust
//! use autocomplete_tree::{Aggregation, Autocompleter, CompressedPrefixTree};
//!
//! let mut tree = CompressedPrefixTree::new(Aggregation::Sum);
//! tree.insert("cat", 3.0, &['c', 'a', 't']).unwrap();
//! tree.insert("car", 2.0, &['c', 'a', 'r']).unwrap();
//! tree.insert("dog", 5.0, &['d', 'o', 'g']).unwrap();
//!
//! assert_eq!(
//!     tree.autocomplete(&['c'], None).unwrap(),
//!     vec![(&"cat", 3.0), (&"car", 2.0)]
//! );
//! assert_eq!(tree.remove(&['c']), 2);
//! assert_eq!(tree.len(), 1);
//! ```

#![warn(clippy::all)]

mod compressed;
mod config;
pub mod engine;
mod error;
mod node;
mod registry;
mod simple;

pub use compressed::CompressedPrefixTree;
pub use config::{Aggregation, Backend, Config, DEFAULT_MAX_PREFIX_LEN};
pub use error::{Error, Result};
pub use simple::SimplePrefixTree;

/// A store of weighted values, each reachable by a prefix sequence of `T`s.
///
/// Values are compared by equality: inserting a value that is already present
/// adds to its weight instead of storing it twice.
pub trait Autocompleter<V, T> {
    /// Number of distinct values stored.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert `value` with `weight` under `prefix`.
    ///
    /// If `value` is already stored its weight grows by `weight`; it must then
    /// be inserted under the same prefix as the first time.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidWeight`] unless `weight` is finite and positive,
    /// [`Error::PrefixMismatch`] if `value` is stored under another prefix,
    /// [`Error::PrefixTooLong`] past the configured maximum length.
    fn insert(&mut self, value: V, weight: f64, prefix: &[T]) -> Result<()>;

    /// Values whose prefix starts with `prefix`, heaviest first.
    ///
    /// Equal weights are returned in insertion order. At most `limit` results
    /// are returned when a limit is given; an empty `prefix` matches every
    /// value.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLimit`] when `limit` is `Some(0)`.
    fn autocomplete(&self, prefix: &[T], limit: Option<usize>) -> Result<Vec<(&V, f64)>>;

    /// Remove every value whose prefix starts with `prefix`, returning how
    /// many were removed.
    fn remove(&mut self, prefix: &[T]) -> usize;
}


#[cfg(test)]
mod proptests;
