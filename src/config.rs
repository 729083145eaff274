//! Tree-wide configuration: how aggregate weights are computed, which backend
//! to build, and how long a prefix may be.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use crate::{Autocompleter, CompressedPrefixTree, Error, SimplePrefixTree};

/// Upper bound on prefix length unless configured otherwise.
///
/// Both trees recurse once per internal node on the insertion path, and the
/// simple tree has one internal node per token.
pub const DEFAULT_MAX_PREFIX_LEN: usize = 1024;

/// How an internal node's weight is derived from its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Aggregation {
    /// Plain total of the children's weights.
    #[default]
    Sum,
    /// Children's weights averaged by the number of values each one holds.
    Average,
}

impl Aggregation {
    /// Aggregate weight of a node whose children have the given
    /// `(weight, value count)` pairs.
    ///
    /// Averaging over zero values yields `0.0`.
    pub(crate) fn combine(self, children: impl IntoIterator<Item = (f64, usize)>) -> f64 {
        match self {
            Aggregation::Sum => children.into_iter().map(|(weight, _)| weight).sum(),
            Aggregation::Average => {
                let (total, count) = children
                    .into_iter()
                    .fold((0.0, 0usize), |(total, count), (weight, len)| {
                        (total + weight * len as f64, count + len)
                    });
                if count == 0 {
                    0.0
                } else {
                    total / count as f64
                }
            }
        }
    }
}

impl FromStr for Aggregation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sum" => Ok(Aggregation::Sum),
            "average" => Ok(Aggregation::Average),
            other => Err(Error::UnknownAggregation(other.to_string())),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Aggregation::Sum => "sum",
            Aggregation::Average => "average",
        })
    }
}

/// Which prefix tree implementation backs an [`Autocompleter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Backend {
    /// One node per token; see [`SimplePrefixTree`].
    Simple,
    /// Single-child chains collapsed; see [`CompressedPrefixTree`].
    #[default]
    Compressed,
}

impl Backend {
    /// Build an empty autocompleter of this kind.
    pub fn build<V, T>(self, config: Config) -> Box<dyn Autocompleter<V, T>>
    where
        V: Clone + Eq + Hash + 'static,
        T: Clone + Eq + 'static,
    {
        match self {
            Backend::Simple => Box::new(SimplePrefixTree::with_config(config)),
            Backend::Compressed => Box::new(CompressedPrefixTree::with_config(config)),
        }
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(Backend::Simple),
            "compressed" => Ok(Backend::Compressed),
            other => Err(Error::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Simple => "simple",
            Backend::Compressed => "compressed",
        })
    }
}

/// Configuration shared by both prefix trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Aggregation used for every internal node of the tree.
    pub aggregation: Aggregation,
    /// Longest prefix accepted by `insert`.
    pub max_prefix_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aggregation: Aggregation::default(),
            max_prefix_len: DEFAULT_MAX_PREFIX_LEN,
        }
    }
}

impl Config {
    /// Aggregate internal weights with `aggregation`.
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Reject prefixes longer than `max_prefix_len` tokens.
    pub fn with_max_prefix_len(mut self, max_prefix_len: usize) -> Self {
        self.max_prefix_len = max_prefix_len;
        self
    }
}

impl From<Aggregation> for Config {
    fn from(aggregation: Aggregation) -> Self {
        Config::default().with_aggregation(aggregation)
    }
}
