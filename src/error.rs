use thiserror::Error;

/// Errors raised by the prefix trees when a caller breaks a precondition.
///
/// A call that returns an error leaves the tree exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Weights must be finite and strictly positive.
    #[error("invalid weight {0}: weights must be finite and greater than zero")]
    InvalidWeight(f64),

    /// `autocomplete` was asked for zero results.
    #[error("invalid limit: a result limit must be greater than zero")]
    InvalidLimit,

    /// A value already in the tree was inserted again under another prefix.
    #[error("value was first inserted under a prefix of length {stored_len}, got a different prefix of length {given_len}")]
    PrefixMismatch { stored_len: usize, given_len: usize },

    /// The prefix is longer than the configured maximum.
    #[error("prefix of length {len} exceeds the configured maximum of {max}")]
    PrefixTooLong { len: usize, max: usize },

    #[error("unknown aggregation {0:?}, expected \"sum\" or \"average\"")]
    UnknownAggregation(String),

    #[error("unknown backend {0:?}, expected \"simple\" or \"compressed\"")]
    UnknownBackend(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
