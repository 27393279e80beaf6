//! Error types for setrecon core.

use thiserror::Error;

/// Errors that can occur while building, combining, or parsing filters.
#[derive(Debug, Error)]
pub enum IbfError {
    #[error("cannot merge IBF of different sizes: {local} and {other}")]
    SizeMismatch { local: usize, other: usize },

    /// The selector refused to place an item at this level.
    #[error("bucket selector is incompatible with level {level}")]
    SelectorIncompatible { level: u32 },

    #[error("bucket selector returned index {index} for a table of {size} buckets")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("level {level} exceeds the maximum supported level {max}")]
    LevelTooLarge { level: u32, max: u32 },

    #[error("cannot reduce a level {from} filter to level {to}")]
    InvalidReduction { from: u32, to: u32 },

    #[error("level {level} requires {expected} buckets, got {got}")]
    BucketCountMismatch {
        level: u32,
        expected: usize,
        got: usize,
    },

    #[error("malformed bucket: {0}")]
    MalformedBucket(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, IbfError>;
