//! Error types for the sync module.

use thiserror::Error;

use setrecon_core::IbfError;

/// Errors that can occur while negotiating a difference.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Building, combining or parsing a filter failed.
    #[error("filter error: {0}")]
    Filter(#[from] IbfError),

    /// A summary producer failed to deliver.
    #[error("transport error: {0}")]
    TransportError(String),

    /// Timeout waiting for summaries.
    #[error("timeout: {0}")]
    Timeout(String),

    /// No level up to the maximum produced a complete decode.
    #[error("no complete decode up to level {max_level}")]
    LevelExhausted { max_level: u32 },

    /// A recovered item could not be turned back into a domain value.
    #[error("could not deserialize item: {0}")]
    Deserialize(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
