//! Error types for sharded search

use thiserror::Error;

/// Errors raised by the shard manager, query engine and local indexes.
///
/// Every variant signals a precondition violation or a device failure at
/// the point it happens. None of them are retryable.
#[derive(Error, Debug)]
pub enum ShardError {
    /// Invalid device count, capacity or dimension at construction
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Adding `requested` vectors would overflow the aggregate device capacity
    #[error("capacity exceeded: cannot add {requested} vectors, only {available} slots left")]
    CapacityExceeded { requested: usize, available: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no vectors have been added to the index")]
    EmptyIndex,

    /// A device-local index failed
    #[error("device {device}: {message}")]
    Backend { device: usize, message: String },
}

pub type Result<T> = std::result::Result<T, ShardError>;
