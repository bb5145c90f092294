//! Failures of writes and conversions on `Value` trees.

use thiserror::Error;

use crate::Key;

/// Errors raised by writes to a [`Value`](crate::Value) tree.
#[derive(Debug, Error)]
pub enum ValueError {
    /// The path continues through a scalar.
    #[error("cannot set child '{key}' on a non-container value")]
    NotAContainer { key: Key },

    /// A name that is not a number was used to address an array.
    #[error("invalid array index: {key}")]
    InvalidIndex { key: Key },

    /// An array write more than one past the end.
    #[error("array index {index} out of bounds (length {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Conversion between a `Value` and a serde type failed.
    #[error("conversion failed: {0}")]
    Conversion(#[from] serde_json::Error),
}
