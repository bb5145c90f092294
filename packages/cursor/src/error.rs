//! Error types for cursor construction and commits.

use thiserror::Error;

/// A boxed error raised by a tree or a caller-supplied closure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by options construction and cursor operations.
///
/// The first four variants are raised only while building options. The
/// remaining ones carry failures from the persistent tree or from closures
/// the caller installed; the cursor itself never retries or recovers.
#[derive(Debug, Error)]
pub enum Error {
    /// No configuration was supplied at all.
    #[error("expected options to be a map, but no options were supplied")]
    MissingOptions,

    /// The configuration is neither a map nor an already-built options record.
    #[error("expected options to be a map, found {found}")]
    InvalidOptionsType { found: &'static str },

    /// The configuration is a collection, but not a map-like one.
    #[error("expected options to be a map-like collection, found {found}")]
    InvalidConfigurationType { found: &'static str },

    /// No value is present at `root.data`.
    #[error("value at path ['root', 'data'] is required")]
    MissingRootData,

    /// A configuration field has a value of the wrong shape.
    #[error("invalid option '{field}': {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    /// The tree rejected a write or a delete.
    #[error("accessor failed: {0}")]
    Accessor(#[source] BoxError),

    /// A caller-supplied closure (update hook, fallible updater) failed.
    #[error("callback failed: {0}")]
    Callback(#[source] BoxError),
}

impl Error {
    /// Wrap an error raised by the tree.
    pub fn accessor(err: impl Into<BoxError>) -> Self {
        Error::Accessor(err.into())
    }

    /// Wrap an error raised by a caller-supplied closure.
    pub fn callback(err: impl Into<BoxError>) -> Self {
        Error::Callback(err.into())
    }

    /// Returns true for the errors that can only happen while building options.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Error::MissingOptions
                | Error::InvalidOptionsType { .. }
                | Error::InvalidConfigurationType { .. }
                | Error::MissingRootData
                | Error::InvalidField { .. }
        )
    }
}

/// Result type alias for cursor operations.
pub type Result<T> = std::result::Result<T, Error>;
