//! Error handling for container and query boundaries.
//!
//! The hash table, the lookup table and the sorter never produce errors for
//! well-typed input. Every error below originates at a container or query
//! operation that validated its arguments or its contents.

use thiserror::Error;

/// Errors raised by strict container and query operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An argument was outside the range the operation accepts.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument
        message: String,
    },

    /// A strict insert found the key already present.
    #[error("an item with the same key has already been added")]
    DuplicateKey,

    /// A strict lookup did not find the key.
    #[error("the given key was not present")]
    KeyNotFound,

    /// The operation needs at least one element.
    #[error("sequence contains no elements")]
    EmptyCollection,

    /// A positional accessor was given an index outside `[0, len)`.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The rejected index
        index: usize,
        /// The number of elements available
        len: usize,
    },

    /// A value could not be converted to a primitive for comparison.
    #[error("conversion failed: {message}")]
    Conversion {
        /// Why the conversion failed
        message: String,
    },
}

impl Error {
    /// Creates an [`Error::InvalidArgument`] with the given message.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an [`Error::Conversion`] with the given message.
    pub fn conversion(message: impl Into<String>) -> Self {
        Error::Conversion {
            message: message.into(),
        }
    }
}

/// Result type for fallible container and query operations.
pub type Result<T> = core::result::Result<T, Error>;
