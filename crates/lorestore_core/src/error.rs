//! Error types for LoreStore core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in LoreStore core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Durable storage error.
    #[error("storage error: {0}")]
    Storage(#[from] lorestore_storage::StorageError),

    /// JSON codec error.
    #[error("codec error: {0}")]
    Codec(#[from] lorestore_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Undo requested with an empty undo stack.
    #[error("nothing to undo")]
    NothingToUndo,

    /// Redo requested with an empty redo stack.
    #[error("nothing to redo")]
    NothingToRedo,

    /// Node not found.
    #[error("node not found: {id}")]
    NodeNotFound {
        /// The id that was looked up.
        id: String,
    },

    /// Link not found.
    #[error("link not found: {id}")]
    LinkNotFound {
        /// The id that was looked up.
        id: String,
    },

    /// Group not found.
    #[error("group not found: {id}")]
    GroupNotFound {
        /// The id that was looked up.
        id: String,
    },

    /// A node pair that cannot be suppressed.
    #[error("invalid pair: {a} / {b}")]
    InvalidPair {
        /// First id.
        a: String,
        /// Second id.
        b: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// Another store holds the data directory.
    #[error("store locked: another process has exclusive access")]
    StoreLocked,

    /// Store is closed.
    #[error("store is closed")]
    StoreClosed,
}

impl CoreError {
    /// Creates a node not found error.
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Creates a link not found error.
    pub fn link_not_found(id: impl Into<String>) -> Self {
        Self::LinkNotFound { id: id.into() }
    }

    /// Creates a group not found error.
    pub fn group_not_found(id: impl Into<String>) -> Self {
        Self::GroupNotFound { id: id.into() }
    }

    /// Creates an invalid pair error.
    pub fn invalid_pair(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::InvalidPair {
            a: a.into(),
            b: b.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true for the empty-history conditions, which callers show to
    /// users rather than treat as failures.
    #[must_use]
    pub fn is_empty_history(&self) -> bool {
        matches!(self, Self::NothingToUndo | Self::NothingToRedo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_messages() {
        assert_eq!(CoreError::NothingToUndo.to_string(), "nothing to undo");
        assert_eq!(CoreError::NothingToRedo.to_string(), "nothing to redo");
        assert!(CoreError::NothingToRedo.is_empty_history());
        assert!(!CoreError::StoreClosed.is_empty_history());
    }

    #[test]
    fn storage_errors_convert() {
        let err: CoreError = lorestore_storage::StorageError::from(io::Error::new(
            io::ErrorKind::Other,
            "disk gone",
        ))
        .into();
        assert!(matches!(err, CoreError::Storage(_)));
    }
}
