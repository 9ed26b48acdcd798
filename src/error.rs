//! Error handling for index and collection operations.
//!
//! Every fallible public API returns [`Result`]. Only the registry and the
//! configuration layer can fail; the collection primitives themselves are
//! infallible.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors raised by the index layer.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A query named a key that has no registered index.
    ///
    /// Recoverable: the caller is expected to fall back to a full scan.
    #[error("no index defined for key `{key}` (indexed keys: {})", format_keys(.known))]
    MissingIndex {
        /// The requested key.
        key: String,
        /// Keys that are currently indexed, sorted.
        known: Vec<String>,
    },

    /// `create_index` was called for a key that is already indexed.
    #[error("index already exists for key `{key}`")]
    IndexAlreadyExists {
        /// The duplicate key.
        key: String,
    },

    /// A write permit issued by another lock was presented to a mutation.
    #[error("write permit does not belong to this structure's write lock")]
    ForeignPermit,

    /// Invalid argument or configuration value.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),

    /// Configuration file could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error while loading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_keys(keys: &[String]) -> String {
    if keys.is_empty() {
        "none".to_owned()
    } else {
        keys.join(", ")
    }
}
