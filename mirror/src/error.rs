//! Error types for the mirror engine

use std::io;

use crate::path::{RelativeId, Root};

/// Result type alias for mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Error type for mirror operations
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// Two source trees contain a file at the same relative path
    #[error(
        "Could not copy directories '{first_source}' and '{second_source}' to '{target}'. \
         Both source directories contain file '{relative_id}'."
    )]
    Conflict {
        first_source: Root,
        second_source: Root,
        target: Root,
        relative_id: RelativeId,
    },

    /// Storage-level failure
    #[error("{operation} failed at '{path}': {source}")]
    Io {
        operation: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },

    /// A location could not be expressed relative to its root
    #[error("Path error at '{path}': {message}")]
    Path { path: String, message: String },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MirrorError {
    /// Create a new storage I/O error
    pub fn io(operation: &'static str, path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Create a new path error
    pub fn path_error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Path {
            path: path.into(),
            message: message.into(),
        }
    }

    /// The underlying I/O error kind, if this is a storage failure
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }

    /// Whether this error is a cross-source conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
