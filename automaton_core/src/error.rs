//! Error types for the automaton engine.
//!
//! Inputs that a node does not handle and unknown system names are not
//! errors; they surface as [`crate::Outcome`] values. Everything here is a
//! real failure of a load, save, parse or graph-building operation.

use thiserror::Error;

use crate::node::NodeId;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Save file does not start with the expected magic bytes.
    #[error("Not a save file (bad magic)")]
    BadMagic,

    #[error("Unsupported save version: {0}")]
    UnsupportedVersion(u8),

    /// A declared length or count exceeds its sane maximum.
    #[error("Declared {field} of {declared} exceeds maximum {max}")]
    LengthExceeded {
        field: &'static str,
        declared: u64,
        max: u64,
    },

    /// Data ended before a field could be read.
    #[error("Unexpected end of data while reading {0}")]
    Truncated(&'static str),

    /// Structurally invalid record contents.
    #[error("Corrupt save data: {0}")]
    Corrupt(String),

    /// A record was written by a different node type than the one registered.
    #[error("Record for '{node}' has kind '{found}', expected '{expected}'")]
    KindMismatch {
        node: String,
        expected: String,
        found: String,
    },

    /// A value could not be written because it exceeds the save limits.
    #[error("Cannot save {field}: length {len} exceeds maximum {max}")]
    Oversized {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Node {0} is not registered with this controller")]
    UnknownNode(NodeId),

    /// Adding this child would give it a second parent or create a cycle.
    #[error("Cannot attach {child} under {parent}: {reason}")]
    InvalidHierarchy {
        parent: NodeId,
        child: NodeId,
        reason: &'static str,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<game_context::ContextError> for EngineError {
    fn from(err: game_context::ContextError) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, EngineError>;
