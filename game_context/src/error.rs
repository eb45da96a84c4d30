//! Error types for the shared game context.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Item not in inventory: {0}")]
    UnknownItem(String),

    #[error("Not enough {item}: requested {requested}, have {available}")]
    InsufficientQuantity {
        item: String,
        requested: u32,
        available: u32,
    },

    /// The context could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ContextError>;
