//! # Game Context
//!
//! The shared state every gameplay system reads and writes: player stats,
//! inventory, world state and the weather vocabulary. This crate is the single
//! source of truth for game state and contains no state-machine logic.

pub mod context;
pub mod error;
pub mod inventory;
pub mod stats;
pub mod value;
pub mod weather;
pub mod world_state;

pub use context::*;
pub use error::ContextError;
pub use inventory::*;
pub use stats::*;
pub use value::*;
pub use weather::*;
pub use world_state::*;
