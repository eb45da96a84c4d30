//! # Automaton Core
//!
//! A hierarchical state-machine engine for driving a text RPG. Game and
//! narrative state live in [`Node`]s registered with a [`Controller`]; each
//! named system (weather, crime, a quest line, ...) keeps its own cursor into
//! the node graph and advances it by feeding [`Input`]s through the current
//! node's transition rules.
//!
//! ## Core Components
//!
//! - **node**: the [`Node`] trait, [`NodeCore`] and the generic [`StateNode`]
//! - **transition**: guarded, optionally tagged edges between nodes
//! - **controller**: registry, per-system cursors and save/restore
//! - **persistence**: the bounded binary save format
//! - **systems**: reference domain nodes (weather, bounty office)
//!
//! ## Example
//!
//! ```
//! use automaton_core::{guard, Controller, Input, Outcome, StateNode};
//!
//! let mut controller = Controller::new();
//! let a = controller.create_node(StateNode::new("A"));
//! let b = controller.create_node(StateNode::new("B"));
//! controller.add_transition(a, guard::on_kind("go"), b, "go").unwrap();
//! controller.set_system_root("Demo", a).unwrap();
//!
//! let outcome = controller.process_input("Demo", &Input::new("go"));
//! assert_eq!(outcome, Outcome::Transitioned { from: a, to: b });
//! ```

pub mod action;
pub mod config;
pub mod controller;
pub mod error;
pub mod input;
pub mod logging;
pub mod node;
pub mod persistence;
pub mod systems;
pub mod transition;

pub use action::Action;
pub use config::{EngineConfig, LoggingConfig, PersistenceConfig};
pub use controller::{Controller, GraphIssue, Outcome};
pub use error::{EngineError, Result};
pub use input::Input;
pub use node::{Node, NodeCore, NodeId, Resolution, StateNode};
pub use transition::{guard, TransitionRule, TransitionTag};
