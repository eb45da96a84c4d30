//! General-purpose node with free-form state data.

use game_context::{GameContext, Value};
use std::collections::BTreeMap;
use tracing::debug;

use super::{Node, NodeCore};
use crate::error::Result;
use crate::persistence::{RecordReader, RecordWriter};

/// A node whose only domain state is a key/value map.
///
/// Grouping nodes, menus and simple story beats use this directly; richer
/// systems embed a [`NodeCore`] in their own type instead.
#[derive(Debug)]
pub struct StateNode {
    core: NodeCore,
    pub state_data: BTreeMap<String, Value>,
    /// Terminal state of its system (e.g. a finished quest).
    pub accepting: bool,
}

impl StateNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core: NodeCore::new(name),
            state_data: BTreeMap::new(),
            accepting: false,
        }
    }

    pub fn accepting(mut self) -> Self {
        self.accepting = true;
        self
    }

    pub fn with_state(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.state_data.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state_data.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.state_data.insert(key.into(), value.into());
    }
}

impl Node for StateNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        "state"
    }

    fn on_enter(&mut self, _ctx: &mut GameContext) {
        debug!(node = %self.core.name, accepting = self.accepting, "entered node");
    }

    fn save_state(&self, out: &mut RecordWriter) -> Result<()> {
        out.write_bool(self.accepting)?;
        out.write_state_map(&self.state_data)
    }

    fn load_state(&mut self, input: &mut RecordReader<&[u8]>) -> Result<()> {
        let accepting = input.read_bool("accepting flag")?;
        let state_data = input.read_state_map()?;
        self.accepting = accepting;
        self.state_data = state_data;
        Ok(())
    }
}
