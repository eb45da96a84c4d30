//! Nodes - the units of game and narrative state.
//!
//! Every node embeds a [`NodeCore`] holding its name, children and outgoing
//! rules, and implements [`Node`] for its domain behavior. Transition
//! evaluation is two-tier: a node may recognize domain verbs itself and pick
//! a rule by [`TransitionTag`], and otherwise falls back explicitly to
//! [`NodeCore::match_rules`], which applies guards in registration order.

mod state;

pub use state::StateNode;

use game_context::GameContext;
use std::any::Any;
use std::fmt;
use tracing::debug;

use crate::action::Action;
use crate::error::Result;
use crate::input::Input;
use crate::persistence::{RecordReader, RecordWriter};
use crate::transition::{TransitionRule, TransitionTag};

/// Input kind emitted by the default per-rule actions.
pub const GENERIC_TRANSITION: &str = "transition";

/// Stable handle to a node in a controller's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of asking a node to handle an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The input does not apply to this node.
    Unhandled,
    /// Handled in place; the cursor does not move.
    Stay,
    MoveTo(NodeId),
}

impl From<Option<NodeId>> for Resolution {
    fn from(target: Option<NodeId>) -> Self {
        target.map_or(Resolution::Unhandled, Resolution::MoveTo)
    }
}

/// State and behavior shared by every node type.
#[derive(Debug)]
pub struct NodeCore {
    pub name: String,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) rules: Vec<TransitionRule>,
    /// Times the cursor has entered this node. Maintained by the controller.
    pub(crate) visits: u32,
}

impl NodeCore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            parent: None,
            rules: Vec::new(),
            visits: 0,
        }
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn rules(&self) -> &[TransitionRule] {
        &self.rules
    }

    pub fn visits(&self) -> u32 {
        self.visits
    }

    pub fn add_rule(&mut self, rule: TransitionRule) {
        self.rules.push(rule);
    }

    /// Generic fallback: the first rule, in registration order, whose guard
    /// accepts `input`. A `transition` input with an `index` is also accepted
    /// by the rule at that index, but never ahead of an earlier rule.
    pub fn match_rules(&self, input: &Input) -> Option<NodeId> {
        let selected = if input.is(GENERIC_TRANSITION) {
            input
                .param_int("index")
                .and_then(|i| usize::try_from(i).ok())
        } else {
            None
        };
        self.rules
            .iter()
            .enumerate()
            .find(|(i, rule)| selected == Some(*i) || rule.matches(input))
            .map(|(_, rule)| rule.target)
    }

    /// First rule carrying `tag`, in registration order.
    pub fn rule_by_tag(&self, tag: &TransitionTag) -> Option<&TransitionRule> {
        self.rules.iter().find(|rule| rule.tag.as_ref() == Some(tag))
    }

    pub fn target_for(&self, tag: &TransitionTag) -> Option<NodeId> {
        self.rule_by_tag(tag).map(|rule| rule.target)
    }

    /// First rule whose label contains `keyword`. Diagnostics only; dispatch
    /// should go through [`NodeCore::rule_by_tag`].
    pub fn rule_by_label(&self, keyword: &str) -> Option<&TransitionRule> {
        self.rules.iter().find(|rule| rule.label.contains(keyword))
    }

    /// One action per rule, emitting a `transition` input with its index.
    pub fn default_actions(&self) -> Vec<Action> {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, rule)| {
                let index = i64::try_from(i).unwrap_or(i64::MAX);
                Action::emitting(
                    format!("transition_{i}"),
                    rule.label.clone(),
                    Input::new(GENERIC_TRANSITION).with_param("index", index),
                )
            })
            .collect()
    }
}

/// Behavior every node type plugs into the controller.
pub trait Node: AsAny {
    fn core(&self) -> &NodeCore;

    fn core_mut(&mut self) -> &mut NodeCore;

    /// Stable type name written into save records.
    fn kind(&self) -> &'static str;

    fn name(&self) -> &str {
        &self.core().name
    }

    /// Called once each time the cursor moves onto this node.
    fn on_enter(&mut self, _ctx: &mut GameContext) {
        debug!(node = %self.name(), "entered node");
    }

    /// Called once before the cursor leaves this node.
    fn on_exit(&mut self, _ctx: &mut GameContext) {
        debug!(node = %self.name(), "exited node");
    }

    /// Choices available right now. Never fails; empty means no choices.
    fn available_actions(&self, _ctx: &GameContext) -> Vec<Action> {
        self.core().default_actions()
    }

    /// Resolve `input` to an outgoing edge.
    ///
    /// Overrides handle their own verbs first and return
    /// `self.core().match_rules(input).into()` for anything else.
    fn evaluate_transition(&mut self, input: &Input, _ctx: &mut GameContext) -> Resolution {
        self.core().match_rules(input).into()
    }

    /// Write node-local state. Topology is never written.
    fn save_state(&self, _out: &mut RecordWriter) -> Result<()> {
        Ok(())
    }

    /// Restore node-local state written by [`Node::save_state`].
    fn load_state(&mut self, _input: &mut RecordReader<&[u8]>) -> Result<()> {
        Ok(())
    }
}

/// Downcasting support for registered nodes.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
