//! Guarded edges between nodes.

use std::fmt;

use crate::input::Input;
use crate::node::NodeId;

/// Predicate deciding whether a rule accepts an input.
pub type Guard = Box<dyn Fn(&Input) -> bool>;

/// Programmatic key for a logical outcome of a node.
///
/// Domain handlers pick the rule for an outcome by tag, so a rule's `label`
/// can stay purely descriptive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransitionTag {
    Exit,
    Success,
    Failure,
    Advance,
    Named(String),
}

impl TransitionTag {
    pub fn named(name: impl Into<String>) -> Self {
        TransitionTag::Named(name.into())
    }
}

impl fmt::Display for TransitionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionTag::Exit => f.write_str("exit"),
            TransitionTag::Success => f.write_str("success"),
            TransitionTag::Failure => f.write_str("failure"),
            TransitionTag::Advance => f.write_str("advance"),
            TransitionTag::Named(name) => f.write_str(name),
        }
    }
}

/// An outgoing edge: guard, target and a human-readable label.
pub struct TransitionRule {
    guard: Guard,
    /// Non-owning handle into the controller's registry.
    pub target: NodeId,
    pub label: String,
    pub tag: Option<TransitionTag>,
}

impl TransitionRule {
    pub fn new<F>(guard: F, target: NodeId, label: impl Into<String>) -> Self
    where
        F: Fn(&Input) -> bool + 'static,
    {
        Self {
            guard: Box::new(guard),
            target,
            label: label.into(),
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: TransitionTag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn matches(&self, input: &Input) -> bool {
        (self.guard)(input)
    }
}

impl fmt::Debug for TransitionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionRule")
            .field("target", &self.target)
            .field("label", &self.label)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// Common guard constructors.
pub mod guard {
    use crate::input::Input;

    /// Accept any input of the given kind.
    pub fn on_kind(kind: &str) -> impl Fn(&Input) -> bool + 'static {
        let kind = kind.to_string();
        move |input| input.kind == kind
    }

    /// Accept `{kind, action: <action>}` inputs.
    pub fn on_action(kind: &str, action: &str) -> impl Fn(&Input) -> bool + 'static {
        let kind = kind.to_string();
        let action = action.to_string();
        move |input| input.kind == kind && input.param_str("action") == Some(action.as_str())
    }

    /// Accept every input.
    pub fn always() -> impl Fn(&Input) -> bool + 'static {
        |_| true
    }

    /// Reject every input; for rules only ever selected by tag.
    pub fn never() -> impl Fn(&Input) -> bool + 'static {
        |_| false
    }
}
