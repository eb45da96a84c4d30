//! Presentable choices and the inputs they generate.

use std::fmt;
use std::rc::Rc;

use crate::input::Input;

/// A choice offered to the player, paired with the input it would send.
///
/// Actions are computed on demand by [`crate::Node::available_actions`] and
/// should not be cached: eligibility depends on the current game context.
#[derive(Clone)]
pub struct Action {
    pub id: String,
    pub label: String,
    generator: Rc<dyn Fn() -> Input>,
}

impl Action {
    pub fn new<F>(id: impl Into<String>, label: impl Into<String>, generator: F) -> Self
    where
        F: Fn() -> Input + 'static,
    {
        Self {
            id: id.into(),
            label: label.into(),
            generator: Rc::new(generator),
        }
    }

    /// An action that always emits a copy of `input`.
    pub fn emitting(id: impl Into<String>, label: impl Into<String>, input: Input) -> Self {
        Self::new(id, label, move || input.clone())
    }

    /// Produce the input this action sends when selected.
    pub fn generate(&self) -> Input {
        (self.generator)()
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
