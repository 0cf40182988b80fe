//! Configuration bundle applied when declaring or updating a state.

use std::fmt;

use crate::core::rule::Rule;
use crate::core::state::Callback;

/// Rules and callbacks to install on a state, in one value.
///
/// Options are a pure input: the machine copies the fields into the
/// target state when they are applied and never aliases the bundle
/// afterward. Rules are *merged* into the state's existing list; the
/// enter/exit callbacks are *replaced wholesale*, so a bundle without a
/// callback clears any previously installed one.
///
/// # Example
///
/// ```rust
/// use stagehand::{StateMachine, StateOptions};
///
/// let mut machine = StateMachine::new();
/// machine.add_state(
///     "ready",
///     Some(
///         StateOptions::new()
///             .with_rules(["waiting_for_input"])
///             .on_enter(|| println!("ready to go")),
///     ),
/// );
/// ```
#[derive(Default)]
pub struct StateOptions {
    pub(crate) rules: Vec<Rule>,
    pub(crate) on_enter: Option<Callback>,
    pub(crate) on_exit: Option<Callback>,
}

impl StateOptions {
    /// Create an empty bundle: no rules, no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the condition tokens to merge into the state's rule list.
    pub fn with_rules<I>(mut self, conditions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Rule>,
    {
        self.rules = conditions.into_iter().map(Into::into).collect();
        self
    }

    /// Install a callback to run when the state is entered.
    pub fn on_enter<F>(mut self, callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.on_enter = Some(Box::new(callback));
        self
    }

    /// Install a callback to run when the state is exited.
    pub fn on_exit<F>(mut self, callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.on_exit = Some(Box::new(callback));
        self
    }

    /// The condition tokens carried by this bundle.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

impl fmt::Debug for StateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateOptions")
            .field("rules", &self.rules)
            .field("on_enter", &self.on_enter.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .finish()
    }
}
