//! Named states with rule lists and transition callbacks.

use std::fmt;

use crate::core::options::StateOptions;
use crate::core::rule::{eval_rules, Rule};

/// Type alias for enter/exit callbacks.
///
/// Callbacks are nullary, return nothing, and run synchronously on the
/// caller's stack during a transition. A panicking callback propagates
/// to whoever drove the transition; the state does not catch it.
pub type Callback = Box<dyn FnMut() + Send>;

/// A named entity owned by a state machine.
///
/// A state is a passive record: an immutable name, an ordered rule list
/// (duplicates permitted), and two optional callbacks invoked at
/// transition boundaries. It holds no transition logic of its own.
///
/// A state always satisfies the condition equal to its own name, in
/// addition to whatever its rule list satisfies.
///
/// # Example
///
/// ```rust
/// use stagehand::core::State;
///
/// let mut state = State::new("ready");
/// state.add_rules(["waiting_for_input"]);
///
/// assert!(state.check_rules("ready"));
/// assert!(state.check_rules("waiting_for_input"));
/// assert!(!state.check_rules("busy"));
/// ```
pub struct State {
    name: String,
    rules: Vec<Rule>,
    on_enter: Option<Callback>,
    on_exit: Option<Callback>,
}

impl State {
    /// Create a state with an empty rule list and no callbacks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
            on_enter: None,
            on_exit: None,
        }
    }

    /// The state's name. Never changes after creation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The state's rule list, in insertion order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Whether `condition` is satisfied by this state.
    ///
    /// True when `condition` equals the state's own name, or when the
    /// rule list satisfies it per [`eval_rules`].
    pub fn check_rules(&self, condition: &str) -> bool {
        condition == self.name || eval_rules(condition, &self.rules)
    }

    /// Append condition tokens to the rule list.
    ///
    /// Order is preserved and duplicates are kept. An empty input is a
    /// no-op.
    pub fn add_rules<I>(&mut self, conditions: I)
    where
        I: IntoIterator,
        I::Item: Into<Rule>,
    {
        self.rules.extend(conditions.into_iter().map(Into::into));
    }

    /// Remove the first occurrence of an exact-match token.
    ///
    /// The comparison is against the written token text, so removing
    /// `"!busy"` removes a negative rule over `busy`. Unknown tokens are
    /// a no-op.
    pub fn remove_rule(&mut self, condition: &str) {
        if let Some(index) = self.rules.iter().position(|r| r.matches_token(condition)) {
            self.rules.remove(index);
        }
    }

    /// Apply a configuration bundle to this state.
    ///
    /// Rules are merged in via [`add_rules`](Self::add_rules); both
    /// callbacks are replaced wholesale, so options carrying no callback
    /// clear any previously installed one.
    pub fn apply_options(&mut self, options: StateOptions) {
        self.add_rules(options.rules);
        self.on_enter = options.on_enter;
        self.on_exit = options.on_exit;
    }

    /// Run the enter callback, if one is installed.
    pub fn enter(&mut self) {
        if let Some(callback) = self.on_enter.as_mut() {
            callback();
        }
    }

    /// Run the exit callback, if one is installed.
    pub fn exit(&mut self) {
        if let Some(callback) = self.on_exit.as_mut() {
            callback();
        }
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("rules", &self.rules)
            .field("on_enter", &self.on_enter.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .finish()
    }
}
