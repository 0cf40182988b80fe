//! The state machine that owns and drives named states.

use std::collections::HashMap;
use std::fmt;

use chrono::Utc;
use tracing::{debug, trace};

use crate::core::{
    eval_rules, Rule, State, StateOptions, TransitionKind, TransitionLog, TransitionRecord,
};

/// Hook invoked with the name of each lazily created state.
pub type LazyCreateHook = Box<dyn FnMut(&str) + Send>;

/// A registry of named states with a current/previous pointer pair and
/// a table of machine-wide conditions.
///
/// States are created lazily, one per distinct name: requesting a name
/// that no existing state satisfies creates a fresh, inert state rather
/// than failing. This permissiveness is part of the contract: a typo
/// in a requested name silently becomes a new state that nothing else
/// ever satisfies. Use [`on_lazy_create`](Self::on_lazy_create) during
/// development to observe creations that were not intended.
///
/// A machine is a single-owner, strictly synchronous primitive: every
/// method runs to completion on the caller's stack, including the
/// enter/exit callbacks fired during a transition. For concurrent use,
/// put the whole machine behind one mutex.
///
/// # Example
///
/// ```rust
/// use stagehand::{StateMachine, StateOptions};
///
/// let mut machine = StateMachine::named("lobby");
/// machine.add_state(
///     "ready",
///     Some(StateOptions::new().with_rules(["waiting_for_input"])),
/// );
///
/// machine.update_state("ready", None);
/// assert!(machine.can("ready"));
/// assert!(machine.can("waiting_for_input"));
/// assert!(!machine.can("playing"));
///
/// machine.update_state("playing", None);
/// machine.revert_state();
/// assert_eq!(machine.current_state(), "ready");
/// assert_eq!(machine.previous_state(), "playing");
/// ```
pub struct StateMachine {
    name: String,
    states: Vec<State>,
    current: Option<usize>,
    previous: Option<usize>,
    global_conditions: HashMap<String, Vec<Rule>>,
    history: TransitionLog,
    lazy_create_hook: Option<LazyCreateHook>,
    destroyed: bool,
}

impl StateMachine {
    /// Create a machine with the default diagnostic name.
    pub fn new() -> Self {
        Self::named("State Machine")
    }

    /// Create a machine with a diagnostic name.
    ///
    /// The name labels log events and `Debug` output; it has no
    /// behavioral effect.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
            current: None,
            previous: None,
            global_conditions: HashMap::new(),
            history: TransitionLog::new(),
            lazy_create_hook: None,
            destroyed: false,
        }
    }

    /// The machine's diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a state, creating it if absent, and apply options to it.
    ///
    /// No transition happens. The lookup goes through the same lazy
    /// resolution as [`update_state`](Self::update_state), so the
    /// options may land on an existing state that satisfies `name` by
    /// rule rather than by its own name.
    pub fn add_state(&mut self, name: &str, options: Option<StateOptions>) {
        debug_assert!(!self.destroyed, "state machine used after destroy");
        if self.destroyed {
            return;
        }
        let index = self.state_index_or_create(name);
        if let Some(options) = options {
            self.states[index].apply_options(options);
        }
    }

    /// Transition to the state resolved from `name`.
    ///
    /// The target is resolved through lazy get-or-create resolution:
    /// the first state (in declaration order) satisfying `name` wins,
    /// and a fresh state is created when none does. Options, if given,
    /// are applied to the target before the transition.
    ///
    /// The transition itself: the old current state's `exit` callback
    /// runs (if a current state exists), the old current becomes
    /// `previous`, the target becomes current, and the target's `enter`
    /// callback runs unconditionally, also when the target *is* the
    /// old current. A fresh machine's very first update therefore runs
    /// one `enter` and no `exit`.
    ///
    /// Callback panics propagate to the caller; the machine does not
    /// catch them.
    pub fn update_state(&mut self, name: &str, options: Option<StateOptions>) {
        debug_assert!(!self.destroyed, "state machine used after destroy");
        if self.destroyed {
            return;
        }
        let index = self.state_index_or_create(name);
        if let Some(options) = options {
            self.states[index].apply_options(options);
        }
        self.transition_to(index, TransitionKind::Update);
    }

    /// Transition back to the previous state.
    ///
    /// Runs through the same exit/enter path as
    /// [`update_state`](Self::update_state), which re-sets `previous`
    /// to the state being replaced: two consecutive reverts ping-pong
    /// between the last two states rather than unwinding a stack. A
    /// no-op when no previous state exists.
    pub fn revert_state(&mut self) {
        debug_assert!(!self.destroyed, "state machine used after destroy");
        if self.destroyed {
            return;
        }
        if let Some(previous) = self.previous {
            self.transition_to(previous, TransitionKind::Revert);
        }
    }

    /// Whether `condition` is currently satisfied.
    ///
    /// True when a current state exists and either the current state
    /// satisfies the condition (by name or by its rules) or a global
    /// condition of that name does. Always false with no current state.
    pub fn can(&self, condition: &str) -> bool {
        match self.current {
            Some(current) => {
                self.states[current].check_rules(condition) || self.check_global_rules(condition)
            }
            None => false,
        }
    }

    /// Append condition tokens to the *current* state's rule list.
    ///
    /// A silent no-op when no state is current; call this only after at
    /// least one [`update_state`](Self::update_state).
    pub fn add_state_rule<I>(&mut self, conditions: I)
    where
        I: IntoIterator,
        I::Item: Into<Rule>,
    {
        debug_assert!(!self.destroyed, "state machine used after destroy");
        if self.destroyed {
            return;
        }
        match self.current {
            Some(current) => self.states[current].add_rules(conditions),
            None => trace!(machine = %self.name, "add_state_rule with no current state"),
        }
    }

    /// Set the rule list for a machine-wide condition.
    ///
    /// Replaces any previous list under `name` in full; it never
    /// appends.
    pub fn add_global_state_condition<I>(&mut self, name: impl Into<String>, conditions: I)
    where
        I: IntoIterator,
        I::Item: Into<Rule>,
    {
        debug_assert!(!self.destroyed, "state machine used after destroy");
        if self.destroyed {
            return;
        }
        self.global_conditions
            .insert(name.into(), conditions.into_iter().map(Into::into).collect());
    }

    /// Whether a global condition named `condition` is satisfied.
    ///
    /// Note the asymmetry with state-local checking: `condition`
    /// selects which rule list to evaluate, and the token tested
    /// against that list is the **current state's name** (the empty
    /// string when no state is current).
    pub fn check_global_rules(&self, condition: &str) -> bool {
        match self.global_conditions.get(condition) {
            Some(rules) => eval_rules(self.current_state(), rules),
            None => false,
        }
    }

    /// Name of the current state, or `""` when none.
    pub fn current_state(&self) -> &str {
        self.current.map_or("", |index| self.states[index].name())
    }

    /// Name of the previous state, or `""` when none.
    pub fn previous_state(&self) -> &str {
        self.previous.map_or("", |index| self.states[index].name())
    }

    /// Number of states the machine owns.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// The transition log.
    pub fn history(&self) -> &TransitionLog {
        &self.history
    }

    /// Install a hook observing lazy state creation.
    ///
    /// The hook runs with the requested name whenever a lookup creates
    /// a state instead of resolving an existing one. Intended as a
    /// development aid: a hook that panics or asserts turns silent
    /// typo-created states into immediate failures without changing the
    /// machine's permissive contract.
    pub fn on_lazy_create<F>(&mut self, hook: F)
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.lazy_create_hook = Some(Box::new(hook));
    }

    /// Tear the machine down.
    ///
    /// Clears the states, the global-condition table, both pointers,
    /// and the transition log. The machine must not be used afterward:
    /// further mutating calls are no-ops (asserted in debug builds) and
    /// queries report an empty machine.
    pub fn destroy(&mut self) {
        debug!(machine = %self.name, "destroy");
        self.states.clear();
        self.global_conditions.clear();
        self.current = None;
        self.previous = None;
        self.history.clear();
        self.lazy_create_hook = None;
        self.destroyed = true;
    }

    /// Resolve `name` to a state index, creating a state when nothing
    /// satisfies it.
    ///
    /// The scan runs in declaration order and uses full rule matching,
    /// so a lookup can resolve to a state whose *rules* satisfy `name`
    /// even though its own name differs.
    fn state_index_or_create(&mut self, name: &str) -> usize {
        if let Some(index) = self.states.iter().position(|s| s.check_rules(name)) {
            return index;
        }
        debug!(machine = %self.name, state = %name, "creating state");
        if let Some(hook) = self.lazy_create_hook.as_mut() {
            hook(name);
        }
        self.states.push(State::new(name));
        self.states.len() - 1
    }

    fn transition_to(&mut self, index: usize, kind: TransitionKind) {
        let from = match self.current {
            Some(current) => {
                self.states[current].exit();
                self.states[current].name().to_string()
            }
            None => String::new(),
        };
        self.previous = self.current;
        self.current = Some(index);
        self.states[index].enter();

        let to = self.states[index].name().to_string();
        debug!(machine = %self.name, %from, %to, ?kind, "transition");
        self.history.record(TransitionRecord {
            from,
            to,
            kind,
            timestamp: Utc::now(),
        });
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("name", &self.name)
            .field("states", &self.states)
            .field("current", &self.current_state())
            .field("previous", &self.previous_state())
            .field("global_conditions", &self.global_conditions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type CallLog = Arc<Mutex<Vec<String>>>;

    fn tracking_options(label: &str, calls: &CallLog) -> StateOptions {
        let label = label.to_string();
        let enter_label = label.clone();
        let enter_calls = Arc::clone(calls);
        let exit_calls = Arc::clone(calls);
        StateOptions::new()
            .on_enter(move || {
                enter_calls
                    .lock()
                    .unwrap()
                    .push(format!("{enter_label}.enter"))
            })
            .on_exit(move || exit_calls.lock().unwrap().push(format!("{label}.exit")))
    }

    #[test]
    fn distinct_names_create_distinct_states() {
        let mut machine = StateMachine::new();
        machine.add_state("ready", None);
        machine.add_state("playing", None);
        machine.update_state("playing_all", None);

        assert_eq!(machine.state_count(), 3);
    }

    #[test]
    fn redeclaring_a_name_reuses_the_state() {
        let mut machine = StateMachine::new();
        machine.add_state("ready", None);
        machine.add_state("ready", None);
        machine.update_state("ready", None);

        assert_eq!(machine.state_count(), 1);
    }

    #[test]
    fn first_transition_enters_without_exiting() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let mut machine = StateMachine::new();
        machine.add_state("ready", Some(tracking_options("ready", &calls)));

        machine.update_state("ready", None);

        assert_eq!(*calls.lock().unwrap(), vec!["ready.enter"]);
        assert_eq!(machine.current_state(), "ready");
        assert_eq!(machine.previous_state(), "");
    }

    #[test]
    fn transitions_exit_the_old_state_then_enter_the_new() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let mut machine = StateMachine::new();
        machine.add_state("a", Some(tracking_options("a", &calls)));
        machine.add_state("b", Some(tracking_options("b", &calls)));

        machine.update_state("a", None);
        machine.update_state("b", None);

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["a.enter", "a.exit", "b.enter"]
        );
    }

    #[test]
    fn updating_to_the_current_state_reenters_it() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let mut machine = StateMachine::new();
        machine.add_state("a", Some(tracking_options("a", &calls)));

        machine.update_state("a", None);
        machine.update_state("a", None);

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["a.enter", "a.exit", "a.enter"]
        );
        assert_eq!(machine.previous_state(), "a");
    }

    #[test]
    fn revert_ping_pongs_between_the_last_two_states() {
        let mut machine = StateMachine::new();
        machine.update_state("a", None);
        machine.update_state("b", None);

        machine.revert_state();
        assert_eq!(machine.current_state(), "a");
        assert_eq!(machine.previous_state(), "b");

        machine.revert_state();
        assert_eq!(machine.current_state(), "b");
        assert_eq!(machine.previous_state(), "a");
    }

    #[test]
    fn revert_fires_exit_and_enter_callbacks() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let mut machine = StateMachine::new();
        machine.add_state("a", Some(tracking_options("a", &calls)));
        machine.add_state("b", Some(tracking_options("b", &calls)));

        machine.update_state("a", None);
        machine.update_state("b", None);
        machine.revert_state();

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["a.enter", "a.exit", "b.enter", "b.exit", "a.enter"]
        );
    }

    #[test]
    fn revert_without_a_previous_state_is_a_noop() {
        let mut machine = StateMachine::new();
        machine.revert_state();
        assert_eq!(machine.current_state(), "");

        machine.update_state("a", None);
        machine.revert_state();
        assert_eq!(machine.current_state(), "a");
        assert_eq!(machine.previous_state(), "");
    }

    #[test]
    fn can_matches_the_current_state_name() {
        let mut machine = StateMachine::new();
        machine.update_state("busy", None);

        assert!(machine.can("busy"));
        assert!(!machine.can("idle"));
    }

    #[test]
    fn can_matches_local_rules() {
        let mut machine = StateMachine::new();
        machine.add_state(
            "ready",
            Some(StateOptions::new().with_rules(["waiting_for_input"])),
        );
        machine.update_state("ready", None);

        assert!(machine.can("waiting_for_input"));
    }

    #[test]
    fn can_is_false_before_the_first_update() {
        let mut machine = StateMachine::new();
        machine.add_state("ready", None);
        assert!(!machine.can("ready"));
    }

    #[test]
    fn global_conditions_resolve_against_the_current_state_name() {
        let mut machine = StateMachine::new();
        machine.add_global_state_condition("can_interact", ["running", "ready"]);

        machine.update_state("running", None);
        assert!(machine.can("can_interact"));

        machine.update_state("busy", None);
        assert!(!machine.can("can_interact"));
    }

    #[test]
    fn global_conditions_are_overwritten_not_appended() {
        let mut machine = StateMachine::new();
        machine.add_global_state_condition("can_interact", ["ready"]);
        machine.add_global_state_condition("can_interact", ["running"]);

        machine.update_state("ready", None);
        assert!(!machine.can("can_interact"));

        machine.update_state("running", None);
        assert!(machine.can("can_interact"));
    }

    #[test]
    fn negative_global_rules_keep_literal_token_matching() {
        let mut machine = StateMachine::new();
        machine.add_global_state_condition("can_interact", ["!busy"]);

        // The negative token defeats only its own written text, so the
        // condition holds even while the current state is "busy".
        machine.update_state("busy", None);
        assert!(machine.can("can_interact"));

        machine.update_state("idle", None);
        assert!(machine.can("can_interact"));
    }

    #[test]
    fn lookup_can_resolve_by_rule_instead_of_name() {
        let mut machine = StateMachine::new();
        machine.add_state(
            "ready",
            Some(StateOptions::new().with_rules(["waiting_for_input"])),
        );

        machine.update_state("waiting_for_input", None);

        assert_eq!(machine.current_state(), "ready");
        assert_eq!(machine.state_count(), 1);
    }

    #[test]
    fn unknown_names_create_inert_states() {
        let mut machine = StateMachine::new();
        machine.add_state("ready", None);

        // A typo resolves to a fresh state instead of failing.
        machine.update_state("redy", None);

        assert_eq!(machine.current_state(), "redy");
        assert_eq!(machine.state_count(), 2);
        assert!(!machine.can("ready"));
    }

    #[test]
    fn lazy_create_hook_observes_unintended_states() {
        let created: CallLog = Arc::new(Mutex::new(Vec::new()));
        let mut machine = StateMachine::new();
        let hook_log = Arc::clone(&created);
        machine.on_lazy_create(move |name| hook_log.lock().unwrap().push(name.to_string()));

        machine.add_state("ready", None);
        machine.add_state("ready", None);
        machine.update_state("redy", None);

        assert_eq!(*created.lock().unwrap(), vec!["ready", "redy"]);
    }

    #[test]
    fn add_state_rule_extends_the_current_state() {
        let mut machine = StateMachine::new();
        machine.update_state("ready", None);
        machine.add_state_rule(["waiting_for_input"]);

        assert!(machine.can("waiting_for_input"));

        machine.update_state("playing", None);
        assert!(!machine.can("waiting_for_input"));
    }

    #[test]
    fn add_state_rule_without_a_current_state_is_a_noop() {
        let mut machine = StateMachine::new();
        machine.add_state_rule(["waiting_for_input"]);
        machine.update_state("ready", None);

        assert!(!machine.can("waiting_for_input"));
    }

    #[test]
    fn update_with_options_replaces_callbacks_wholesale() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let mut machine = StateMachine::new();

        machine.update_state("ready", Some(tracking_options("ready", &calls)));
        machine.update_state("playing", None);

        // Fresh options with no callbacks clear the recorded ones.
        machine.update_state("ready", Some(StateOptions::new()));
        machine.update_state("playing", None);

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["ready.enter", "ready.exit"]
        );
    }

    #[test]
    fn one_state_accumulates_callback_invocations() {
        let count = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&count);

        let mut machine = StateMachine::new();
        machine.add_state(
            "ready",
            Some(StateOptions::new().on_enter(move || *counter.lock().unwrap() += 1)),
        );

        machine.update_state("ready", None);
        machine.update_state("playing", None);
        machine.update_state("ready", None);

        assert_eq!(*count.lock().unwrap(), 2);
        assert_eq!(machine.state_count(), 2);
    }

    #[test]
    fn history_records_the_traversed_path() {
        let mut machine = StateMachine::new();
        machine.update_state("ready", None);
        machine.update_state("playing", None);
        machine.revert_state();

        assert_eq!(machine.history().path(), vec!["ready", "playing", "ready"]);
        assert_eq!(machine.history().records()[2].kind, TransitionKind::Revert);
    }

    #[test]
    fn destroy_resets_queries() {
        let mut machine = StateMachine::new();
        machine.update_state("ready", None);
        machine.update_state("playing", None);
        machine.add_global_state_condition("can_interact", ["playing"]);

        machine.destroy();

        assert_eq!(machine.current_state(), "");
        assert_eq!(machine.previous_state(), "");
        assert!(!machine.can("playing"));
        assert!(!machine.check_global_rules("can_interact"));
        assert_eq!(machine.state_count(), 0);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn default_machine_uses_the_stock_name() {
        assert_eq!(StateMachine::default().name(), "State Machine");
        assert_eq!(StateMachine::named("lobby").name(), "lobby");
    }
}
