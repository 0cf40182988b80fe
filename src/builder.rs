//! Declarative construction of state machines.
//!
//! The runtime API on [`StateMachine`] is deliberately permissive:
//! unknown names never fail, they lazily become new states. This module
//! is the strict counterpart for machines declared up front (in code via
//! [`MachineBuilder`], or from data via [`MachineDef`]): declared input
//! is validated once at build time, and junk that the runtime would
//! silently absorb is rejected with a [`BuildError`] instead.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::StateOptions;
use crate::machine::StateMachine;

/// Errors that can occur when building a declared machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("State name is empty. Give every declared state a non-empty name")]
    EmptyStateName,

    #[error("Global condition name is empty. Give every global condition a non-empty name")]
    EmptyConditionName,

    #[error("Rule token {token:?} on {owner} is blank or a bare '!'")]
    InvalidRuleToken { owner: String, token: String },

    #[error("Initial state {0:?} is not declared. Declare it or drop the initial setting")]
    UndeclaredInitialState(String),

    #[error("Definition parse failed: {0}")]
    Json(#[from] serde_json::Error),
}

fn check_tokens<'a, I>(owner: &str, tokens: I) -> Result<(), BuildError>
where
    I: IntoIterator<Item = &'a str>,
{
    for token in tokens {
        if token.is_empty() || token == "!" {
            return Err(BuildError::InvalidRuleToken {
                owner: owner.to_string(),
                token: token.to_string(),
            });
        }
    }
    Ok(())
}

/// Builder for declaring a machine with a fluent API.
///
/// # Example
///
/// ```rust
/// use stagehand::{MachineBuilder, StateOptions};
///
/// let mut machine = MachineBuilder::named("lobby")
///     .state_with("ready", StateOptions::new().with_rules(["waiting_for_input"]))
///     .state("playing")
///     .global_condition("can_interact", ["ready"])
///     .initial("ready")
///     .build()
///     .unwrap();
///
/// assert_eq!(machine.current_state(), "ready");
/// assert!(machine.can("can_interact"));
/// machine.update_state("playing", None);
/// ```
pub struct MachineBuilder {
    name: String,
    states: Vec<(String, Option<StateOptions>)>,
    globals: Vec<(String, Vec<String>)>,
    initial: Option<String>,
}

impl MachineBuilder {
    /// Create a builder with the default diagnostic name.
    pub fn new() -> Self {
        Self::named("State Machine")
    }

    /// Create a builder with a diagnostic name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
            globals: Vec::new(),
            initial: None,
        }
    }

    /// Declare a state with no rules or callbacks.
    pub fn state(mut self, name: impl Into<String>) -> Self {
        self.states.push((name.into(), None));
        self
    }

    /// Declare a state with options.
    pub fn state_with(mut self, name: impl Into<String>, options: StateOptions) -> Self {
        self.states.push((name.into(), Some(options)));
        self
    }

    /// Declare a global condition with its rule tokens.
    pub fn global_condition<I>(mut self, name: impl Into<String>, conditions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.globals
            .push((name.into(), conditions.into_iter().map(Into::into).collect()));
        self
    }

    /// Transition to this state as soon as the machine is built.
    ///
    /// The name must match a declared state; the builder rejects
    /// anything the lazy runtime lookup would have silently created.
    pub fn initial(mut self, name: impl Into<String>) -> Self {
        self.initial = Some(name.into());
        self
    }

    /// Validate the declaration and build the machine.
    pub fn build(self) -> Result<StateMachine, BuildError> {
        for (name, options) in &self.states {
            if name.is_empty() {
                return Err(BuildError::EmptyStateName);
            }
            if let Some(options) = options {
                if let Some(rule) = options.rules().iter().find(|r| r.name().is_empty()) {
                    return Err(BuildError::InvalidRuleToken {
                        owner: format!("state {name:?}"),
                        token: rule.to_string(),
                    });
                }
            }
        }
        for (name, tokens) in &self.globals {
            if name.is_empty() {
                return Err(BuildError::EmptyConditionName);
            }
            check_tokens(
                &format!("global condition {name:?}"),
                tokens.iter().map(String::as_str),
            )?;
        }
        if let Some(initial) = &self.initial {
            if !self.states.iter().any(|(name, _)| name == initial) {
                return Err(BuildError::UndeclaredInitialState(initial.clone()));
            }
        }

        let mut machine = StateMachine::named(self.name);
        for (name, options) in self.states {
            machine.add_state(&name, options);
        }
        for (name, tokens) in self.globals {
            machine.add_global_state_condition(name, tokens);
        }
        if let Some(initial) = self.initial {
            machine.update_state(&initial, None);
        }
        Ok(machine)
    }
}

impl Default for MachineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A state declaration inside a [`MachineDef`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDef {
    /// The state's name.
    pub name: String,
    /// Condition tokens for the state's rule list.
    #[serde(default)]
    pub rules: Vec<String>,
}

/// A data-driven machine declaration.
///
/// Covers everything but callbacks, which cannot come from data;
/// install those afterward with
/// [`add_state`](StateMachine::add_state).
///
/// # Example
///
/// ```rust
/// use stagehand::MachineDef;
///
/// let def = MachineDef::from_json(
///     r#"{
///         "name": "lobby",
///         "initial": "ready",
///         "states": [
///             { "name": "ready", "rules": ["waiting_for_input"] },
///             { "name": "playing" }
///         ],
///         "global_conditions": { "can_interact": ["ready"] }
///     }"#,
/// )
/// .unwrap();
///
/// let machine = def.build().unwrap();
/// assert_eq!(machine.current_state(), "ready");
/// assert!(machine.can("waiting_for_input"));
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MachineDef {
    /// Diagnostic name for the machine.
    #[serde(default)]
    pub name: String,
    /// State to transition to at build time, if any.
    #[serde(default)]
    pub initial: Option<String>,
    /// Declared states.
    #[serde(default)]
    pub states: Vec<StateDef>,
    /// Global condition name to rule tokens.
    #[serde(default)]
    pub global_conditions: HashMap<String, Vec<String>>,
}

impl MachineDef {
    /// Parse a definition from JSON.
    pub fn from_json(json: &str) -> Result<Self, BuildError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the definition and build the machine.
    ///
    /// The definition itself is not consumed; a machine can be built
    /// from it any number of times.
    pub fn build(&self) -> Result<StateMachine, BuildError> {
        let mut builder = if self.name.is_empty() {
            MachineBuilder::new()
        } else {
            MachineBuilder::named(&self.name)
        };
        for state in &self.states {
            builder = builder.state_with(
                &state.name,
                StateOptions::new().with_rules(state.rules.iter().map(String::as_str)),
            );
        }
        for (name, tokens) in &self.global_conditions {
            builder = builder.global_condition(name, tokens.iter().map(String::as_str));
        }
        if let Some(initial) = &self.initial {
            builder = builder.initial(initial);
        }
        builder.build()
    }
}
