//! Stagehand: a rule-based state coordination library
//!
//! Stagehand provides a small coordination primitive for sequencing
//! named phases of a flow, such as screen transitions or multi-stage
//! bonus choreography, without prescribing what the phase names mean.
//!
//! # Core Concepts
//!
//! - **Rule**: a string condition token, negative when written with a
//!   leading `!`
//! - **State**: a named entity with an ordered rule list and optional
//!   enter/exit callbacks
//! - **StateMachine**: a lazy registry of states with a
//!   current/previous pointer pair and machine-wide global conditions
//! - **StateOptions**: the configuration bundle applied when declaring
//!   or updating a state
//!
//! # Example
//!
//! ```rust
//! use stagehand::{StateMachine, StateOptions};
//!
//! let mut machine = StateMachine::named("transitions");
//!
//! machine.add_state(
//!     "ready",
//!     Some(StateOptions::new().with_rules(["waiting_for_input"])),
//! );
//! machine.add_global_state_condition("can_interact", ["ready", "playing"]);
//!
//! machine.update_state("ready", None);
//! assert!(machine.can("waiting_for_input"));
//! assert!(machine.can("can_interact"));
//!
//! machine.update_state("playing_all", None);
//! assert!(!machine.can("can_interact"));
//!
//! machine.revert_state();
//! assert_eq!(machine.current_state(), "ready");
//! ```

pub mod builder;
pub mod core;
pub mod machine;

// Re-export commonly used types
pub use builder::{BuildError, MachineBuilder, MachineDef};
pub use core::{Rule, State, StateOptions, TransitionKind, TransitionLog, TransitionRecord};
pub use machine::StateMachine;
