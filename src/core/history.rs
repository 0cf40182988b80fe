//! Transition diagnostics kept by a running machine.
//!
//! The log is an in-memory record of every transition a machine has
//! performed, for inspection and debugging. It is never persisted and
//! plays no part in evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a transition was driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionKind {
    /// A forward transition requested by name.
    Update,
    /// A ping-pong back to the previous state.
    Revert,
}

/// Record of a single transition.
///
/// `from` is the empty string for a machine's very first transition,
/// when no state was current yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Name of the state that was current before the transition.
    pub from: String,
    /// Name of the state that became current.
    pub to: String,
    /// Whether this was an update or a revert.
    pub kind: TransitionKind,
    /// When the transition occurred.
    pub timestamp: DateTime<Utc>,
}

/// Ordered log of a machine's transitions.
///
/// # Example
///
/// ```rust
/// use stagehand::StateMachine;
///
/// let mut machine = StateMachine::new();
/// machine.update_state("ready", None);
/// machine.update_state("playing", None);
///
/// assert_eq!(machine.history().path(), vec!["ready", "playing"]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransitionLog {
    records: Vec<TransitionRecord>,
}

impl TransitionLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    pub fn record(&mut self, record: TransitionRecord) {
        self.records.push(record);
    }

    /// All records, in order.
    pub fn records(&self) -> &[TransitionRecord] {
        &self.records
    }

    /// The sequence of state names traversed.
    ///
    /// The leading empty `from` of a machine's first transition is
    /// skipped, so the path starts at the first state that was actually
    /// entered.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        if let Some(first) = self.records.first() {
            if !first.from.is_empty() {
                path.push(first.from.as_str());
            }
        }
        for record in &self.records {
            path.push(record.to.as_str());
        }
        path
    }

    /// Elapsed time between the first and last recorded transition.
    ///
    /// `None` when the log is empty.
    pub fn duration(&self) -> Option<Duration> {
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => last
                .timestamp
                .signed_duration_since(first.timestamp)
                .to_std()
                .ok(),
            _ => None,
        }
    }

    /// Number of recorded transitions.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether anything has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop all records.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
