//! Condition rule tokens and their evaluation.
//!
//! Rules are the atomic unit of the coordination core: plain string
//! tokens, negative when written with a leading `!`. The prefix is
//! parsed once at construction, so evaluation never re-inspects the
//! token text.

use std::fmt;

/// A single condition token stored in a rule list.
///
/// Tokens are positive by default; a leading `!` in the written form
/// marks the token as negative. `Rule` keeps the bare name and the
/// polarity as separate data, and round-trips back to the written form
/// via `Display`.
///
/// # Example
///
/// ```rust
/// use stagehand::core::Rule;
///
/// let ready = Rule::parse("ready");
/// assert!(!ready.is_negative());
/// assert_eq!(ready.name(), "ready");
///
/// let not_busy = Rule::parse("!busy");
/// assert!(not_busy.is_negative());
/// assert_eq!(not_busy.name(), "busy");
/// assert_eq!(not_busy.to_string(), "!busy");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rule {
    /// A plain token, satisfied by a condition equal to its text.
    Positive(String),
    /// A token written with a leading `!`; holds the name without the prefix.
    Negative(String),
}

impl Rule {
    /// Parse a written token into a rule.
    ///
    /// A leading `!` yields a negative rule over the remainder of the
    /// token; anything else yields a positive rule. No other validation
    /// is performed here.
    pub fn parse(token: impl AsRef<str>) -> Self {
        let token = token.as_ref();
        match token.strip_prefix('!') {
            Some(name) => Rule::Negative(name.to_string()),
            None => Rule::Positive(token.to_string()),
        }
    }

    /// The bare name, without any `!` prefix.
    pub fn name(&self) -> &str {
        match self {
            Rule::Positive(name) | Rule::Negative(name) => name,
        }
    }

    /// Whether this rule was written with the `!` prefix.
    pub fn is_negative(&self) -> bool {
        matches!(self, Rule::Negative(_))
    }

    /// Whether `condition` is exactly this rule's written token text,
    /// prefix included.
    ///
    /// A negative rule over `busy` matches the condition `"!busy"`, not
    /// the condition `"busy"`. Containment checks throughout the crate
    /// compare written tokens, never stripped names.
    pub fn matches_token(&self, condition: &str) -> bool {
        match self {
            Rule::Positive(name) => condition == name,
            Rule::Negative(name) => {
                condition.strip_prefix('!').is_some_and(|rest| rest == name)
            }
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Positive(name) => f.write_str(name),
            Rule::Negative(name) => write!(f, "!{name}"),
        }
    }
}

impl From<&str> for Rule {
    fn from(token: &str) -> Self {
        Rule::parse(token)
    }
}

impl From<String> for Rule {
    fn from(token: String) -> Self {
        Rule::parse(token)
    }
}

/// Evaluate a condition against a rule list.
///
/// This is the containment check shared by state-local rules and the
/// machine-wide global conditions. The decision table, in order:
///
/// 1. An empty rule list satisfies nothing.
/// 2. A condition equal to a negative rule's written token (prefix
///    included) is not satisfied.
/// 3. A condition equal to a positive token is satisfied.
/// 4. Otherwise, the condition is satisfied whenever the list contains
///    at least one negative rule.
///
/// Step 4 is the non-obvious part of the contract: a negative rule acts
/// as a wildcard that defeats only its own written token. A list
/// containing `!busy` satisfies `"idle"`, `"busy"`, and every other
/// condition except the literal string `"!busy"`; it does **not** mean
/// "anything except busy". Call sites rely on this containment
/// behavior; [`eval_rules_with_exclusions`] is the variant that treats
/// negative rules as true exclusions.
///
/// # Example
///
/// ```rust
/// use stagehand::core::{eval_rules, Rule};
///
/// let rules = vec![Rule::parse("ready"), Rule::parse("!busy")];
///
/// assert!(eval_rules("ready", &rules));   // positive containment
/// assert!(eval_rules("busy", &rules));    // negative wildcard
/// assert!(eval_rules("anything", &rules));
/// assert!(!eval_rules("!busy", &rules));  // the one defeated token
/// ```
pub fn eval_rules(condition: &str, rules: &[Rule]) -> bool {
    if rules.is_empty() {
        return false;
    }
    let mut any_negative = false;
    let mut hit_positive = false;
    let mut hit_negative = false;
    for rule in rules {
        if rule.is_negative() {
            any_negative = true;
            hit_negative |= rule.matches_token(condition);
        } else {
            hit_positive |= rule.matches_token(condition);
        }
    }
    hit_positive || (any_negative && !hit_negative)
}

/// Evaluate a condition against a rule list, treating negative rules as
/// exclusions over their bare names.
///
/// Under these semantics `!busy` means "any condition except `busy`": a
/// condition named by a negative rule is never satisfied, a condition
/// equal to a positive token is satisfied, and any other condition is
/// satisfied when at least one negative rule is present.
///
/// This is a deliberate alternative to [`eval_rules`], provided under
/// its own name for call sites that want exclusion semantics; nothing
/// inside [`StateMachine`](crate::StateMachine) calls it.
///
/// # Example
///
/// ```rust
/// use stagehand::core::{eval_rules_with_exclusions, Rule};
///
/// let rules = vec![Rule::parse("!busy")];
///
/// assert!(eval_rules_with_exclusions("idle", &rules));
/// assert!(!eval_rules_with_exclusions("busy", &rules));
/// ```
pub fn eval_rules_with_exclusions(condition: &str, rules: &[Rule]) -> bool {
    if rules.is_empty() {
        return false;
    }
    let mut any_negative = false;
    let mut hit_positive = false;
    let mut excluded = false;
    for rule in rules {
        match rule {
            Rule::Negative(name) => {
                any_negative = true;
                excluded |= name == condition;
            }
            Rule::Positive(name) => hit_positive |= name == condition,
        }
    }
    !excluded && (hit_positive || any_negative)
}
