//! Declarative conditions over the interview response
//!
//! A [`Condition`] is the config-file form of a section predicate. It reads
//! values from the [`InterviewSnapshot`]; paths may contain the
//! [`ITERATION_ID_PLACEHOLDER`], which is replaced by the active object ID of
//! the iteration context before lookup.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use survey_model::{InterviewSnapshot, IterationContext};

/// Placeholder replaced by the last token of the iteration context
pub const ITERATION_ID_PLACEHOLDER: &str = "{iterationId}";

/// Boolean expression over response values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    /// Value at `path` is present and not null
    IsSet {
        /// Dotted response path
        path: String,
    },

    /// Value at `path` equals `value`
    Equals {
        /// Dotted response path
        path: String,
        /// Expected value
        value: Value,
    },

    /// Value at `path` is absent or differs from `value`
    NotEquals {
        /// Dotted response path
        path: String,
        /// Rejected value
        value: Value,
    },

    /// Value at `path` is truthy: not absent, `false`, `0` or `""`
    Truthy {
        /// Dotted response path
        path: String,
    },

    /// Negation
    Not {
        /// Negated condition
        condition: Box<Condition>,
    },

    /// All conditions hold; true when empty
    All {
        /// Conjuncts
        conditions: Vec<Condition>,
    },

    /// Any condition holds; false when empty
    Any {
        /// Disjuncts
        conditions: Vec<Condition>,
    },
}

impl Condition {
    /// `is_set` condition
    #[inline]
    #[must_use]
    pub fn is_set(path: impl Into<String>) -> Self {
        Self::IsSet { path: path.into() }
    }

    /// `equals` condition
    #[inline]
    #[must_use]
    pub fn equals(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals {
            path: path.into(),
            value: value.into(),
        }
    }

    /// `truthy` condition
    #[inline]
    #[must_use]
    pub fn truthy(path: impl Into<String>) -> Self {
        Self::Truthy { path: path.into() }
    }

    /// Negation of this condition
    #[inline]
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not {
            condition: Box::new(self),
        }
    }

    /// Evaluate against a snapshot, for an optional iteration
    #[must_use]
    pub fn evaluate(&self, snapshot: &InterviewSnapshot, context: Option<&IterationContext>) -> bool {
        match self {
            Self::IsSet { path } => lookup(snapshot, path, context).is_some(),
            Self::Equals { path, value } => lookup(snapshot, path, context) == Some(value),
            Self::NotEquals { path, value } => lookup(snapshot, path, context) != Some(value),
            Self::Truthy { path } => lookup(snapshot, path, context).is_some_and(is_truthy),
            Self::Not { condition } => !condition.evaluate(snapshot, context),
            Self::All { conditions } => conditions.iter().all(|c| c.evaluate(snapshot, context)),
            Self::Any { conditions } => conditions.iter().any(|c| c.evaluate(snapshot, context)),
        }
    }
}

/// Replace the iteration placeholder in `path`
///
/// Returns `None` if the path needs an iteration ID and there is none.
#[must_use]
pub fn resolve_path(path: &str, context: Option<&IterationContext>) -> Option<String> {
    if !path.contains(ITERATION_ID_PLACEHOLDER) {
        return Some(path.to_string());
    }
    let id = context.and_then(IterationContext::last)?;
    Some(path.replace(ITERATION_ID_PLACEHOLDER, id))
}

fn lookup<'a>(
    snapshot: &'a InterviewSnapshot,
    path: &str,
    context: Option<&IterationContext>,
) -> Option<&'a Value> {
    resolve_path(path, context).and_then(|path| snapshot.get_response(&path))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
