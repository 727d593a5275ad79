//! Section hooks
//!
//! Every hook of a section is optional. Predicates may be a literal, a
//! declarative [`Condition`] loaded from config, or a function attached in
//! code; events may be a fixed set of value updates or a function.

use crate::condition::{resolve_path, Condition};
use serde::{Deserialize, Deserializer};
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;
use survey_model::{InterviewSnapshot, IterationContext, ValuesByPath};

/// Signature of a conditional hook function
pub type ConditionalFn =
    dyn Fn(&InterviewSnapshot, Option<&IterationContext>) -> anyhow::Result<bool> + Send + Sync;

/// Signature of an entry/exit hook function
pub type EventFn = dyn Fn(&InterviewSnapshot, Option<&IterationContext>) -> anyhow::Result<Option<ValuesByPath>>
    + Send
    + Sync;

/// Name of a hook, as reported in errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// `enableConditional`
    EnableConditional,
    /// `isSectionVisible`
    IsSectionVisible,
    /// `isSectionCompleted`
    IsSectionCompleted,
    /// `onSectionEntry`
    OnSectionEntry,
    /// `onSectionExit`
    OnSectionExit,
    /// `isIterationValid`
    IsIterationValid,
}

impl HookKind {
    /// Config name of the hook
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnableConditional => "enableConditional",
            Self::IsSectionVisible => "isSectionVisible",
            Self::IsSectionCompleted => "isSectionCompleted",
            Self::OnSectionEntry => "onSectionEntry",
            Self::OnSectionExit => "onSectionExit",
            Self::IsIterationValid => "isIterationValid",
        }
    }
}

impl Display for HookKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean capability of a section
#[derive(Clone)]
pub enum Predicate {
    /// Constant answer
    Literal(bool),

    /// Declarative condition
    Expr(Condition),

    /// Caller-supplied function
    Function(Arc<ConditionalFn>),
}

impl Predicate {
    /// Wrap a function as a predicate
    #[must_use]
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&InterviewSnapshot, Option<&IterationContext>) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }

    /// Evaluate the predicate
    ///
    /// # Errors
    /// Returns whatever error a function predicate returns
    pub fn evaluate(
        &self,
        snapshot: &InterviewSnapshot,
        context: Option<&IterationContext>,
    ) -> anyhow::Result<bool> {
        match self {
            Self::Literal(value) => Ok(*value),
            Self::Expr(condition) => Ok(condition.evaluate(snapshot, context)),
            Self::Function(f) => f(snapshot, context),
        }
    }
}

impl Debug for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Expr(condition) => f.debug_tuple("Expr").field(condition).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl From<bool> for Predicate {
    fn from(value: bool) -> Self {
        Self::Literal(value)
    }
}

impl From<Condition> for Predicate {
    fn from(condition: Condition) -> Self {
        Self::Expr(condition)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PredicateRepr {
    Literal(bool),
    Expr(Condition),
}

impl<'de> Deserialize<'de> for Predicate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match PredicateRepr::deserialize(deserializer)? {
            PredicateRepr::Literal(value) => Self::Literal(value),
            PredicateRepr::Expr(condition) => Self::Expr(condition),
        })
    }
}

/// Evaluate an optional predicate, falling back to `default` when absent
///
/// # Errors
/// Returns whatever error a function predicate returns
pub fn parse_boolean(
    predicate: Option<&Predicate>,
    snapshot: &InterviewSnapshot,
    context: Option<&IterationContext>,
    default: bool,
) -> anyhow::Result<bool> {
    predicate.map_or(Ok(default), |p| p.evaluate(snapshot, context))
}

/// Side effect of entering or leaving a section
#[derive(Clone)]
pub enum SectionEvent {
    /// Fixed updates; keys may use the iteration placeholder
    SetValues(ValuesByPath),

    /// Caller-supplied function
    Function(Arc<EventFn>),
}

impl SectionEvent {
    /// Wrap a function as an event
    #[must_use]
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&InterviewSnapshot, Option<&IterationContext>) -> anyhow::Result<Option<ValuesByPath>>
            + Send
            + Sync
            + 'static,
    {
        Self::Function(Arc::new(f))
    }

    /// Run the event and return the updates it produces
    ///
    /// Fixed updates whose key needs an iteration ID are dropped outside of
    /// an iteration.
    ///
    /// # Errors
    /// Returns whatever error a function event returns
    pub fn fire(
        &self,
        snapshot: &InterviewSnapshot,
        context: Option<&IterationContext>,
    ) -> anyhow::Result<Option<ValuesByPath>> {
        match self {
            Self::SetValues(values) => {
                let resolved: ValuesByPath = values
                    .iter()
                    .filter_map(|(key, value)| resolve_path(key, context).map(|key| (key, value.clone())))
                    .collect();
                Ok((!resolved.is_empty()).then_some(resolved))
            }
            Self::Function(f) => f(snapshot, context),
        }
    }
}

impl Debug for SectionEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetValues(values) => f.debug_tuple("SetValues").field(values).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for SectionEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ValuesByPath::deserialize(deserializer).map(Self::SetValues)
    }
}

/// Optional hooks of a section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionHooks {
    /// Whether the section can be navigated to
    #[serde(default)]
    pub enable_conditional: Option<Predicate>,

    /// Whether the section is shown or skipped
    #[serde(default)]
    pub is_section_visible: Option<Predicate>,

    /// Whether the section allows moving forward
    #[serde(default)]
    pub is_section_completed: Option<Predicate>,

    /// Updates when the section is entered
    #[serde(default)]
    pub on_section_entry: Option<SectionEvent>,

    /// Updates when the section is left
    #[serde(default)]
    pub on_section_exit: Option<SectionEvent>,
}

impl SectionHooks {
    /// Conditional hook by kind; `None` for events
    #[must_use]
    pub fn predicate(&self, kind: HookKind) -> Option<&Predicate> {
        match kind {
            HookKind::EnableConditional => self.enable_conditional.as_ref(),
            HookKind::IsSectionVisible => self.is_section_visible.as_ref(),
            HookKind::IsSectionCompleted => self.is_section_completed.as_ref(),
            HookKind::OnSectionEntry | HookKind::OnSectionExit | HookKind::IsIterationValid => None,
        }
    }

    /// Event hook by kind; `None` for predicates
    #[must_use]
    pub fn event(&self, kind: HookKind) -> Option<&SectionEvent> {
        match kind {
            HookKind::OnSectionEntry => self.on_section_entry.as_ref(),
            HookKind::OnSectionExit => self.on_section_exit.as_ref(),
            _ => None,
        }
    }

    /// Fixed-update events, for key validation
    pub(crate) fn fixed_updates(&self) -> impl Iterator<Item = &ValuesByPath> {
        [self.on_section_entry.as_ref(), self.on_section_exit.as_ref()]
            .into_iter()
            .flatten()
            .filter_map(|event| match event {
                SectionEvent::SetValues(values) => Some(values),
                SectionEvent::Function(_) => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parse_boolean_defaults_when_absent() {
        let snapshot = InterviewSnapshot::default();
        assert!(parse_boolean(None, &snapshot, None, true).unwrap());
        assert!(!parse_boolean(None, &snapshot, None, false).unwrap());
        assert!(!parse_boolean(Some(&Predicate::Literal(false)), &snapshot, None, true).unwrap());
    }

    #[test]
    fn function_predicate_receives_context() {
        let predicate = Predicate::function(|_, ctx| Ok(ctx.and_then(IterationContext::last) == Some("p1")));
        let snapshot = InterviewSnapshot::default();
        let ctx = IterationContext::new(["p1"]);
        assert!(predicate.evaluate(&snapshot, Some(&ctx)).unwrap());
        assert!(!predicate.evaluate(&snapshot, None).unwrap());
    }

    #[test]
    fn function_predicate_error_propagates() {
        let predicate = Predicate::function(|_, _| anyhow::bail!("Test error"));
        let err = predicate.evaluate(&InterviewSnapshot::default(), None).unwrap_err();
        assert_eq!(err.to_string(), "Test error");
    }

    #[test]
    fn predicate_deserializes_literal_or_condition() {
        let literal: Predicate = serde_json::from_value(json!(false)).unwrap();
        assert!(matches!(literal, Predicate::Literal(false)));
        let expr: Predicate = serde_json::from_value(json!({ "op": "is_set", "path": "a" })).unwrap();
        assert!(matches!(expr, Predicate::Expr(Condition::IsSet { .. })));
    }

    #[test]
    fn set_values_resolves_placeholder() {
        let mut values = ValuesByPath::new();
        values.insert("response.persons.{iterationId}._visited".into(), json!(true));
        values.insert("response._lastEntered".into(), json!("trips"));
        let event = SectionEvent::SetValues(values);
        let snapshot = InterviewSnapshot::default();

        let ctx = IterationContext::new(["person", "p2"]);
        let fired = event.fire(&snapshot, Some(&ctx)).unwrap().unwrap();
        assert_eq!(fired.get("response.persons.p2._visited"), Some(&json!(true)));

        let outside = event.fire(&snapshot, None).unwrap().unwrap();
        assert_eq!(outside.len(), 1);
        assert!(outside.contains_key("response._lastEntered"));
    }

    #[test]
    fn hook_kind_names() {
        assert_eq!(HookKind::IsIterationValid.to_string(), "isIterationValid");
        assert_eq!(HookKind::OnSectionEntry.as_str(), "onSectionEntry");
    }
}
