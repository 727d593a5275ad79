//! Error types for survey navigation
//!
//! Configuration problems (bad graph, unknown section, unsupported
//! iteration rule) and failures of caller-supplied hooks are both fatal
//! and propagate to the caller. Traversal cycles are not errors: they are
//! logged and the current section is kept.

use survey_model::IterationContext;
use survey_sections::{GraphError, HookKind};

/// Main navigation error type
#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    /// Section graph is invalid
    #[error("invalid section graph: {0}")]
    Graph(#[from] GraphError),

    /// Section name is not part of the graph
    #[error("unknown section '{0}'")]
    UnknownSection(String),

    /// A hook returned an error
    #[error(
        "error evaluating {hook} for section {section}{}: {source}",
        iteration_suffix(.iteration.as_ref())
    )]
    Hook {
        /// Section owning the hook
        section: String,
        /// Failing hook
        hook: HookKind,
        /// Iteration the hook was evaluated for
        iteration: Option<IterationContext>,
        /// Error returned by the hook
        #[source]
        source: anyhow::Error,
    },

    /// Builtin iteration rule has no query
    #[error("unsupported iteration rule '{rule}' for repeated block '{block}'")]
    UnsupportedIterationRule {
        /// Repeated block
        block: String,
        /// Builtin name
        rule: String,
    },
}

impl NavigationError {
    /// Wrap a hook failure with its section and iteration
    #[must_use]
    pub fn hook(
        section: impl Into<String>,
        hook: HookKind,
        iteration: Option<&IterationContext>,
        source: anyhow::Error,
    ) -> Self {
        Self::Hook {
            section: section.into(),
            hook,
            iteration: iteration.cloned(),
            source,
        }
    }

    /// Whether the error comes from the section configuration rather than
    /// from a hook at run time
    #[inline]
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Graph(_) | Self::UnknownSection(_) | Self::UnsupportedIterationRule { .. }
        )
    }

    /// Failing hook, for hook errors
    #[inline]
    #[must_use]
    pub fn hook_kind(&self) -> Option<HookKind> {
        match self {
            Self::Hook { hook, .. } => Some(*hook),
            _ => None,
        }
    }
}

fn iteration_suffix(iteration: Option<&IterationContext>) -> String {
    match iteration {
        Some(ctx) if !ctx.is_empty() => format!(" with iteration {ctx}"),
        _ => String::new(),
    }
}

/// Result type for navigation
pub type NavigationResult<T> = std::result::Result<T, NavigationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hook_message_without_iteration() {
        let err = NavigationError::hook(
            "householdMembers",
            HookKind::OnSectionEntry,
            None,
            anyhow::anyhow!("Test error"),
        );
        assert_eq!(
            err.to_string(),
            "error evaluating onSectionEntry for section householdMembers: Test error"
        );
        assert!(!err.is_configuration_error());
        assert_eq!(err.hook_kind(), Some(HookKind::OnSectionEntry));
    }

    #[test]
    fn hook_message_with_iteration() {
        let ctx = IterationContext::new(["person", "personId1"]);
        let err = NavigationError::hook(
            "personsTrips",
            HookKind::IsIterationValid,
            Some(&ctx),
            anyhow::anyhow!("Test error"),
        );
        assert_eq!(
            err.to_string(),
            "error evaluating isIterationValid for section personsTrips with iteration person/personId1: Test error"
        );
    }

    #[test]
    fn hook_error_keeps_source() {
        let err = NavigationError::hook("home", HookKind::IsSectionVisible, None, anyhow::anyhow!("inner"));
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("inner"));
    }

    #[test]
    fn configuration_errors() {
        assert!(NavigationError::UnknownSection("x".into()).is_configuration_error());
        assert!(NavigationError::from(GraphError::NoEntrySection).is_configuration_error());
        assert!(NavigationError::UnsupportedIterationRule {
            block: "b".into(),
            rule: "r".into()
        }
        .is_configuration_error());
    }
}
