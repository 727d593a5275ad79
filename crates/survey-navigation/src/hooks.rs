//! Hook invocation with defaults and error context

use crate::error::{NavigationError, NavigationResult};
use survey_model::{InterviewSnapshot, IterationContext, ValuesByPath};
use survey_sections::{parse_boolean, HookKind, RepeatedBlock, SectionDescriptor};

/// Evaluate a conditional hook of a section, `default` when absent
///
/// # Errors
/// Returns [`NavigationError::Hook`] if the hook fails
pub(crate) fn evaluate(
    section: &SectionDescriptor,
    kind: HookKind,
    snapshot: &InterviewSnapshot,
    context: Option<&IterationContext>,
    default: bool,
) -> NavigationResult<bool> {
    parse_boolean(section.hooks.predicate(kind), snapshot, context, default)
        .map_err(|source| NavigationError::hook(&section.name, kind, context, source))
}

/// Run an entry or exit hook of a section
///
/// # Errors
/// Returns [`NavigationError::Hook`] if the hook fails
pub(crate) fn fire(
    section: &SectionDescriptor,
    kind: HookKind,
    snapshot: &InterviewSnapshot,
    context: Option<&IterationContext>,
) -> NavigationResult<Option<ValuesByPath>> {
    let Some(event) = section.hooks.event(kind) else {
        return Ok(None);
    };
    event
        .fire(snapshot, context)
        .map_err(|source| NavigationError::hook(&section.name, kind, context, source))
}

/// Evaluate a block's iteration validity, `None` when not configured
///
/// # Errors
/// Returns [`NavigationError::Hook`] naming the block and the iteration
pub(crate) fn iteration_valid(
    block_name: &str,
    block: &RepeatedBlock,
    snapshot: &InterviewSnapshot,
    context: &IterationContext,
) -> NavigationResult<Option<bool>> {
    let Some(predicate) = &block.is_iteration_valid else {
        return Ok(None);
    };
    predicate
        .evaluate(snapshot, Some(context))
        .map(Some)
        .map_err(|source| NavigationError::hook(block_name, HookKind::IsIterationValid, Some(context), source))
}
