//! Navigation service
//!
//! Entry point of the crate. The service owns a validated [`SectionGraph`]
//! and the collaborators used to enumerate repeated-block iterations; it
//! holds no per-interview state and can be shared between threads.

use crate::error::NavigationResult;
use crate::hooks;
use crate::iteration::IterationResolver;
use crate::query::SurveyObjectQuery;
use crate::shuffle::Shuffler;
use crate::traversal::Traversal;
use std::sync::Arc;
use survey_model::{merge_values, Direction, InterviewSnapshot, NavigationSection, TargetSectionResult};
use survey_sections::{HookKind, SectionGraph, SurveySectionsConfig};

/// Computes the next section to display for an interview
#[derive(Debug, Clone)]
pub struct NavigationService {
    graph: SectionGraph,
    iterations: IterationResolver,
}

impl NavigationService {
    /// Create a service with the default household query and a thread-local
    /// random shuffler
    #[must_use]
    pub fn new(graph: SectionGraph) -> Self {
        Self {
            graph,
            iterations: IterationResolver::default(),
        }
    }

    /// Validate a configuration and create a service for it
    ///
    /// # Errors
    /// Returns [`NavigationError::Graph`](crate::NavigationError::Graph) if the
    /// configuration is not a valid graph
    pub fn from_config(config: SurveySectionsConfig) -> NavigationResult<Self> {
        Ok(Self::new(SectionGraph::new(config)?))
    }

    /// Use another query for builtin iteration rules
    #[must_use]
    pub fn with_object_query(mut self, query: Arc<dyn SurveyObjectQuery>) -> Self {
        self.iterations = self.iterations.with_query(query);
        self
    }

    /// Use another shuffler for randomly ordered blocks
    #[must_use]
    pub fn with_shuffler(mut self, shuffler: Arc<dyn Shuffler>) -> Self {
        self.iterations = self.iterations.with_shuffler(shuffler);
        self
    }

    /// Section graph navigated by this service
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &SectionGraph {
        &self.graph
    }

    fn traversal<'a>(&'a self, snapshot: &'a InterviewSnapshot) -> Traversal<'a> {
        Traversal::new(&self.graph, &self.iterations, snapshot)
    }

    /// Next section from `current` in `direction`
    ///
    /// Moving forward from a section that is not completed keeps the current
    /// section and runs no hook. When no other section can be reached the
    /// current section is returned, and its exit then entry hooks still run.
    ///
    /// # Errors
    /// Returns error if `current` is unknown, a hook fails, or a block uses an
    /// unsupported iteration rule
    pub fn navigate(
        &self,
        snapshot: &InterviewSnapshot,
        current: &NavigationSection,
        direction: Direction,
    ) -> NavigationResult<TargetSectionResult> {
        let traversal = self.traversal(snapshot);
        traversal.descriptor(&current.section_shortname)?;

        if direction.is_forward() && !traversal.is_completed(current)? {
            tracing::debug!(section = %current, "section not completed, staying");
            return Ok(TargetSectionResult::stay(current.clone()));
        }

        let result = traversal.navigate_from(current, direction)?;
        tracing::debug!(from = %current, to = %result.target_section, %direction, "navigated");
        with_entry_exit(&traversal, result, Some(current))
    }

    /// Section to display when opening the questionnaire or jumping to a
    /// section
    ///
    /// `requested` is ignored when it names no section. `current` is the
    /// section being left, if any; its exit hook runs before the entry hook of
    /// the target, even when both are the same section.
    ///
    /// # Errors
    /// Returns error if `current` is unknown, a hook fails, or a block uses an
    /// unsupported iteration rule
    pub fn init_navigation_state(
        &self,
        snapshot: &InterviewSnapshot,
        requested: Option<&str>,
        current: Option<&NavigationSection>,
    ) -> NavigationResult<TargetSectionResult> {
        let traversal = self.traversal(snapshot);
        if let Some(current) = current {
            traversal.descriptor(&current.section_shortname)?;
        }

        let result = traversal.resume(requested)?;
        tracing::debug!(?requested, to = %result.target_section, "navigation state initialized");
        with_entry_exit(&traversal, result, current)
    }
}

/// Merge exit updates of `previous` then entry updates of the target over the
/// resolution updates
///
/// Both hooks run when the target is `previous` itself.
fn with_entry_exit(
    traversal: &Traversal<'_>,
    result: TargetSectionResult,
    previous: Option<&NavigationSection>,
) -> NavigationResult<TargetSectionResult> {
    let exit = match previous {
        Some(previous) => hooks::fire(
            traversal.descriptor(&previous.section_shortname)?,
            HookKind::OnSectionExit,
            traversal.snapshot,
            previous.iteration_context.as_ref(),
        )?,
        None => None,
    };
    let target = &result.target_section;
    let entry = hooks::fire(
        traversal.descriptor(&target.section_shortname)?,
        HookKind::OnSectionEntry,
        traversal.snapshot,
        target.iteration_context.as_ref(),
    )?;
    if exit.is_none() && entry.is_none() {
        return Ok(result);
    }

    let updates = merge_values([result.values_by_path.as_ref(), exit.as_ref(), entry.as_ref()]);
    Ok(TargetSectionResult::with_values(result.target_section, updates))
}
