//! Section-by-section traversal
//!
//! A [`Traversal`] borrows the graph and one snapshot for the duration of a
//! call. Each step is a pure function of both; updates the caller must apply
//! are collected in a [`Resolution`].
//!
//! ```text
//! current ──correct──▶ pointer ──neighbour──▶ candidate ──add/strip ctx──▶ target
//!                         ▲                                                  │
//!                         └──────── skipped (disabled / invisible) ◀─────────┤
//!                                                                            ▼
//!                                                    repeated block? resolve iteration
//! ```

use crate::error::{NavigationError, NavigationResult};
use crate::helpers::is_iteration_context_started;
use crate::hooks;
use crate::iteration::{IterationPlan, IterationResolver};
use serde_json::Value;
use std::collections::HashSet;
use survey_model::{
    merge_values, Direction, InterviewSnapshot, IterationContext, NavigationSection, TargetSectionResult,
    ValuesByPath, RESPONSE_ROOT,
};
use survey_sections::{GraphError, HookKind, RepeatedBlock, SectionDescriptor, SectionGraph};

/// Section reached by a step, with the updates it requires
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Resolution {
    pub(crate) section: NavigationSection,
    pub(crate) updates: ValuesByPath,
}

impl Resolution {
    fn stay(section: NavigationSection) -> Self {
        Self {
            section,
            updates: ValuesByPath::new(),
        }
    }
}

/// Update key for a response path given in dotted form
pub(crate) fn response_key(path: &str) -> String {
    format!("{RESPONSE_ROOT}.{path}")
}

/// Read-only view used by one navigation call
#[derive(Debug, Clone, Copy)]
pub(crate) struct Traversal<'a> {
    pub(crate) graph: &'a SectionGraph,
    pub(crate) iterations: &'a IterationResolver,
    pub(crate) snapshot: &'a InterviewSnapshot,
}

impl<'a> Traversal<'a> {
    pub(crate) fn new(
        graph: &'a SectionGraph,
        iterations: &'a IterationResolver,
        snapshot: &'a InterviewSnapshot,
    ) -> Self {
        Self {
            graph,
            iterations,
            snapshot,
        }
    }

    pub(crate) fn descriptor(&self, name: &str) -> NavigationResult<&'a SectionDescriptor> {
        self.graph
            .get(name)
            .ok_or_else(|| NavigationError::UnknownSection(name.to_string()))
    }

    fn active_object_id(&self, block: &RepeatedBlock) -> Option<&'a str> {
        self.snapshot.get_str(&block.active_survey_object_path)
    }

    /// Position of `section` in the active iteration, or the block's
    /// selection section (the block itself without one) when none is active
    fn current_iteration_or_select(&self, section: &str, block_name: &str, block: &RepeatedBlock) -> NavigationSection {
        match self.active_object_id(block) {
            Some(id) => NavigationSection::with_context(
                section,
                IterationContext::for_object(block.path_prefix.as_deref(), id),
            ),
            None => NavigationSection::new(block.selection_section_id.as_deref().unwrap_or(block_name)),
        }
    }

    /// Add the active iteration to a block member without one, strip the
    /// iteration of a section outside any block
    pub(crate) fn with_iteration_context(&self, section: NavigationSection) -> NavigationResult<NavigationSection> {
        let descriptor = self.descriptor(&section.section_shortname)?;
        if descriptor.is_repeated_block() {
            return Ok(section);
        }
        if let Some((block_name, block)) = self.graph.parent_block(&descriptor.name) {
            if section.iteration_context.is_none() {
                return Ok(self.current_iteration_or_select(&descriptor.name, block_name, block));
            }
            return Ok(section);
        }
        if section.iteration_context.is_some() {
            return Ok(section.without_context());
        }
        Ok(section)
    }

    /// Give a selection section the iteration of the active element
    pub(crate) fn correct_current(&self, current: &NavigationSection) -> NavigationResult<NavigationSection> {
        let descriptor = self.descriptor(&current.section_shortname)?;
        if let Some((block_name, block)) = self.graph.parent_block(&descriptor.name) {
            if block.is_selection_section(&descriptor.name) {
                let corrected = self.current_iteration_or_select(&descriptor.name, block_name, block);
                if corrected.iteration_context.is_some() {
                    return Ok(corrected);
                }
            }
        }
        Ok(current.clone())
    }

    /// Update recording the target's iteration as the block's active element
    pub(crate) fn active_element_update(&self, target: &NavigationSection) -> ValuesByPath {
        let mut updates = ValuesByPath::new();
        let Some(object_id) = target.iteration_context.as_ref().and_then(IterationContext::last) else {
            return updates;
        };
        if let Some(block) = self.graph.owning_block(&target.section_shortname) {
            if self.active_object_id(block) != Some(object_id) {
                updates.insert(
                    response_key(&block.active_survey_object_path),
                    Value::String(object_id.to_string()),
                );
            }
        }
        updates
    }

    pub(crate) fn is_completed(&self, section: &NavigationSection) -> NavigationResult<bool> {
        let descriptor = self.descriptor(&section.section_shortname)?;
        hooks::evaluate(
            descriptor,
            HookKind::IsSectionCompleted,
            self.snapshot,
            section.iteration_context.as_ref(),
            true,
        )
    }

    fn is_enabled(&self, section: &NavigationSection) -> NavigationResult<bool> {
        let descriptor = self.descriptor(&section.section_shortname)?;
        if descriptor.hooks.enable_conditional.is_some() {
            return hooks::evaluate(
                descriptor,
                HookKind::EnableConditional,
                self.snapshot,
                section.iteration_context.as_ref(),
                true,
            );
        }
        let Some(previous) = &descriptor.previous_section else {
            return Ok(true);
        };
        let previous = self.with_iteration_context(NavigationSection {
            section_shortname: previous.clone(),
            iteration_context: section.iteration_context.clone(),
        })?;
        self.is_completed(&previous)
    }

    fn is_visible(&self, section: &NavigationSection) -> NavigationResult<bool> {
        let descriptor = self.descriptor(&section.section_shortname)?;
        if let Some((block_name, block)) = self.graph.parent_block(&descriptor.name) {
            if block.is_selection_section(&descriptor.name) {
                return Ok(self.iterations.resolve(block_name, block, self.snapshot)?.len() > 1);
            }
        }
        hooks::evaluate(
            descriptor,
            HookKind::IsSectionVisible,
            self.snapshot,
            section.iteration_context.as_ref(),
            true,
        )
    }

    pub(crate) fn is_enabled_and_visible(&self, section: &NavigationSection) -> NavigationResult<bool> {
        Ok(self.is_enabled(section)? && self.is_visible(section)?)
    }

    /// Walk from `current` until a section that can be displayed
    ///
    /// Returns `current` when the graph ends in that direction, or when the
    /// walk comes back to a position it already left.
    pub(crate) fn find_first_non_skipped(
        &self,
        current: &NavigationSection,
        direction: Direction,
    ) -> NavigationResult<Resolution> {
        let mut pointer = current.clone();
        let mut visited = HashSet::new();

        while visited.insert(pointer.clone()) {
            let descriptor = self.descriptor(&pointer.section_shortname)?;
            let Some(neighbour) = descriptor.neighbour(direction.is_forward()) else {
                return Ok(Resolution::stay(current.clone()));
            };

            let target = self.with_iteration_context(NavigationSection {
                section_shortname: neighbour.to_string(),
                iteration_context: pointer.iteration_context.clone(),
            })?;
            if !self.is_enabled_and_visible(&target)? {
                tracing::debug!(section = %target, %direction, "skipping section");
                pointer = target;
                continue;
            }

            let resolved = self.resolve_target(&target, &pointer, direction)?;
            if resolved.section != target && !self.is_enabled_and_visible(&resolved.section)? {
                tracing::debug!(section = %resolved.section, %direction, "skipping block section");
                pointer = resolved.section;
                continue;
            }
            return Ok(resolved);
        }

        tracing::error!(
            current = %current,
            reached = %pointer,
            "navigation cycle detected, keeping the current section"
        );
        Ok(Resolution::stay(current.clone()))
    }

    /// Resolve `target` to a displayed section if it is a repeated block
    pub(crate) fn resolve_target(
        &self,
        target: &NavigationSection,
        origin: &NavigationSection,
        direction: Direction,
    ) -> NavigationResult<Resolution> {
        let descriptor = self.descriptor(&target.section_shortname)?;
        match descriptor.repeated_block() {
            Some(block) => self.resolve_block(descriptor, block, origin, direction),
            None => Ok(Resolution::stay(target.clone())),
        }
    }

    fn resolve_block(
        &self,
        descriptor: &SectionDescriptor,
        block: &RepeatedBlock,
        origin: &NavigationSection,
        direction: Direction,
    ) -> NavigationResult<Resolution> {
        let plan = self.iterations.resolve(&descriptor.name, block, self.snapshot)?;
        let index = plan.position(origin.iteration_context.as_ref());
        let IterationPlan { contexts, updates } = plan;
        let last = contexts.len().checked_sub(1);

        match direction {
            Direction::Forward if index == last => {
                return self.end_of_block(descriptor, block, &contexts, updates);
            }
            Direction::Backward if index == Some(0) || contexts.is_empty() => {
                if let Some(previous) = descriptor.previous_section.as_deref() {
                    return Ok(leave_block(block, previous, updates));
                }
            }
            _ => {}
        }
        let Some(last) = last else {
            return self.end_of_block(descriptor, block, &contexts, updates);
        };

        let next = match (index, direction) {
            (None, _) => 0,
            (Some(i), Direction::Forward) => (i + 1).min(last),
            (Some(i), Direction::Backward) => i.saturating_sub(1),
        };
        let context = contexts[next].clone();
        let section = self.first_section_of_iteration(descriptor, block, &context)?;
        tracing::debug!(block = %descriptor.name, iteration = %context, %section, "entering iteration");
        Ok(Resolution {
            section: NavigationSection::with_context(section, context),
            updates,
        })
    }

    fn end_of_block(
        &self,
        descriptor: &SectionDescriptor,
        block: &RepeatedBlock,
        contexts: &[IterationContext],
        updates: ValuesByPath,
    ) -> NavigationResult<Resolution> {
        if block.is_iteration_valid.is_some() {
            for context in contexts {
                if hooks::iteration_valid(&descriptor.name, block, self.snapshot, context)? == Some(false) {
                    let start = block
                        .resume_start()
                        .ok_or_else(|| GraphError::EmptyBlock(descriptor.name.clone()))?;
                    let section = self.first_visible_in_block(block, context, start)?;
                    tracing::debug!(block = %descriptor.name, iteration = %context, "returning to invalid iteration");
                    return Ok(Resolution {
                        section: NavigationSection::with_context(section, context.clone()),
                        updates,
                    });
                }
            }
        }
        let next = descriptor
            .next_section
            .as_deref()
            .ok_or_else(|| GraphError::BlockWithoutNext(descriptor.name.clone()))?;
        Ok(leave_block(block, next, updates))
    }

    fn first_section_of_iteration(
        &self,
        descriptor: &SectionDescriptor,
        block: &RepeatedBlock,
        context: &IterationContext,
    ) -> NavigationResult<String> {
        let start = if is_iteration_context_started(self.snapshot, context) {
            block.revisit_start()
        } else {
            block.natural_flow_start()
        };
        let start = start.ok_or_else(|| GraphError::EmptyBlock(descriptor.name.clone()))?;
        self.first_visible_in_block(block, context, start)
    }

    /// First displayable block section from `start` on, else `start`
    fn first_visible_in_block(
        &self,
        block: &RepeatedBlock,
        context: &IterationContext,
        start: &str,
    ) -> NavigationResult<String> {
        let Some(index) = block.sections.iter().position(|name| name == start) else {
            return Ok(start.to_string());
        };
        for name in &block.sections[index..] {
            let candidate = NavigationSection::with_context(name.clone(), context.clone());
            if self.is_enabled_and_visible(&candidate)? {
                return Ok(name.clone());
            }
        }
        Ok(start.to_string())
    }

    /// Target of a navigation step, with the active element kept in sync
    pub(crate) fn navigate_from(
        &self,
        current: &NavigationSection,
        direction: Direction,
    ) -> NavigationResult<TargetSectionResult> {
        let corrected = self.correct_current(current)?;
        let resolution = self.find_first_non_skipped(&corrected, direction)?;
        if resolution.section == *current {
            return Ok(TargetSectionResult::stay(current.clone()));
        }
        let active = self.active_element_update(&resolution.section);
        let updates = merge_values([Some(&resolution.updates), Some(&active)]);
        Ok(TargetSectionResult::with_values(resolution.section, updates))
    }
}

fn leave_block(block: &RepeatedBlock, to: &str, mut updates: ValuesByPath) -> Resolution {
    updates.insert(response_key(&block.active_survey_object_path), Value::Null);
    Resolution {
        section: NavigationSection::new(to),
        updates,
    }
}
