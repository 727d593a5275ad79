//! Resuming an interview at a requested or remembered section

use crate::error::NavigationResult;
use crate::helpers::last_visited_section;
use crate::traversal::Traversal;
use survey_model::{merge_values, Direction, NavigationSection, TargetSectionResult};

impl Traversal<'_> {
    /// Section to display when (re)opening the questionnaire
    ///
    /// The requested section wins when known, then the last visited one, then
    /// the entry section. A candidate that cannot be displayed yet is
    /// replaced by the closest displayable section before it.
    pub(crate) fn resume(&self, requested: Option<&str>) -> NavigationResult<TargetSectionResult> {
        let candidate = self.with_iteration_context(self.resume_candidate(requested))?;

        if self.is_enabled_and_visible(&candidate)? {
            let resolved = self.resolve_target(&candidate, &candidate, Direction::Forward)?;
            if resolved.section == candidate || self.is_enabled_and_visible(&resolved.section)? {
                let active = self.active_element_update(&resolved.section);
                let updates = merge_values([Some(&active), Some(&resolved.updates)]);
                return Ok(TargetSectionResult::with_values(resolved.section, updates));
            }
        }

        tracing::debug!(section = %candidate, "section not reachable yet, looking backward");
        let fallback = self.find_first_non_skipped(&candidate, Direction::Backward)?;
        let active = self.active_element_update(&fallback.section);
        let updates = merge_values([Some(&fallback.updates), Some(&active)]);
        Ok(TargetSectionResult::with_values(fallback.section, updates))
    }

    fn resume_candidate(&self, requested: Option<&str>) -> NavigationSection {
        if let Some(name) = requested {
            if self.graph.contains(name) {
                return NavigationSection::new(name);
            }
            tracing::warn!(section = name, "requested section does not exist, ignoring it");
        }
        last_visited_section(self.snapshot)
            .filter(|section| self.graph.contains(&section.section_shortname))
            .unwrap_or_else(|| NavigationSection::new(self.graph.entry_section()))
    }
}
