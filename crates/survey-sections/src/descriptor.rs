//! Section descriptors
//!
//! Two kinds of sections make up a graph: plain sections, shown once (or once
//! per iteration when they belong to a block), and repeated blocks, which
//! are never displayed themselves and stand for a run of sections traversed
//! once per element of a collection.

use crate::hooks::{Predicate, SectionHooks};
use serde::Deserialize;

/// Builtin collection listing the interviewable persons of the household
pub const INTERVIEWABLE_PERSONS: &str = "interviewablePersons";

/// What a repeated block iterates over
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IterationRule {
    /// Keys of the mapping stored at `path` in the response
    SurveyObjectPath {
        /// Dotted response path, e.g. `household.persons`
        path: String,
    },

    /// Collection computed by a builtin query
    Builtin {
        /// Builtin name; only [`INTERVIEWABLE_PERSONS`] is supported
        path: String,
    },
}

impl IterationRule {
    /// Iterate over the interviewable persons
    #[inline]
    #[must_use]
    pub fn interviewable_persons() -> Self {
        Self::Builtin {
            path: INTERVIEWABLE_PERSONS.to_string(),
        }
    }

    /// Iterate over the keys of a response mapping
    #[inline]
    #[must_use]
    pub fn survey_object_path(path: impl Into<String>) -> Self {
        Self::SurveyObjectPath { path: path.into() }
    }
}

/// Order in which iterations are traversed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IterationOrder {
    /// Collection order
    #[default]
    Sequential,

    /// Shuffled once, then persisted in the response
    Random,
}

/// Configuration of a repeated block
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatedBlock {
    /// Collection to iterate over
    pub iteration_rule: IterationRule,

    /// Iteration order
    #[serde(default)]
    pub order: IterationOrder,

    /// Section where the respondent picks the active object
    #[serde(default)]
    pub selection_section_id: Option<String>,

    /// Skip the selection section the first time an iteration is reached
    #[serde(default)]
    pub skip_selection_in_natural_flow: bool,

    /// Response path holding the active object ID, e.g. `_activePersonId`
    pub active_survey_object_path: String,

    /// Token prepended to object IDs in iteration contexts
    #[serde(default)]
    pub path_prefix: Option<String>,

    /// Sections of the block, in display order
    pub sections: Vec<String>,

    /// Whether an iteration is complete enough to leave the block
    #[serde(default)]
    pub is_iteration_valid: Option<Predicate>,
}

impl RepeatedBlock {
    /// Create a sequential block without selection section
    #[must_use]
    pub fn new<I, S>(iteration_rule: IterationRule, active_survey_object_path: impl Into<String>, sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            iteration_rule,
            order: IterationOrder::Sequential,
            selection_section_id: None,
            skip_selection_in_natural_flow: false,
            active_survey_object_path: active_survey_object_path.into(),
            path_prefix: None,
            sections: sections.into_iter().map(Into::into).collect(),
            is_iteration_valid: None,
        }
    }

    /// Set the selection section
    #[inline]
    #[must_use]
    pub fn with_selection_section(mut self, section: impl Into<String>, skip_in_natural_flow: bool) -> Self {
        self.selection_section_id = Some(section.into());
        self.skip_selection_in_natural_flow = skip_in_natural_flow;
        self
    }

    /// Set the iteration order
    #[inline]
    #[must_use]
    pub fn with_order(mut self, order: IterationOrder) -> Self {
        self.order = order;
        self
    }

    /// Set the context path prefix
    #[inline]
    #[must_use]
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    /// Set the iteration validity predicate
    #[inline]
    #[must_use]
    pub fn with_iteration_validity(mut self, predicate: impl Into<Predicate>) -> Self {
        self.is_iteration_valid = Some(predicate.into());
        self
    }

    /// Response path of the persisted random order: `_<prefix>RandomSequence`
    #[must_use]
    pub fn random_sequence_path(&self) -> String {
        format!("_{}RandomSequence", self.path_prefix.as_deref().unwrap_or_default())
    }

    /// Whether `section` is this block's selection section
    #[must_use]
    pub fn is_selection_section(&self, section: &str) -> bool {
        self.selection_section_id.as_deref() == Some(section)
    }

    /// Section an iteration starts at when it has never been started
    #[must_use]
    pub fn natural_flow_start(&self) -> Option<&str> {
        match self.sections.as_slice() {
            [first, second, ..] if self.skip_selection_in_natural_flow && self.is_selection_section(first) => {
                Some(second)
            }
            [first, ..] => Some(first),
            [] => None,
        }
    }

    /// Section an iteration starts at when it is re-entered
    #[must_use]
    pub fn revisit_start(&self) -> Option<&str> {
        self.selection_section_id
            .as_deref()
            .or_else(|| self.sections.first().map(String::as_str))
    }

    /// Section after the selection section, where an invalid iteration is resumed
    #[must_use]
    pub fn resume_start(&self) -> Option<&str> {
        let index = usize::from(self.selection_section_id.is_some());
        self.sections
            .get(index)
            .or_else(|| self.sections.first())
            .map(String::as_str)
    }
}

/// Kind of a section descriptor
#[derive(Debug, Clone)]
pub enum SectionKind {
    /// Displayed section
    Section {
        /// Block containing this section, set when the graph is built
        repeated_block_section: Option<String>,
    },

    /// Repeated block
    RepeatedBlock(RepeatedBlock),
}

/// One validated node of the section graph
#[derive(Debug, Clone)]
pub struct SectionDescriptor {
    /// Section name
    pub name: String,

    /// Section before this one, `None` for the entry section
    pub previous_section: Option<String>,

    /// Section after this one, `None` for terminal sections
    pub next_section: Option<String>,

    /// Optional hooks
    pub hooks: SectionHooks,

    /// Kind and kind-specific data
    pub kind: SectionKind,
}

impl SectionDescriptor {
    /// Block configuration, if this is a repeated block
    #[inline]
    #[must_use]
    pub fn repeated_block(&self) -> Option<&RepeatedBlock> {
        match &self.kind {
            SectionKind::RepeatedBlock(block) => Some(block),
            SectionKind::Section { .. } => None,
        }
    }

    /// Whether this is a repeated block
    #[inline]
    #[must_use]
    pub fn is_repeated_block(&self) -> bool {
        matches!(self.kind, SectionKind::RepeatedBlock(_))
    }

    /// Name of the block containing this plain section
    #[inline]
    #[must_use]
    pub fn parent_block(&self) -> Option<&str> {
        match &self.kind {
            SectionKind::Section { repeated_block_section } => repeated_block_section.as_deref(),
            SectionKind::RepeatedBlock(_) => None,
        }
    }

    /// Neighbour in the given direction
    #[inline]
    #[must_use]
    pub fn neighbour(&self, forward: bool) -> Option<&str> {
        if forward {
            self.next_section.as_deref()
        } else {
            self.previous_section.as_deref()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn person_block() -> RepeatedBlock {
        RepeatedBlock::new(
            IterationRule::interviewable_persons(),
            "_activePersonId",
            ["selectPerson", "visitedPlaces", "travelBehavior"],
        )
    }

    #[test]
    fn random_sequence_path_uses_prefix() {
        assert_eq!(person_block().random_sequence_path(), "_RandomSequence");
        assert_eq!(
            person_block().with_path_prefix("person").random_sequence_path(),
            "_personRandomSequence"
        );
    }

    #[test]
    fn natural_flow_skips_selection_only_when_configured() {
        let block = person_block().with_selection_section("selectPerson", true);
        assert_eq!(block.natural_flow_start(), Some("visitedPlaces"));
        assert_eq!(block.revisit_start(), Some("selectPerson"));

        let block = person_block().with_selection_section("selectPerson", false);
        assert_eq!(block.natural_flow_start(), Some("selectPerson"));
    }

    #[test]
    fn resume_start_is_after_selection() {
        let with_selection = person_block().with_selection_section("selectPerson", false);
        assert_eq!(with_selection.resume_start(), Some("visitedPlaces"));
        assert_eq!(person_block().resume_start(), Some("selectPerson"));
    }

    #[test]
    fn deserializes_camel_case() {
        let block: RepeatedBlock = serde_json::from_value(json!({
            "iterationRule": { "type": "surveyObjectPath", "path": "household.persons" },
            "order": "random",
            "activeSurveyObjectPath": "_activePersonId",
            "pathPrefix": "person",
            "sections": ["visitedPlaces"]
        }))
        .unwrap();
        assert_eq!(block.iteration_rule, IterationRule::survey_object_path("household.persons"));
        assert_eq!(block.order, IterationOrder::Random);
        assert_eq!(block.path_prefix.as_deref(), Some("person"));
        assert!(!block.skip_selection_in_natural_flow);
    }
}
