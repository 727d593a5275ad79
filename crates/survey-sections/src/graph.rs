//! Validated section graph
//!
//! [`SectionGraph::new`] checks the links of a [`SurveySectionsConfig`],
//! computes the back-reference from each block member to its block, and
//! freezes the result. A graph is read-only once built.

use crate::config::{SectionConfig, SurveySectionsConfig};
use crate::descriptor::{RepeatedBlock, SectionDescriptor, SectionKind};
use crate::error::{ConfigError, GraphError, GraphResult};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::Path;
use survey_model::ResponsePath;

/// Immutable graph of named sections
#[derive(Debug, Clone)]
pub struct SectionGraph {
    sections: IndexMap<String, SectionDescriptor>,
    entry_section: String,
}

impl SectionGraph {
    /// Validate a configuration and build the graph
    ///
    /// # Errors
    /// Returns the first structural problem found
    pub fn new(config: SurveySectionsConfig) -> GraphResult<Self> {
        let configs = config.into_inner();
        let memberships = block_memberships(&configs)?;

        let sections: IndexMap<String, SectionDescriptor> = configs
            .into_iter()
            .map(|(name, config)| {
                let SectionConfig {
                    previous_section,
                    next_section,
                    hooks,
                    repeated_block,
                } = config;
                let kind = match repeated_block {
                    Some(block) => SectionKind::RepeatedBlock(block),
                    None => SectionKind::Section {
                        repeated_block_section: memberships.get(&name).cloned(),
                    },
                };
                let descriptor = SectionDescriptor {
                    name: name.clone(),
                    previous_section,
                    next_section,
                    hooks,
                    kind,
                };
                (name, descriptor)
            })
            .collect();

        let entry_section = validate(&sections)?;
        tracing::debug!(
            sections = sections.len(),
            entry = %entry_section,
            "section graph built"
        );
        Ok(Self {
            sections,
            entry_section,
        })
    }

    /// Load, parse and validate a YAML or JSON configuration file
    ///
    /// # Errors
    /// Returns error if the file cannot be loaded or the graph is invalid
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::new(SurveySectionsConfig::from_path(path)?)?)
    }

    /// Descriptor of a section
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SectionDescriptor> {
        self.sections.get(name)
    }

    /// Whether a section exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// First section of the questionnaire
    #[inline]
    #[must_use]
    pub fn entry_section(&self) -> &str {
        &self.entry_section
    }

    /// Sections with no next section
    pub fn terminal_sections(&self) -> impl Iterator<Item = &SectionDescriptor> {
        self.sections.values().filter(|s| s.next_section.is_none())
    }

    /// Block configuration of the block containing `section`
    #[must_use]
    pub fn parent_block(&self, section: &str) -> Option<(&str, &RepeatedBlock)> {
        let block_name = self.get(section)?.parent_block()?;
        let block = self.get(block_name)?.repeated_block()?;
        Some((block_name, block))
    }

    /// Block configuration of `section` itself, or of its containing block
    #[must_use]
    pub fn owning_block(&self, section: &str) -> Option<&RepeatedBlock> {
        let descriptor = self.get(section)?;
        descriptor
            .repeated_block()
            .or_else(|| self.parent_block(section).map(|(_, block)| block))
    }

    /// Sections in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &SectionDescriptor> {
        self.sections.values()
    }

    /// Number of sections
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the graph is empty; never true for a built graph
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl TryFrom<SurveySectionsConfig> for SectionGraph {
    type Error = GraphError;

    fn try_from(config: SurveySectionsConfig) -> GraphResult<Self> {
        Self::new(config)
    }
}

fn block_memberships(configs: &IndexMap<String, SectionConfig>) -> GraphResult<HashMap<String, String>> {
    let mut memberships: HashMap<String, String> = HashMap::new();
    for (block_name, config) in configs {
        let Some(block) = &config.repeated_block else {
            continue;
        };
        if block.sections.is_empty() {
            return Err(GraphError::EmptyBlock(block_name.clone()));
        }
        for section in &block.sections {
            let Some(member) = configs.get(section) else {
                return Err(unknown(block_name, "sections", section));
            };
            if member.repeated_block.is_some() {
                return Err(GraphError::NestedBlock {
                    block: block_name.clone(),
                    section: section.clone(),
                });
            }
            if let Some(first) = memberships.insert(section.clone(), block_name.clone()) {
                return Err(GraphError::SectionInMultipleBlocks {
                    section: section.clone(),
                    first,
                    second: block_name.clone(),
                });
            }
        }
        if let Some(selection) = &block.selection_section_id {
            if !configs.contains_key(selection) {
                return Err(unknown(block_name, "selectionSectionId", selection));
            }
            if !block.sections.contains(selection) {
                return Err(GraphError::SelectionOutsideBlock {
                    block: block_name.clone(),
                    section: selection.clone(),
                });
            }
        }
    }
    Ok(memberships)
}

fn validate(sections: &IndexMap<String, SectionDescriptor>) -> GraphResult<String> {
    let mut entry: Option<&SectionDescriptor> = None;
    let mut has_terminal = false;

    for descriptor in sections.values() {
        for (field, target) in [
            ("previousSection", &descriptor.previous_section),
            ("nextSection", &descriptor.next_section),
        ] {
            if let Some(target) = target {
                if !sections.contains_key(target) {
                    return Err(unknown(&descriptor.name, field, target));
                }
            }
        }

        if descriptor.is_repeated_block() && descriptor.next_section.is_none() {
            return Err(GraphError::BlockWithoutNext(descriptor.name.clone()));
        }
        has_terminal |= descriptor.next_section.is_none();

        for values in descriptor.hooks.fixed_updates() {
            for key in values.keys() {
                ResponsePath::from_update_key(key).map_err(|source| GraphError::InvalidUpdateKey {
                    section: descriptor.name.clone(),
                    source,
                })?;
            }
        }

        if descriptor.previous_section.is_none() {
            if let Some(first) = entry {
                return Err(GraphError::MultipleEntrySections {
                    first: first.name.clone(),
                    second: descriptor.name.clone(),
                });
            }
            entry = Some(descriptor);
        }
    }

    let entry = entry.ok_or(GraphError::NoEntrySection)?;
    if entry.is_repeated_block() {
        return Err(GraphError::EntryIsRepeatedBlock(entry.name.clone()));
    }
    if !has_terminal {
        return Err(GraphError::NoTerminalSection);
    }
    Ok(entry.name.clone())
}

fn unknown(section: &str, field: &'static str, target: &str) -> GraphError {
    GraphError::UnknownReference {
        section: section.to_string(),
        field,
        target: target.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::IterationRule;
    use pretty_assertions::assert_eq;

    fn linear() -> SurveySectionsConfig {
        SurveySectionsConfig::new()
            .section("home", SectionConfig::new(None, Some("householdMembers")))
            .section("householdMembers", SectionConfig::new(Some("home"), Some("end")))
            .section("end", SectionConfig::new(Some("householdMembers"), None))
    }

    fn with_block() -> SurveySectionsConfig {
        SurveySectionsConfig::new()
            .section("home", SectionConfig::new(None, Some("trips")))
            .section(
                "trips",
                SectionConfig::new(Some("home"), Some("end")).with_repeated_block(
                    RepeatedBlock::new(IterationRule::interviewable_persons(), "_activePersonId", ["select", "visit"])
                        .with_selection_section("select", true),
                ),
            )
            .section("select", SectionConfig::new(Some("trips"), Some("visit")))
            .section("visit", SectionConfig::new(Some("select"), Some("trips")))
            .section("end", SectionConfig::new(Some("trips"), None))
    }

    #[test]
    fn builds_linear_graph() {
        let graph = SectionGraph::new(linear()).unwrap();
        assert_eq!(graph.entry_section(), "home");
        assert_eq!(graph.len(), 3);
        let terminals: Vec<&str> = graph.terminal_sections().map(|s| s.name.as_str()).collect();
        assert_eq!(terminals, vec!["end"]);
    }

    #[test]
    fn computes_block_back_references() {
        let graph = SectionGraph::new(with_block()).unwrap();
        assert_eq!(graph.get("visit").and_then(SectionDescriptor::parent_block), Some("trips"));
        assert_eq!(graph.get("home").and_then(SectionDescriptor::parent_block), None);
        let (name, block) = graph.parent_block("select").unwrap();
        assert_eq!(name, "trips");
        assert_eq!(block.active_survey_object_path, "_activePersonId");
        assert!(graph.owning_block("trips").is_some());
        assert!(graph.owning_block("end").is_none());
    }

    #[test]
    fn rejects_unknown_next_section() {
        let config = linear().section("end", SectionConfig::new(Some("householdMembers"), Some("nowhere")));
        let err = SectionGraph::new(config).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownReference {
                section: "end".into(),
                field: "nextSection",
                target: "nowhere".into(),
            }
        );
    }

    #[test]
    fn rejects_missing_or_duplicate_entry() {
        let no_entry = SurveySectionsConfig::new()
            .section("a", SectionConfig::new(Some("b"), Some("b")))
            .section("b", SectionConfig::new(Some("a"), None));
        assert_eq!(SectionGraph::new(no_entry).unwrap_err(), GraphError::NoEntrySection);

        let two_entries = linear().section("intro", SectionConfig::new(None, Some("home")));
        assert!(matches!(
            SectionGraph::new(two_entries),
            Err(GraphError::MultipleEntrySections { .. })
        ));
    }

    #[test]
    fn rejects_missing_terminal() {
        let config = SurveySectionsConfig::new()
            .section("a", SectionConfig::new(None, Some("b")))
            .section("b", SectionConfig::new(Some("a"), Some("a")));
        assert_eq!(SectionGraph::new(config).unwrap_err(), GraphError::NoTerminalSection);
    }

    #[test]
    fn rejects_block_without_next() {
        let block = RepeatedBlock::new(IterationRule::interviewable_persons(), "_active", ["visit"]);
        let config = SurveySectionsConfig::new()
            .section("home", SectionConfig::new(None, Some("trips")))
            .section("trips", SectionConfig::new(Some("home"), None).with_repeated_block(block))
            .section("visit", SectionConfig::new(Some("trips"), Some("trips")));
        assert_eq!(
            SectionGraph::new(config).unwrap_err(),
            GraphError::BlockWithoutNext("trips".into())
        );
    }

    #[test]
    fn rejects_empty_block_and_shared_members() {
        let empty = RepeatedBlock::new(IterationRule::interviewable_persons(), "_active", Vec::<String>::new());
        let config = linear().section(
            "householdMembers",
            SectionConfig::new(Some("home"), Some("end")).with_repeated_block(empty),
        );
        assert_eq!(
            SectionGraph::new(config).unwrap_err(),
            GraphError::EmptyBlock("householdMembers".into())
        );

        let second = RepeatedBlock::new(IterationRule::interviewable_persons(), "_other", ["visit"]);
        let config = with_block().section(
            "end",
            SectionConfig::new(Some("trips"), Some("more")),
        )
        .section(
            "more",
            SectionConfig::new(Some("end"), Some("last")).with_repeated_block(second),
        )
        .section("last", SectionConfig::new(Some("more"), None));
        assert!(matches!(
            SectionGraph::new(config),
            Err(GraphError::SectionInMultipleBlocks { .. })
        ));
    }

    #[test]
    fn rejects_selection_outside_block() {
        let block = RepeatedBlock::new(IterationRule::interviewable_persons(), "_active", ["visit"])
            .with_selection_section("home", false);
        let config = SurveySectionsConfig::new()
            .section("home", SectionConfig::new(None, Some("trips")))
            .section("trips", SectionConfig::new(Some("home"), Some("end")).with_repeated_block(block))
            .section("visit", SectionConfig::new(Some("trips"), Some("trips")))
            .section("end", SectionConfig::new(Some("trips"), None));
        assert!(matches!(
            SectionGraph::new(config),
            Err(GraphError::SelectionOutsideBlock { .. })
        ));
    }

    #[test]
    fn rejects_unrooted_fixed_update() {
        let mut values = survey_model::ValuesByPath::new();
        values.insert("validations.home".into(), serde_json::json!(true));
        let config = linear().section(
            "end",
            SectionConfig::new(Some("householdMembers"), None)
                .on_entry(crate::hooks::SectionEvent::SetValues(values)),
        );
        assert!(matches!(
            SectionGraph::new(config),
            Err(GraphError::InvalidUpdateKey { .. })
        ));
    }
}
