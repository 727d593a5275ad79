//! Section configuration
//!
//! [`SurveySectionsConfig`] is the unvalidated, serde-loadable form of a
//! section graph. Sections are kept in declaration order. Function hooks
//! cannot be written in a config file; attach them with the
//! [`SectionConfig`] builder methods.

use crate::descriptor::RepeatedBlock;
use crate::error::ConfigError;
use crate::hooks::{Predicate, SectionEvent, SectionHooks};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

/// Configuration of one section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionConfig {
    /// Section before this one
    #[serde(default)]
    pub previous_section: Option<String>,

    /// Section after this one
    #[serde(default)]
    pub next_section: Option<String>,

    /// Optional hooks
    #[serde(flatten)]
    pub hooks: SectionHooks,

    /// Set for repeated blocks only
    #[serde(default)]
    pub repeated_block: Option<RepeatedBlock>,
}

impl SectionConfig {
    /// Create a section linked to its neighbours
    #[must_use]
    pub fn new(previous_section: Option<&str>, next_section: Option<&str>) -> Self {
        Self {
            previous_section: previous_section.map(str::to_string),
            next_section: next_section.map(str::to_string),
            ..Self::default()
        }
    }

    /// Make this section a repeated block
    #[inline]
    #[must_use]
    pub fn with_repeated_block(mut self, block: RepeatedBlock) -> Self {
        self.repeated_block = Some(block);
        self
    }

    /// Set the enable conditional
    #[inline]
    #[must_use]
    pub fn with_enable_conditional(mut self, predicate: impl Into<Predicate>) -> Self {
        self.hooks.enable_conditional = Some(predicate.into());
        self
    }

    /// Set the visibility predicate
    #[inline]
    #[must_use]
    pub fn with_visibility(mut self, predicate: impl Into<Predicate>) -> Self {
        self.hooks.is_section_visible = Some(predicate.into());
        self
    }

    /// Set the completion predicate
    #[inline]
    #[must_use]
    pub fn with_completion(mut self, predicate: impl Into<Predicate>) -> Self {
        self.hooks.is_section_completed = Some(predicate.into());
        self
    }

    /// Set the entry event
    #[inline]
    #[must_use]
    pub fn on_entry(mut self, event: SectionEvent) -> Self {
        self.hooks.on_section_entry = Some(event);
        self
    }

    /// Set the exit event
    #[inline]
    #[must_use]
    pub fn on_exit(mut self, event: SectionEvent) -> Self {
        self.hooks.on_section_exit = Some(event);
        self
    }
}

/// Unvalidated section graph, keyed by section name in declaration order
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct SurveySectionsConfig {
    sections: IndexMap<String, SectionConfig>,
}

impl SurveySectionsConfig {
    /// Create an empty configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a section, keeping its first declaration position
    #[must_use]
    pub fn section(mut self, name: impl Into<String>, config: SectionConfig) -> Self {
        self.sections.insert(name.into(), config);
        self
    }

    /// Mutable access to a section, to attach function hooks after loading
    pub fn get_mut(&mut self, name: &str) -> Option<&mut SectionConfig> {
        self.sections.get_mut(name)
    }

    /// Sections in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SectionConfig)> {
        self.sections.iter()
    }

    /// Number of sections
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether there is no section
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub(crate) fn into_inner(self) -> IndexMap<String, SectionConfig> {
        self.sections
    }

    /// Parse a YAML configuration
    ///
    /// # Errors
    /// Returns error if the document does not match the config schema
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Parse a JSON configuration
    ///
    /// # Errors
    /// Returns error if the document does not match the config schema
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Load a configuration file, choosing the format by extension
    ///
    /// # Errors
    /// Returns error if the file cannot be read, has an unknown extension or
    /// does not parse
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&source),
            Some("json") => Self::from_json_str(&source),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

impl FromIterator<(String, SectionConfig)> for SurveySectionsConfig {
    fn from_iter<T: IntoIterator<Item = (String, SectionConfig)>>(iter: T) -> Self {
        Self {
            sections: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use crate::descriptor::IterationOrder;
    use pretty_assertions::assert_eq;

    const YAML: &str = r"
home:
  previousSection: null
  nextSection: householdMembers
  isSectionCompleted:
    op: is_set
    path: home.address
householdMembers:
  previousSection: home
  nextSection: personsTrips
  onSectionEntry:
    response._householdStarted: true
personsTrips:
  previousSection: householdMembers
  nextSection: end
  enableConditional: true
  repeatedBlock:
    iterationRule:
      type: builtin
      path: interviewablePersons
    order: random
    activeSurveyObjectPath: _activePersonId
    sections: [visitedPlaces]
visitedPlaces:
  previousSection: personsTrips
  nextSection: personsTrips
end:
  previousSection: personsTrips
";

    #[test]
    fn yaml_keeps_declaration_order() {
        let config = SurveySectionsConfig::from_yaml_str(YAML).unwrap();
        let names: Vec<&str> = config.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            vec!["home", "householdMembers", "personsTrips", "visitedPlaces", "end"]
        );
    }

    #[test]
    fn yaml_hooks_and_block() {
        let config = SurveySectionsConfig::from_yaml_str(YAML).unwrap();
        let sections: IndexMap<_, _> = config.into_inner();

        let home = &sections["home"];
        assert!(home.previous_section.is_none());
        assert!(matches!(
            home.hooks.is_section_completed,
            Some(Predicate::Expr(Condition::IsSet { .. }))
        ));
        assert!(matches!(
            sections["householdMembers"].hooks.on_section_entry,
            Some(SectionEvent::SetValues(_))
        ));

        let block = sections["personsTrips"].repeated_block.as_ref().unwrap();
        assert_eq!(block.order, IterationOrder::Random);
        assert_eq!(block.sections, vec!["visitedPlaces".to_string()]);
        assert!(sections["end"].next_section.is_none());
    }

    #[test]
    fn json_config() {
        let config = SurveySectionsConfig::from_json_str(
            r#"{ "a": { "nextSection": "b" }, "b": { "previousSection": "a" } }"#,
        )
        .unwrap();
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sections.toml");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            SurveySectionsConfig::from_path(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn builder_attaches_function_hooks() {
        let config = SurveySectionsConfig::new().section(
            "home",
            SectionConfig::new(None, None).with_visibility(Predicate::function(|_, _| Ok(false))),
        );
        assert!(matches!(
            config.iter().next().map(|(_, c)| &c.hooks.is_section_visible),
            Some(Some(Predicate::Function(_)))
        ));
    }
}
