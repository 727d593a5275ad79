//! Navigation positions and results

use crate::context::IterationContext;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Value updates to merge in the interview, keyed by `response.<path>`
///
/// A `Value::Null` means the path must be unset.
pub type ValuesByPath = IndexMap<String, Value>;

/// One navigational position: a section, and the iteration it is shown for
///
/// Two positions with the same shortname but different iteration contexts are
/// distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationSection {
    /// Name of the section in the section graph
    pub section_shortname: String,

    /// Iteration of the repeated block, if the section is part of one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration_context: Option<IterationContext>,
}

impl NavigationSection {
    /// Position for a section outside of any iteration
    #[inline]
    #[must_use]
    pub fn new(section_shortname: impl Into<String>) -> Self {
        Self {
            section_shortname: section_shortname.into(),
            iteration_context: None,
        }
    }

    /// Position for a section in a specific iteration
    #[inline]
    #[must_use]
    pub fn with_context(
        section_shortname: impl Into<String>,
        iteration_context: IterationContext,
    ) -> Self {
        Self {
            section_shortname: section_shortname.into(),
            iteration_context: Some(iteration_context),
        }
    }

    /// Same section, without any iteration context
    #[must_use]
    pub fn without_context(&self) -> Self {
        Self::new(self.section_shortname.clone())
    }

    /// URL-like rendering: `shortname[/token...]`
    #[must_use]
    pub fn to_url_path(&self) -> String {
        match &self.iteration_context {
            Some(ctx) if !ctx.is_empty() => format!("{}/{}", self.section_shortname, ctx.joined()),
            _ => self.section_shortname.clone(),
        }
    }
}

impl Display for NavigationSection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url_path())
    }
}

/// Direction of a navigation request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards `nextSection`
    #[default]
    Forward,

    /// Towards `previousSection`
    Backward,
}

impl Direction {
    /// Whether this is the forward direction
    #[inline]
    #[must_use]
    pub fn is_forward(self) -> bool {
        matches!(self, Self::Forward)
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
        })
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Self::Forward),
            "backward" => Ok(Self::Backward),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

/// Result of a navigation: where to go and what to update first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSectionResult {
    /// Section to display
    pub target_section: NavigationSection,

    /// Values the caller must merge in the interview before the next call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values_by_path: Option<ValuesByPath>,
}

impl TargetSectionResult {
    /// Result without any value update
    #[inline]
    #[must_use]
    pub fn stay(target_section: NavigationSection) -> Self {
        Self {
            target_section,
            values_by_path: None,
        }
    }

    /// Result with updates, normalizing an empty map to `None`
    #[must_use]
    pub fn with_values(target_section: NavigationSection, values: ValuesByPath) -> Self {
        Self {
            target_section,
            values_by_path: if values.is_empty() { None } else { Some(values) },
        }
    }
}

/// Merge update maps in order, later maps overriding earlier keys
#[must_use]
pub fn merge_values<'a, I>(maps: I) -> ValuesByPath
where
    I: IntoIterator<Item = Option<&'a ValuesByPath>>,
{
    let mut merged = ValuesByPath::new();
    for map in maps.into_iter().flatten() {
        for (key, value) in map {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}
