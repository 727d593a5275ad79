//! Dotted paths into the interview response
//!
//! Provides [`ResponsePath`] for hierarchical addressing of answers within an
//! [`InterviewSnapshot`](crate::InterviewSnapshot).

use serde_json::{Map, Value};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Root segment under which every value update is addressed
pub const RESPONSE_ROOT: &str = "response";

/// Path within the interview response tree
///
/// Segments are separated by `.` in their textual form. A segment may hold any
/// character but `.`, so iteration keys such as `person/p1` stay a single
/// segment.
///
/// # Examples
/// - `["household", "persons"]` → `household.persons`
/// - `["_sections", "visitedPlaces", "person/p1", "_startedAt"]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResponsePath(Vec<String>);

impl ResponsePath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Create path from a single segment
    #[inline]
    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// Empty path (the response itself)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a value-update key (`response.<path>`) into a response path
    ///
    /// # Errors
    /// Returns error if the key is not rooted at [`RESPONSE_ROOT`] or has an
    /// empty segment
    pub fn from_update_key(key: &str) -> Result<Self, PathError> {
        let path: Self = key.parse()?;
        if path.first() != Some(RESPONSE_ROOT) {
            return Err(PathError::NotRooted(key.to_string()));
        }
        Ok(Self(path.0[1..].to_vec()))
    }

    /// Value-update key for this path (`response.<path>`)
    #[must_use]
    pub fn update_key(&self) -> String {
        if self.0.is_empty() {
            RESPONSE_ROOT.to_string()
        } else {
            format!("{RESPONSE_ROOT}.{self}")
        }
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get last segment (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Get first segment (if not root)
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Path extended with one more segment
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Read the value at this path, `None` when any segment is missing
    #[must_use]
    pub fn get_in<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(root, |value, segment| match value {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Write `value` at this path, creating intermediate objects
    ///
    /// Intermediate values that are not objects are replaced.
    pub fn set_in(&self, root: &mut Value, value: Value) {
        let Some((last, parents)) = self.0.split_last() else {
            *root = value;
            return;
        };
        let mut current = root;
        for segment in parents {
            current = ensure_object(current)
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        ensure_object(current).insert(last.clone(), value);
    }

    /// Remove the value at this path, returning it
    pub fn remove_in(&self, root: &mut Value) -> Option<Value> {
        let (last, parents) = self.0.split_last()?;
        let mut current = root;
        for segment in parents {
            current = current.as_object_mut()?.get_mut(segment)?;
        }
        current.as_object_mut()?.shift_remove(last)
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced by an object"),
    }
}

impl Display for ResponsePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for ResponsePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let segments: Vec<String> = s
            .split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment(s.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl From<Vec<String>> for ResponsePath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl Default for ResponsePath {
    fn default() -> Self {
        Self::root()
    }
}

/// Errors related to response paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),

    /// Update key not rooted at the response
    #[error("update key '{0}' is not rooted at '{RESPONSE_ROOT}'")]
    NotRooted(String),
}
