//! Iteration contexts
//!
//! An [`IterationContext`] identifies which element of a repeated block's
//! collection is active, as an ordered list of tokens (`["person", "p1"]`).
//! Tokens are only joined into a string at the boundaries: snapshot keys,
//! URL paths and diagnostics.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt::{self, Display, Formatter};

/// Separator used when an iteration context is rendered as a key
pub const CONTEXT_SEPARATOR: &str = "/";

/// Ordered token list identifying one iteration of a repeated block
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IterationContext(SmallVec<[String; 2]>);

impl IterationContext {
    /// Create a context from its tokens
    #[must_use]
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tokens.into_iter().map(Into::into).collect())
    }

    /// Context for a collection element, optionally prefixed
    #[must_use]
    pub fn for_object(path_prefix: Option<&str>, object_id: impl Into<String>) -> Self {
        let mut tokens = SmallVec::new();
        if let Some(prefix) = path_prefix {
            tokens.push(prefix.to_string());
        }
        tokens.push(object_id.into());
        Self(tokens)
    }

    /// Parse a `/`-joined context, `None` for an empty string
    #[must_use]
    pub fn parse(joined: &str) -> Option<Self> {
        if joined.is_empty() {
            None
        } else {
            Some(Self::new(joined.split(CONTEXT_SEPARATOR)))
        }
    }

    /// Tokens of this context
    #[inline]
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    /// Last token, which is the active object ID
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Number of tokens
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the context has no token
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tokens joined with `/`, as used in snapshot keys
    #[must_use]
    pub fn joined(&self) -> String {
        self.0.join(CONTEXT_SEPARATOR)
    }
}

impl Display for IterationContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl<S: Into<String>> FromIterator<S> for IterationContext {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter)
    }
}
