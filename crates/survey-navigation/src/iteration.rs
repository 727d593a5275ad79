//! Iteration context resolution for repeated blocks
//!
//! Computes the ordered iteration contexts of a block from the current
//! answers. Randomly ordered blocks persist their order in the response at
//! `_<pathPrefix>RandomSequence`; the persisted order is reused verbatim as
//! long as it still holds exactly the current objects.

use crate::error::{NavigationError, NavigationResult};
use crate::query::{HouseholdObjectQuery, SurveyObjectQuery};
use crate::shuffle::{Shuffler, ThreadShuffler};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use survey_model::{InterviewSnapshot, IterationContext, ResponsePath, ValuesByPath};
use survey_sections::{IterationOrder, IterationRule, RepeatedBlock};

/// Iterations of a block, with the updates needed to persist their order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IterationPlan {
    /// Contexts in traversal order
    pub contexts: Vec<IterationContext>,

    /// Updates produced while resolving (a new random order)
    pub updates: ValuesByPath,
}

impl IterationPlan {
    /// Position of `context` among the iterations
    #[must_use]
    pub fn position(&self, context: Option<&IterationContext>) -> Option<usize> {
        let context = context?;
        self.contexts.iter().position(|ctx| ctx == context)
    }

    /// Number of iterations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Whether there is no iteration
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

/// Computes iteration contexts, using the configured collaborators
#[derive(Clone)]
pub struct IterationResolver {
    query: Arc<dyn SurveyObjectQuery>,
    shuffler: Arc<dyn Shuffler>,
}

impl Default for IterationResolver {
    fn default() -> Self {
        Self::new(Arc::new(HouseholdObjectQuery::default()), Arc::new(ThreadShuffler))
    }
}

impl fmt::Debug for IterationResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterationResolver").finish_non_exhaustive()
    }
}

impl IterationResolver {
    /// Create a resolver
    #[must_use]
    pub fn new(query: Arc<dyn SurveyObjectQuery>, shuffler: Arc<dyn Shuffler>) -> Self {
        Self { query, shuffler }
    }

    /// Replace the builtin query
    #[must_use]
    pub fn with_query(mut self, query: Arc<dyn SurveyObjectQuery>) -> Self {
        self.query = query;
        self
    }

    /// Replace the shuffler
    #[must_use]
    pub fn with_shuffler(mut self, shuffler: Arc<dyn Shuffler>) -> Self {
        self.shuffler = shuffler;
        self
    }

    /// Object IDs of the block's collection, in natural order
    ///
    /// # Errors
    /// Returns [`NavigationError::UnsupportedIterationRule`] for unknown builtins
    pub fn object_ids(
        &self,
        block_name: &str,
        block: &RepeatedBlock,
        snapshot: &InterviewSnapshot,
    ) -> NavigationResult<Vec<String>> {
        match &block.iteration_rule {
            IterationRule::Builtin { path } => {
                self.query
                    .object_ids(path, snapshot)
                    .ok_or_else(|| NavigationError::UnsupportedIterationRule {
                        block: block_name.to_string(),
                        rule: path.clone(),
                    })
            }
            IterationRule::SurveyObjectPath { path } => Ok(snapshot
                .get_response(path)
                .and_then(Value::as_object)
                .map(|objects| objects.keys().cloned().collect())
                .unwrap_or_default()),
        }
    }

    /// Ordered iteration contexts of a block
    ///
    /// # Errors
    /// Returns [`NavigationError::UnsupportedIterationRule`] for unknown builtins
    pub fn resolve(
        &self,
        block_name: &str,
        block: &RepeatedBlock,
        snapshot: &InterviewSnapshot,
    ) -> NavigationResult<IterationPlan> {
        let mut ids = self.object_ids(block_name, block, snapshot)?;
        let mut updates = ValuesByPath::new();

        if block.order == IterationOrder::Random {
            let sequence_path = block.random_sequence_path();
            match persisted_order(snapshot, &sequence_path) {
                Some(order) if is_permutation_of(&order, &ids) => ids = order,
                persisted => {
                    if persisted.is_some() {
                        tracing::warn!(
                            block = block_name,
                            path = %sequence_path,
                            "persisted random order no longer matches the collection, regenerating"
                        );
                    }
                    ids = self.shuffler.shuffle(ids);
                    updates.insert(
                        ResponsePath::single(sequence_path).update_key(),
                        Value::Array(ids.iter().cloned().map(Value::String).collect()),
                    );
                }
            }
        }

        let prefix = block.path_prefix.as_deref();
        let contexts = ids
            .into_iter()
            .map(|id| IterationContext::for_object(prefix, id))
            .collect();
        Ok(IterationPlan { contexts, updates })
    }
}

fn persisted_order(snapshot: &InterviewSnapshot, path: &str) -> Option<Vec<String>> {
    snapshot
        .get_response(path)?
        .as_array()?
        .iter()
        .map(|id| id.as_str().map(str::to_string))
        .collect()
}

fn is_permutation_of(order: &[String], ids: &[String]) -> bool {
    if order.len() != ids.len() {
        return false;
    }
    let expected: HashSet<&String> = ids.iter().collect();
    let actual: HashSet<&String> = order.iter().collect();
    expected == actual
}
