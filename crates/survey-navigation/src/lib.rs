//! Survey Navigation
//!
//! Decides which questionnaire section to display next, from a validated
//! [`SectionGraph`](survey_sections::SectionGraph) and the current answers.
//!
//! # Core Concepts
//!
//! - [`NavigationService`]: `navigate` forward/backward and
//!   `init_navigation_state` to resume or jump
//! - [`IterationResolver`]: iterations of repeated blocks, with persisted
//!   random orders
//! - [`SurveyObjectQuery`] / [`Shuffler`]: collaborators for builtin
//!   collections and random permutations
//! - [`helpers`]: the `_sections` bookkeeping recorded by host applications
//!
//! The service never mutates the interview. Every change it needs is
//! returned as `valuesByPath` for the caller to apply before the next call.
//!
//! # Example
//!
//! ```rust,ignore
//! use survey_navigation::prelude::*;
//!
//! let service = NavigationService::new(SectionGraph::from_path(path)?);
//! let result = service.navigate(&snapshot, &NavigationSection::new("home"), Direction::Forward)?;
//! snapshot.apply(result.values_by_path.as_ref().unwrap_or(&ValuesByPath::new()))?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
pub mod helpers;
mod hooks;
mod iteration;
mod query;
mod resume;
mod service;
mod shuffle;
mod traversal;

pub use error::{NavigationError, NavigationResult};
pub use iteration::{IterationPlan, IterationResolver};
pub use query::{HouseholdObjectQuery, SurveyObjectQuery, DEFAULT_INTERVIEWABLE_AGE, PERSONS_PATH};
pub use service::NavigationService;
pub use shuffle::{SeededShuffler, Shuffler, ThreadShuffler};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports for embedding the navigation service
pub mod prelude {
    pub use crate::{NavigationError, NavigationResult, NavigationService};
    pub use survey_model::{Direction, InterviewSnapshot, IterationContext, NavigationSection, TargetSectionResult, ValuesByPath};
    pub use survey_sections::{SectionConfig, SectionGraph, SurveySectionsConfig};
}
