//! Survey Model
//!
//! Value types shared by the section graph and the navigation engine:
//! - [`InterviewSnapshot`]: read-only view of the answers
//! - [`ResponsePath`]: dotted addressing into the response tree
//! - [`IterationContext`]: which element of a repeated block is active
//! - [`NavigationSection`] and [`TargetSectionResult`]: positions and results

pub mod context;
pub mod path;
pub mod section;
pub mod snapshot;

pub use context::{IterationContext, CONTEXT_SEPARATOR};
pub use path::{PathError, ResponsePath, RESPONSE_ROOT};
pub use section::{merge_values, Direction, NavigationSection, TargetSectionResult, ValuesByPath};
pub use snapshot::InterviewSnapshot;
