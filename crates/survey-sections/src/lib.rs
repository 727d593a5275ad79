//! Survey Sections
//!
//! Declarative description of a questionnaire as a graph of named sections.
//!
//! # Architecture
//!
//! ```text
//! YAML / JSON / builder
//!         │
//!         ▼
//! SurveySectionsConfig ──SectionGraph::new──▶ SectionGraph
//!                          (validation)        │
//!                                              ├── Section { repeated_block_section }
//!                                              └── RepeatedBlock { iteration_rule, sections, .. }
//! ```
//!
//! Hooks attached to a section are optional; see [`hooks`] for the
//! predicate and event capability records.

pub mod condition;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod graph;
pub mod hooks;

pub use condition::{Condition, ITERATION_ID_PLACEHOLDER};
pub use config::{SectionConfig, SurveySectionsConfig};
pub use descriptor::{
    IterationOrder, IterationRule, RepeatedBlock, SectionDescriptor, SectionKind, INTERVIEWABLE_PERSONS,
};
pub use error::{ConfigError, GraphError, GraphResult};
pub use graph::SectionGraph;
pub use hooks::{parse_boolean, HookKind, Predicate, SectionEvent, SectionHooks};
