//! Section graph errors

use std::path::PathBuf;
use survey_model::PathError;
use thiserror::Error;

/// Errors detected while building a section graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// No section without a previous section
    #[error("no entry section: exactly one section must have no previous section")]
    NoEntrySection,

    /// Several sections without a previous section
    #[error("multiple entry sections: '{first}' and '{second}' have no previous section")]
    MultipleEntrySections {
        /// First entry section, in declaration order
        first: String,
        /// Second entry section
        second: String,
    },

    /// No section without a next section
    #[error("no terminal section: at least one section must have no next section")]
    NoTerminalSection,

    /// The entry section is a repeated block
    #[error("entry section '{0}' is a repeated block")]
    EntryIsRepeatedBlock(String),

    /// A reference names a section absent from the graph
    #[error("section '{section}' references unknown section '{target}' in {field}")]
    UnknownReference {
        /// Section holding the reference
        section: String,
        /// Field holding the reference
        field: &'static str,
        /// Referenced name
        target: String,
    },

    /// A repeated block has no next section
    #[error("repeated block '{0}' must have a next section")]
    BlockWithoutNext(String),

    /// A repeated block lists no section
    #[error("repeated block '{0}' has no section")]
    EmptyBlock(String),

    /// A block contains another block
    #[error("repeated block '{block}' contains repeated block '{section}'")]
    NestedBlock {
        /// Containing block
        block: String,
        /// Contained block
        section: String,
    },

    /// A section belongs to two blocks
    #[error("section '{section}' belongs to both '{first}' and '{second}'")]
    SectionInMultipleBlocks {
        /// Shared section
        section: String,
        /// First block
        first: String,
        /// Second block
        second: String,
    },

    /// The selection section is not one of the block sections
    #[error("selection section '{section}' is not part of repeated block '{block}'")]
    SelectionOutsideBlock {
        /// Block
        block: String,
        /// Selection section
        section: String,
    },

    /// A fixed entry/exit update is not keyed under the response
    #[error("invalid update key in section '{section}': {source}")]
    InvalidUpdateKey {
        /// Section holding the update
        section: String,
        /// Key error
        #[source]
        source: PathError,
    },
}

/// Errors loading a section configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read '{path}': {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// IO error
        #[source]
        source: std::io::Error,
    },

    /// Extension is neither YAML nor JSON
    #[error("unsupported config format for '{0}': expected .yaml, .yml or .json")]
    UnsupportedFormat(PathBuf),

    /// YAML parse error
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parse error
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// Graph validation error
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Result type for graph construction
pub type GraphResult<T> = std::result::Result<T, GraphError>;
