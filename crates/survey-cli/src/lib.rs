//! `survey-nav`: run the navigation service from the command line
//!
//! Loads a section configuration (YAML or JSON) and an interview JSON file,
//! then prints the navigation result as JSON. Useful to check a
//! questionnaire definition without a host application.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use survey_model::{Direction, InterviewSnapshot, IterationContext, NavigationSection};
use survey_navigation::{NavigationService, SeededShuffler};
use survey_sections::SectionGraph;
use tracing_subscriber::EnvFilter;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "survey-nav", version, about = "Navigate questionnaire section graphs")]
pub struct Cli {
    /// Logging options
    #[command(flatten)]
    pub logging: LoggingArgs,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Verbosity and log format, shared by every command
#[derive(Debug, Clone, Default, Args)]
pub struct LoggingArgs {
    /// More logs on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

impl LoggingArgs {
    /// Filter used when `RUST_LOG` is not set
    #[must_use]
    pub fn default_directive(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the section graph and report configuration errors
    Validate {
        /// Section configuration (.yaml, .yml or .json)
        sections: PathBuf,
    },

    /// Compute the section shown after a next/previous request
    Navigate(NavigateArgs),

    /// Compute the section shown when the questionnaire is opened
    Init(InitArgs),
}

/// Files every navigation command needs
#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Section configuration (.yaml, .yml or .json)
    #[arg(long)]
    pub sections: PathBuf,

    /// Interview JSON, either `{ "response": { .. } }` or the response itself
    #[arg(long)]
    pub interview: PathBuf,

    /// Seed for random iteration orders
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments of `navigate`
#[derive(Debug, Args)]
pub struct NavigateArgs {
    /// Input files
    #[command(flatten)]
    pub session: SessionArgs,

    /// Current section
    #[arg(long)]
    pub section: String,

    /// Iteration of the current section, tokens joined with `/`
    #[arg(long)]
    pub context: Option<String>,

    /// Navigation direction
    #[arg(long, default_value = "forward")]
    pub direction: Direction,
}

/// Arguments of `init`
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Input files
    #[command(flatten)]
    pub session: SessionArgs,

    /// Section the respondent asked for
    #[arg(long)]
    pub requested: Option<String>,

    /// Section currently displayed, if any
    #[arg(long)]
    pub current: Option<String>,

    /// Iteration of the current section, tokens joined with `/`
    #[arg(long, requires = "current")]
    pub context: Option<String>,
}

/// Summary printed by `validate`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphSummary<'a> {
    entry_section: &'a str,
    section_count: usize,
    terminal_sections: Vec<&'a str>,
    repeated_blocks: Vec<&'a str>,
}

/// Install the global subscriber writing to stderr
///
/// `RUST_LOG` takes precedence over the verbosity flags.
pub fn init_tracing(logging: &LoggingArgs) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(logging.default_directive()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Run a command and return what must be printed on stdout
///
/// # Errors
/// Returns error if a file cannot be loaded or navigation fails
pub fn run(cli: &Cli) -> Result<String> {
    match &cli.command {
        Command::Validate { sections } => validate(sections),
        Command::Navigate(args) => {
            let (service, snapshot) = open_session(&args.session)?;
            let current = position(&args.section, args.context.as_deref());
            tracing::info!(section = %current, direction = %args.direction, "navigating");
            let result = service
                .navigate(&snapshot, &current, args.direction)
                .with_context(|| format!("cannot navigate from '{current}'"))?;
            to_json(&result)
        }
        Command::Init(args) => {
            let (service, snapshot) = open_session(&args.session)?;
            let current = args
                .current
                .as_deref()
                .map(|name| position(name, args.context.as_deref()));
            let result = service
                .init_navigation_state(&snapshot, args.requested.as_deref(), current.as_ref())
                .context("cannot initialize navigation")?;
            to_json(&result)
        }
    }
}

fn validate(path: &Path) -> Result<String> {
    let graph = load_graph(path)?;
    let summary = GraphSummary {
        entry_section: graph.entry_section(),
        section_count: graph.len(),
        terminal_sections: graph.terminal_sections().map(|s| s.name.as_str()).collect(),
        repeated_blocks: graph
            .iter()
            .filter(|s| s.is_repeated_block())
            .map(|s| s.name.as_str())
            .collect(),
    };
    to_json(&summary)
}

fn load_graph(path: &Path) -> Result<SectionGraph> {
    SectionGraph::from_path(path).with_context(|| format!("invalid section configuration '{}'", path.display()))
}

fn open_session(args: &SessionArgs) -> Result<(NavigationService, InterviewSnapshot)> {
    let mut service = NavigationService::new(load_graph(&args.sections)?);
    if let Some(seed) = args.seed {
        service = service.with_shuffler(Arc::new(SeededShuffler::new(seed)));
    }
    let snapshot = load_interview(&args.interview)?;
    Ok((service, snapshot))
}

/// Read an interview file
///
/// # Errors
/// Returns error if the file cannot be read or is not a JSON object
pub fn load_interview(path: &Path) -> Result<InterviewSnapshot> {
    let source =
        std::fs::read_to_string(path).with_context(|| format!("failed to read interview '{}'", path.display()))?;
    let document: Value =
        serde_json::from_str(&source).with_context(|| format!("invalid interview JSON '{}'", path.display()))?;
    interview_from_value(document)
}

fn interview_from_value(mut document: Value) -> Result<InterviewSnapshot> {
    let Some(object) = document.as_object_mut() else {
        bail!("interview must be a JSON object");
    };
    let response = match object.remove("response") {
        Some(response @ Value::Object(_)) => response,
        Some(_) => bail!("interview response must be a JSON object"),
        None => document,
    };
    Ok(InterviewSnapshot::new(response))
}

fn position(section: &str, context: Option<&str>) -> NavigationSection {
    match context.and_then(IterationContext::parse) {
        Some(ctx) => NavigationSection::with_context(section, ctx),
        None => NavigationSection::new(section),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize output")
}
