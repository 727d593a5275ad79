//! Testing utilities for the survey navigation workspace
//!
//! Shared section graphs, interview builders, a deterministic shuffler and a
//! small simulator that applies navigation results the way a host
//! application does.
//!
//! Hooks of the fixture graphs are switched off through flags in the
//! response: `flags.<name> = true` makes the corresponding predicate return
//! `false`.

#![allow(missing_docs)]

use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use survey_model::{Direction, InterviewSnapshot, IterationContext, NavigationSection, ResponsePath, ValuesByPath};
use survey_navigation::helpers::section_change_updates;
use survey_navigation::{NavigationService, Shuffler};
use survey_sections::{
    Condition, IterationRule, Predicate, RepeatedBlock, SectionConfig, SectionGraph, SurveySectionsConfig,
};

/// Predicate that is true unless `flags.<flag>` is set
pub fn unless_flag(flag: &str) -> Predicate {
    Condition::truthy(format!("flags.{flag}")).negate().into()
}

/// `home → householdMembers → end`, with every hook of `householdMembers`
/// controlled by flags (`homeIncomplete`, `hhDisabled`, `hhHidden`,
/// `hhIncomplete`)
pub fn simple_config() -> SurveySectionsConfig {
    SurveySectionsConfig::new()
        .section(
            "home",
            SectionConfig::new(None, Some("householdMembers")).with_completion(unless_flag("homeIncomplete")),
        )
        .section(
            "householdMembers",
            SectionConfig::new(Some("home"), Some("end"))
                .with_enable_conditional(unless_flag("hhDisabled"))
                .with_visibility(unless_flag("hhHidden"))
                .with_completion(unless_flag("hhIncomplete")),
        )
        .section("end", SectionConfig::new(Some("householdMembers"), None))
}

pub fn simple_service() -> NavigationService {
    NavigationService::new(SectionGraph::new(simple_config()).unwrap())
}

/// Repeated block over the interviewable persons
pub fn persons_trips_block() -> RepeatedBlock {
    RepeatedBlock::new(
        IterationRule::interviewable_persons(),
        "_activePersonId",
        ["selectPerson", "visitedPlaces", "travelBehavior"],
    )
    .with_selection_section("selectPerson", true)
}

/// Household survey with a `personsTrips` block
///
/// ```text
/// home → householdMembers → personsTrips[selectPerson → visitedPlaces → travelBehavior] → end
/// ```
///
/// Flags: `tripsDisabled`, `tbDisabled`, `tbHidden`.
pub fn complex_config_with(block: RepeatedBlock) -> SurveySectionsConfig {
    SurveySectionsConfig::new()
        .section("home", SectionConfig::new(None, Some("householdMembers")))
        .section("householdMembers", SectionConfig::new(Some("home"), Some("personsTrips")))
        .section(
            "personsTrips",
            SectionConfig::new(Some("householdMembers"), Some("end"))
                .with_enable_conditional(unless_flag("tripsDisabled"))
                .with_repeated_block(block),
        )
        .section("selectPerson", SectionConfig::new(Some("personsTrips"), Some("visitedPlaces")))
        .section("visitedPlaces", SectionConfig::new(Some("selectPerson"), Some("travelBehavior")))
        .section(
            "travelBehavior",
            SectionConfig::new(Some("visitedPlaces"), Some("personsTrips"))
                .with_enable_conditional(unless_flag("tbDisabled"))
                .with_visibility(unless_flag("tbHidden")),
        )
        .section("end", SectionConfig::new(Some("personsTrips"), None))
}

pub fn complex_config() -> SurveySectionsConfig {
    complex_config_with(persons_trips_block())
}

pub fn complex_service() -> NavigationService {
    NavigationService::new(SectionGraph::new(complex_config()).unwrap())
}

pub fn complex_service_with(block: RepeatedBlock) -> NavigationService {
    NavigationService::new(SectionGraph::new(complex_config_with(block)).unwrap())
}

/// The simple graph in its YAML form
pub const SIMPLE_SECTIONS_YAML: &str = r#"
home:
  previousSection: null
  nextSection: householdMembers
householdMembers:
  previousSection: home
  nextSection: end
  isSectionVisible:
    op: not
    condition: { op: truthy, path: flags.hhHidden }
end:
  previousSection: householdMembers
  nextSection: null
"#;

/// Household with two interviewable persons and a 3 year old
pub fn household_persons() -> Value {
    json!({
        "personId1": { "_uuid": "personId1", "_sequence": 1, "age": 30 },
        "personId2": { "_uuid": "personId2", "_sequence": 2, "age": 35 },
        "personId3": { "_uuid": "personId3", "_sequence": 3, "age": 3 }
    })
}

/// Single-token context
pub fn ctx(id: &str) -> IterationContext {
    IterationContext::new([id])
}

pub fn section(name: &str) -> NavigationSection {
    NavigationSection::new(name)
}

pub fn section_in(name: &str, id: &str) -> NavigationSection {
    NavigationSection::with_context(name, ctx(id))
}

pub fn values(pairs: &[(&str, Value)]) -> ValuesByPath {
    pairs.iter().map(|(key, value)| ((*key).to_string(), value.clone())).collect()
}

/// Builds interview snapshots with navigation history
#[derive(Debug, Clone)]
pub struct InterviewBuilder {
    response: Value,
    ts: i64,
}

impl Default for InterviewBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InterviewBuilder {
    pub fn new() -> Self {
        Self {
            response: json!({}),
            ts: 0,
        }
    }

    /// Add the fixture household
    pub fn with_household(self) -> Self {
        self.set("household.persons", household_persons())
    }

    /// Add a household with only the given persons of the fixture
    pub fn with_persons(self, ids: &[&str]) -> Self {
        let mut persons = household_persons();
        if let Some(map) = persons.as_object_mut() {
            map.retain(|id, _| ids.contains(&id.as_str()));
        }
        self.set("household.persons", persons)
    }

    pub fn set(mut self, path: &str, value: Value) -> Self {
        path.parse::<ResponsePath>().unwrap().set_in(&mut self.response, value);
        self
    }

    pub fn flag(self, name: &str) -> Self {
        self.set(&format!("flags.{name}"), json!(true))
    }

    pub fn active_person(self, id: &str) -> Self {
        self.set("_activePersonId", json!(id))
    }

    /// Record a visit that was completed
    pub fn completed(self, name: &str, iteration: Option<&str>) -> Self {
        self.visit(name, iteration, true)
    }

    /// Record a visit that is still in progress
    pub fn started(self, name: &str, iteration: Option<&str>) -> Self {
        self.visit(name, iteration, false)
    }

    fn visit(mut self, name: &str, iteration: Option<&str>, completed: bool) -> Self {
        self.ts += 1;
        let ts = self.ts;
        let mut status = vec!["_sections".to_string(), name.to_string()];
        let mark = |segments: &[String], response: &mut Value| {
            let started = status_path(segments, "_startedAt");
            if started.get_in(response).is_none() {
                started.set_in(response, json!(ts));
            }
            if completed {
                status_path(segments, "_isCompleted").set_in(response, json!(true));
            }
        };
        mark(&status, &mut self.response);
        if let Some(id) = iteration {
            status.push(id.to_string());
            mark(&status, &mut self.response);
        }

        let actions: ResponsePath = "_sections._actions".parse().unwrap();
        let mut log = actions.get_in(&self.response).cloned().unwrap_or_else(|| json!([]));
        let mut action = json!({ "section": name, "action": "start", "ts": ts });
        if let Some(id) = iteration {
            action["iterationContext"] = json!([id]);
        }
        log.as_array_mut().unwrap().push(action);
        actions.set_in(&mut self.response, log);
        self
    }

    pub fn build(self) -> InterviewSnapshot {
        InterviewSnapshot::new(self.response)
    }
}

fn status_path(segments: &[String], key: &str) -> ResponsePath {
    ResponsePath::new(segments.to_vec()).child(key)
}

/// Shuffler returning a preset order and recording its inputs
#[derive(Debug, Default)]
pub struct FixedShuffler {
    order: Vec<String>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FixedShuffler {
    pub fn new(order: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            order: order.iter().map(ToString::to_string).collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }
}

impl Shuffler for FixedShuffler {
    fn shuffle(&self, ids: Vec<String>) -> Vec<String> {
        self.calls.lock().push(ids);
        self.order.clone()
    }
}

/// Shared counter for hook invocations
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Predicate counting its calls and answering `answer(context)`
    pub fn predicate<F>(&self, answer: F) -> Predicate
    where
        F: Fn(Option<&IterationContext>) -> bool + Send + Sync + 'static,
    {
        let counter = Arc::clone(&self.0);
        Predicate::function(move |_, context| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(answer(context))
        })
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Walks an interview the way a host application does
///
/// Every result is applied to the snapshot, followed by the `_sections`
/// bookkeeping of the section change.
#[derive(Debug)]
pub struct FlowSimulator {
    pub service: NavigationService,
    pub snapshot: InterviewSnapshot,
    pub current: Option<NavigationSection>,
    pub history: Vec<NavigationSection>,
    clock: i64,
}

impl FlowSimulator {
    pub fn new(service: NavigationService, snapshot: InterviewSnapshot) -> Self {
        Self {
            service,
            snapshot,
            current: None,
            history: Vec::new(),
            clock: 0,
        }
    }

    /// Open the questionnaire
    pub fn start(&mut self) -> NavigationSection {
        let result = self
            .service
            .init_navigation_state(&self.snapshot, None, self.current.as_ref())
            .unwrap();
        self.apply(result.values_by_path.as_ref(), result.target_section)
    }

    pub fn step(&mut self, direction: Direction) -> NavigationSection {
        let current = self.current.clone().expect("simulator not started");
        let result = self.service.navigate(&self.snapshot, &current, direction).unwrap();
        self.apply(result.values_by_path.as_ref(), result.target_section)
    }

    pub fn forward(&mut self) -> NavigationSection {
        self.step(Direction::Forward)
    }

    pub fn backward(&mut self) -> NavigationSection {
        self.step(Direction::Backward)
    }

    /// Go forward until the section stops changing, at most `limit` steps
    pub fn run_forward(&mut self, limit: usize) -> Vec<NavigationSection> {
        let mut visited = Vec::new();
        for _ in 0..limit {
            let before = self.current.clone();
            let after = self.forward();
            if before.as_ref() == Some(&after) {
                break;
            }
            visited.push(after);
        }
        visited
    }

    fn apply(&mut self, values: Option<&ValuesByPath>, target: NavigationSection) -> NavigationSection {
        if let Some(values) = values {
            self.snapshot.apply(values).unwrap();
        }
        if self.current.as_ref() != Some(&target) {
            self.clock += 1;
            let bookkeeping = section_change_updates(&self.snapshot, self.current.as_ref(), &target, self.clock);
            self.snapshot.apply(&bookkeeping).unwrap();
            self.history.push(target.clone());
        }
        self.current = Some(target.clone());
        target
    }
}
