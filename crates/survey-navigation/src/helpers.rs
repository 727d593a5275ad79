//! Navigation bookkeeping stored in the response
//!
//! The host application records section changes under `_sections`:
//!
//! ```text
//! _sections:
//!   <section>:
//!     _startedAt: <ts>
//!     _isCompleted: true
//!     <iteration joined with '/'>:
//!       _startedAt: <ts>
//!       _isCompleted: true
//!   _actions:
//!     - { section, action: start, ts, iterationContext? }
//! ```
//!
//! These helpers read that bookkeeping, and [`section_change_updates`]
//! produces it.

use serde_json::{json, Value};
use survey_model::{InterviewSnapshot, IterationContext, NavigationSection, ResponsePath, ValuesByPath};

/// Root of the navigation bookkeeping in the response
pub const SECTIONS_ROOT: &str = "_sections";

/// Key of the section action log
pub const ACTIONS_KEY: &str = "_actions";

const STARTED_AT: &str = "_startedAt";
const IS_COMPLETED: &str = "_isCompleted";

fn sections_root() -> ResponsePath {
    ResponsePath::single(SECTIONS_ROOT)
}

fn section_status_path(section: &str, context: Option<&IterationContext>, key: &str) -> ResponsePath {
    let mut path = sections_root().child(section);
    if let Some(ctx) = context.filter(|ctx| !ctx.is_empty()) {
        path = path.child(ctx.joined());
    }
    path.child(key)
}

/// Last section recorded in the action log
#[must_use]
pub fn last_visited_section(snapshot: &InterviewSnapshot) -> Option<NavigationSection> {
    let actions = snapshot.get(&sections_root().child(ACTIONS_KEY))?.as_array()?;
    let last = actions.last()?;
    let section = last.get("section")?.as_str()?;
    let context = last
        .get("iterationContext")
        .and_then(|value| serde_json::from_value::<IterationContext>(value.clone()).ok())
        .filter(|ctx| !ctx.is_empty());
    Some(NavigationSection {
        section_shortname: section.to_string(),
        iteration_context: context,
    })
}

/// Whether any section was started for this iteration
///
/// An empty context is always considered started.
#[must_use]
pub fn is_iteration_context_started(snapshot: &InterviewSnapshot, context: &IterationContext) -> bool {
    if context.is_empty() {
        return true;
    }
    let Some(sections) = snapshot.get(&sections_root()).and_then(Value::as_object) else {
        return false;
    };
    let key = context.joined();
    sections
        .iter()
        .filter(|(name, _)| name.as_str() != ACTIONS_KEY)
        .filter_map(|(_, status)| status.get(&key))
        .any(|status| status.get(STARTED_AT).is_some_and(|ts| !ts.is_null()))
}

/// Whether the section (or one of its iterations) was marked completed
#[must_use]
pub fn is_section_completed(
    snapshot: &InterviewSnapshot,
    section: &str,
    context: Option<&IterationContext>,
) -> bool {
    snapshot
        .get(&section_status_path(section, context, IS_COMPLETED))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Bookkeeping updates for a change from `previous` to `target`
///
/// Marks the target (and its iteration) started when not already, marks the
/// previous section (and its iteration) completed, and appends a `start`
/// entry to the action log.
#[must_use]
pub fn section_change_updates(
    snapshot: &InterviewSnapshot,
    previous: Option<&NavigationSection>,
    target: &NavigationSection,
    timestamp: i64,
) -> ValuesByPath {
    let mut updates = ValuesByPath::new();
    let target_ctx = target.iteration_context.as_ref();

    let mut mark_started = |path: ResponsePath| {
        if snapshot.get(&path).is_none() {
            updates.insert(path.update_key(), json!(timestamp));
        }
    };
    mark_started(section_status_path(&target.section_shortname, None, STARTED_AT));
    if target_ctx.is_some_and(|ctx| !ctx.is_empty()) {
        mark_started(section_status_path(&target.section_shortname, target_ctx, STARTED_AT));
    }

    if let Some(previous) = previous {
        let prev_ctx = previous.iteration_context.as_ref();
        updates.insert(
            section_status_path(&previous.section_shortname, None, IS_COMPLETED).update_key(),
            Value::Bool(true),
        );
        if prev_ctx.is_some_and(|ctx| !ctx.is_empty()) {
            updates.insert(
                section_status_path(&previous.section_shortname, prev_ctx, IS_COMPLETED).update_key(),
                Value::Bool(true),
            );
        }
    }

    let actions_path = sections_root().child(ACTIONS_KEY);
    let mut actions = snapshot
        .get(&actions_path)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let mut action = json!({
        "section": target.section_shortname,
        "action": "start",
        "ts": timestamp,
    });
    if let (Some(ctx), Some(entry)) = (target_ctx, action.as_object_mut()) {
        entry.insert("iterationContext".to_string(), json!(ctx.tokens()));
    }
    actions.push(action);
    updates.insert(actions_path.update_key(), Value::Array(actions));
    updates
}
