//! Builtin collection queries for repeated blocks

use serde_json::Value;
use std::cmp::Ordering;
use survey_model::InterviewSnapshot;
use survey_sections::INTERVIEWABLE_PERSONS;

/// Default minimum age to be interviewed
pub const DEFAULT_INTERVIEWABLE_AGE: u64 = 5;

/// Response path of the household persons mapping
pub const PERSONS_PATH: &str = "household.persons";

/// Resolves a builtin iteration rule to object IDs
pub trait SurveyObjectQuery: Send + Sync {
    /// Ordered object IDs for the builtin `name`, `None` if unsupported
    fn object_ids(&self, name: &str, snapshot: &InterviewSnapshot) -> Option<Vec<String>>;
}

/// Household survey queries
///
/// Supports [`INTERVIEWABLE_PERSONS`]: the persons under `household.persons`,
/// ordered by `_sequence`, whose `age` is unknown or at least the
/// interviewable age.
#[derive(Debug, Clone, Copy)]
pub struct HouseholdObjectQuery {
    interviewable_age: u64,
}

impl Default for HouseholdObjectQuery {
    fn default() -> Self {
        Self {
            interviewable_age: DEFAULT_INTERVIEWABLE_AGE,
        }
    }
}

impl HouseholdObjectQuery {
    /// Query with the default interviewable age
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum age to be interviewed
    #[inline]
    #[must_use]
    pub fn with_interviewable_age(mut self, age: u64) -> Self {
        self.interviewable_age = age;
        self
    }

    /// IDs of the interviewable persons, in sequence order
    #[must_use]
    pub fn interviewable_persons(&self, snapshot: &InterviewSnapshot) -> Vec<String> {
        let Some(persons) = snapshot.get_response(PERSONS_PATH).and_then(Value::as_object) else {
            return Vec::new();
        };
        let mut persons: Vec<(&String, &Value)> = persons.iter().collect();
        persons.sort_by(|(_, a), (_, b)| compare_sequence(a, b));
        persons
            .into_iter()
            .filter(|(_, person)| self.is_interviewable(person))
            .map(|(key, person)| {
                person
                    .get("_uuid")
                    .and_then(Value::as_str)
                    .unwrap_or(key)
                    .to_string()
            })
            .collect()
    }

    #[allow(clippy::cast_precision_loss)]
    fn is_interviewable(&self, person: &Value) -> bool {
        match person.get("age").and_then(Value::as_f64) {
            Some(age) => age >= self.interviewable_age as f64,
            None => true,
        }
    }
}

impl SurveyObjectQuery for HouseholdObjectQuery {
    fn object_ids(&self, name: &str, snapshot: &InterviewSnapshot) -> Option<Vec<String>> {
        (name == INTERVIEWABLE_PERSONS).then(|| self.interviewable_persons(snapshot))
    }
}

// Persons without a sequence keep their relative order, after sequenced ones
fn compare_sequence(a: &Value, b: &Value) -> Ordering {
    let seq = |person: &Value| person.get("_sequence").and_then(Value::as_f64);
    match (seq(a), seq(b)) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
