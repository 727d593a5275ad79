//! Read-only view of the interview answers

use crate::path::{PathError, ResponsePath};
use crate::section::ValuesByPath;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Snapshot of the interview answers at one point in time
///
/// Navigation never mutates a snapshot: it returns [`ValuesByPath`] updates
/// that the host merges with [`InterviewSnapshot::apply`] before the next
/// call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSnapshot {
    /// Response tree
    #[serde(default = "empty_object")]
    pub response: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl Default for InterviewSnapshot {
    fn default() -> Self {
        Self {
            response: empty_object(),
        }
    }
}

impl InterviewSnapshot {
    /// Snapshot over the given response tree
    #[inline]
    #[must_use]
    pub fn new(response: Value) -> Self {
        Self { response }
    }

    /// Value at `path`; `null` reads as absent
    #[must_use]
    pub fn get(&self, path: &ResponsePath) -> Option<&Value> {
        path.get_in(&self.response).filter(|value| !value.is_null())
    }

    /// Value at a dotted path; `null`, missing and malformed paths read as absent
    #[must_use]
    pub fn get_response(&self, path: &str) -> Option<&Value> {
        path.parse::<ResponsePath>()
            .ok()
            .and_then(|path| self.get(&path))
    }

    /// String value at a dotted path
    #[must_use]
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get_response(path).and_then(Value::as_str)
    }

    /// Merge value updates; `null` removes the addressed value
    ///
    /// # Errors
    /// Returns error if a key is not a `response.<path>` update key
    pub fn apply(&mut self, values: &ValuesByPath) -> Result<(), PathError> {
        for (key, value) in values {
            let path = ResponsePath::from_update_key(key)?;
            if value.is_null() {
                path.remove_in(&mut self.response);
            } else {
                path.set_in(&mut self.response, value.clone());
            }
        }
        Ok(())
    }

    /// Copy of this snapshot with `values` merged
    ///
    /// # Errors
    /// Returns error if a key is not a `response.<path>` update key
    pub fn with_applied(&self, values: &ValuesByPath) -> Result<Self, PathError> {
        let mut next = self.clone();
        next.apply(values)?;
        Ok(next)
    }
}

impl From<Value> for InterviewSnapshot {
    fn from(response: Value) -> Self {
        Self::new(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn null_and_missing_read_as_absent() {
        let snapshot = InterviewSnapshot::new(json!({ "a": null, "b": 0 }));
        assert_eq!(snapshot.get_response("a"), None);
        assert_eq!(snapshot.get_response("missing.deep"), None);
        assert_eq!(snapshot.get_response("b"), Some(&json!(0)));
    }

    #[test]
    fn malformed_path_reads_as_absent() {
        let snapshot = InterviewSnapshot::new(json!({ "a": 1 }));
        assert_eq!(snapshot.get_response("a..b"), None);
    }

    #[test]
    fn apply_sets_and_unsets() {
        let mut snapshot = InterviewSnapshot::new(json!({ "_activePersonId": "p1" }));
        let mut values = ValuesByPath::new();
        values.insert("response._activePersonId".into(), Value::Null);
        values.insert("response._sections.home._isCompleted".into(), json!(true));
        snapshot.apply(&values).unwrap();

        assert_eq!(
            snapshot.response,
            json!({ "_sections": { "home": { "_isCompleted": true } } })
        );
    }

    #[test]
    fn apply_rejects_unrooted_keys() {
        let mut snapshot = InterviewSnapshot::default();
        let mut values = ValuesByPath::new();
        values.insert("validations.a".into(), json!(1));
        assert!(snapshot.apply(&values).is_err());
    }

    #[test]
    fn deserializes_without_response() {
        let snapshot: InterviewSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot, InterviewSnapshot::default());
    }

    proptest! {
        #[test]
        fn applied_value_reads_back(key in "[a-z]{1,8}", nested in "[a-z]{1,8}", n in any::<i64>()) {
            let mut values = ValuesByPath::new();
            values.insert(format!("response.{key}.{nested}"), json!(n));
            let snapshot = InterviewSnapshot::default().with_applied(&values).unwrap();
            prop_assert_eq!(snapshot.get_response(&format!("{key}.{nested}")), Some(&json!(n)));
        }
    }
}
