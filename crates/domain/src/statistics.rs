//! Raw statistics as returned by an areal reduction.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque key/value result of a reduction.
///
/// Keys are band- or reducer-derived (`Npp`, `NDVI_mean`, `groups`, …) and
/// are interpreted only by the formatter of the service that asked for them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawStatistics(Map<String, Value>);

impl RawStatistics {
    #[must_use]
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    /// Read a numeric value. Absent keys, `null`s and non-numbers all yield `None`.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    /// Borrow a raw value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for RawStatistics {
    fn from(values: Map<String, Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<(String, Value)> for RawStatistics {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_return_none_for_null_and_missing_keys() {
        let stats: RawStatistics = serde_json::from_value(json!({"Npp": null})).unwrap();
        assert_eq!(stats.number("Npp"), None);
        assert_eq!(stats.number("other"), None);
    }

    #[test]
    fn should_read_integer_values_as_numbers() {
        let stats: RawStatistics = serde_json::from_value(json!({"Npp": 20})).unwrap();
        assert_eq!(stats.number("Npp"), Some(20.0));
    }
}
