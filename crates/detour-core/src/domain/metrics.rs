use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::RuleId;

/// Redirect counters written by the redirect engine.
///
/// Keys of `per_rule` reference rule ids by convention only: counts of
/// deleted rules stay in the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_redirects: u64,
    pub per_rule: BTreeMap<RuleId, u64>,
}

impl Metrics {
    /// Coerces any stored payload into a well-formed `Metrics`. Never fails.
    pub fn normalize(raw: &Value) -> Self {
        let Some(object) = raw.as_object() else {
            return Self::default();
        };

        let total_redirects = object.get("total_redirects").map(coerce_count).unwrap_or(0);

        let per_rule = object
            .get("per_rule")
            .and_then(Value::as_object)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(rule_id, count)| (rule_id.clone(), coerce_count(count)))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            total_redirects,
            per_rule,
        }
    }

    pub fn count_for(&self, rule_id: &str) -> u64 {
        self.per_rule.get(rule_id).copied().unwrap_or(0)
    }
}

// Negative counts clamp to zero, fractional counts truncate.
fn coerce_count(value: &Value) -> u64 {
    let Value::Number(number) = value else {
        return 0;
    };

    number.as_u64().unwrap_or_else(|| {
        number
            .as_f64()
            .filter(|count| count.is_finite() && *count > 0.0)
            .map(|count| count.trunc() as u64)
            .unwrap_or(0)
    })
}
