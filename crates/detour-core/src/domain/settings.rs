use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// `None` means the rate is unset.
    pub hourly_rate: Option<f64>,
}

impl Settings {
    /// Stored rates pass through unrounded; rounding only happens on user input.
    pub fn normalize(raw: &Value) -> Self {
        let hourly_rate = raw
            .as_object()
            .and_then(|object| object.get("hourly_rate"))
            .and_then(Value::as_f64)
            .filter(|rate| rate.is_finite() && *rate >= 0.0);

        Self { hourly_rate }
    }
}
