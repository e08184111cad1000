use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub type RuleId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub enabled: bool,
    pub source_hostname: String,
    pub target_url: String,
}

/// Raw, unvalidated rule fields as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDraft {
    pub id: Option<RuleId>,
    pub enabled: bool,
    pub source_hostname: String,
    pub target_url: String,
}

/// Field edits for an existing rule. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleEdit {
    pub source_hostname: Option<String>,
    pub target_url: Option<String>,
}

pub fn mint_rule_id() -> RuleId {
    Uuid::new_v4().to_string()
}

impl RuleDraft {
    pub fn new(source_hostname: &str, target_url: &str) -> Self {
        Self {
            id: None,
            enabled: true,
            source_hostname: source_hostname.to_string(),
            target_url: target_url.to_string(),
        }
    }
}

impl Rule {
    /// Maps a stored item without validating it.
    ///
    /// Missing ids are minted, a missing or non-boolean `enabled` becomes
    /// `false`, and missing hostname/url fields become empty strings. Rules
    /// that no longer validate are kept as they are.
    pub fn from_stored(value: &Value) -> Self {
        Self {
            id: stored_id(value).unwrap_or_else(mint_rule_id),
            enabled: value.get("enabled").and_then(Value::as_bool).unwrap_or(false),
            source_hostname: string_field(value, "source_hostname"),
            target_url: string_field(value, "target_url"),
        }
    }

    /// Whether `from_stored` would keep the item's id rather than mint one.
    pub fn has_stored_id(value: &Value) -> bool {
        stored_id(value).is_some()
    }

    pub fn list_from_stored(value: &Value) -> Vec<Self> {
        value
            .as_array()
            .map(|items| items.iter().map(Self::from_stored).collect())
            .unwrap_or_default()
    }

    pub fn to_draft(&self) -> RuleDraft {
        RuleDraft {
            id: Some(self.id.clone()),
            enabled: self.enabled,
            source_hostname: self.source_hostname.clone(),
            target_url: self.target_url.clone(),
        }
    }

    pub fn apply(&self, edit: RuleEdit) -> RuleDraft {
        RuleDraft {
            id: Some(self.id.clone()),
            enabled: self.enabled,
            source_hostname: edit
                .source_hostname
                .unwrap_or_else(|| self.source_hostname.clone()),
            target_url: edit.target_url.unwrap_or_else(|| self.target_url.clone()),
        }
    }
}

fn stored_id(value: &Value) -> Option<RuleId> {
    match value.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    }
}

fn string_field(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
