//! Configuration store.
//!
//! [`ConfigStore`] owns the in-process copies of rules, metrics and settings
//! and is the only component talking to the storage areas.
//!
//! Rules are persisted as a whole list on every mutation, so two instances
//! editing at the same time resolve to whichever write lands last. External
//! changes are applied through [`ConfigStore::handle_change`] for metrics and
//! settings only; rule changes from other instances are picked up on the next
//! [`ConfigStore::load_rules`].

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{Metrics, Rule, RuleDraft, RuleEdit, RuleId, Savings, Settings};
use crate::ports::{AreaId, StorageArea, StorageChange, StorageError};
use crate::validation::{validate_hourly_rate, validate_rule, RuleError, ValidationError};

pub const RULES_KEY: &str = "redirect_rules";
pub const METRICS_KEY: &str = "redirect_metrics";
pub const SETTINGS_KEY: &str = "redirect_settings";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    InvalidRule(#[from] RuleError),

    #[error("{0}")]
    InvalidRate(ValidationError),

    #[error("rule not found: {id}")]
    RuleNotFound { id: RuleId },

    #[error("change kept but not saved: {0}")]
    Persist(#[from] StorageError),
}

/// The areas a store reads and writes.
#[derive(Clone)]
pub struct StorageAreas {
    /// Holds rules and settings.
    pub config: Arc<dyn StorageArea>,
    /// Holds metrics.
    pub metrics: Arc<dyn StorageArea>,
}

impl StorageAreas {
    /// Uses the synchronized area for rules and settings when available,
    /// falling back to the local one.
    pub fn resolve(sync: Option<Arc<dyn StorageArea>>, local: Arc<dyn StorageArea>) -> Self {
        Self {
            config: sync.unwrap_or_else(|| Arc::clone(&local)),
            metrics: local,
        }
    }

    pub fn config_area(&self) -> AreaId {
        self.config.area_id()
    }

    pub fn metrics_area(&self) -> AreaId {
        self.metrics.area_id()
    }
}

/// What a change notification updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    Metrics,
    Settings,
}

pub struct ConfigStore {
    areas: StorageAreas,
    rules: Vec<Rule>,
    metrics: Metrics,
    settings: Settings,
}

impl ConfigStore {
    pub fn new(areas: StorageAreas) -> Self {
        Self {
            areas,
            rules: Vec::new(),
            metrics: Metrics::default(),
            settings: Settings::default(),
        }
    }

    /// Creates a store and loads rules, metrics and settings.
    pub async fn open(areas: StorageAreas) -> Self {
        let mut store = Self::new(areas);
        store.load_rules().await;
        store.load_metrics().await;
        store.load_settings().await;
        store
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn savings(&self) -> Savings {
        Savings::total(&self.metrics, &self.settings)
    }

    pub fn rule_savings(&self, id: &str) -> Savings {
        Savings::for_rule(&self.metrics, &self.settings, id)
    }

    /// Rules that no longer validate, with the error to show on their row.
    pub fn rule_issues(&self) -> Vec<(RuleId, RuleError)> {
        self.rules
            .iter()
            .filter_map(|rule| {
                validate_rule(&rule.to_draft())
                    .err()
                    .map(|error| (rule.id.clone(), error))
            })
            .collect()
    }

    pub async fn load_rules(&mut self) -> &[Rule] {
        let stored = read_or_null(self.areas.config.as_ref(), RULES_KEY).await;
        self.rules = Rule::list_from_stored(&stored);

        let minted_ids = stored
            .as_array()
            .is_some_and(|items| !items.iter().all(Rule::has_stored_id));
        if minted_ids {
            if let Err(error) = self.persist_rules().await {
                warn!(%error, "failed to save minted rule ids");
            }
        }

        &self.rules
    }

    pub async fn load_metrics(&mut self) -> &Metrics {
        let stored = read_or_null(self.areas.metrics.as_ref(), METRICS_KEY).await;
        self.metrics = Metrics::normalize(&stored);
        &self.metrics
    }

    pub async fn load_settings(&mut self) -> &Settings {
        let stored = read_or_null(self.areas.config.as_ref(), SETTINGS_KEY).await;
        self.settings = Settings::normalize(&stored);
        &self.settings
    }

    /// Overwrites the stored rule list with the in-process one.
    pub async fn persist_rules(&self) -> Result<(), StoreError> {
        let payload = encode(&self.rules)?;
        self.areas.config.set(RULES_KEY, payload).await?;
        Ok(())
    }

    pub async fn persist_settings(&self) -> Result<(), StoreError> {
        let payload = encode(&self.settings)?;
        self.areas.config.set(SETTINGS_KEY, payload).await?;
        Ok(())
    }

    /// Validates and appends a new enabled rule.
    ///
    /// On a write failure the rule stays in memory and the error is returned.
    pub async fn add_rule(
        &mut self,
        source_hostname: &str,
        target_url: &str,
    ) -> Result<Rule, StoreError> {
        let rule = validate_rule(&RuleDraft::new(source_hostname, target_url))?;
        self.rules.push(rule.clone());
        self.persist_rules().await?;
        Ok(rule)
    }

    /// Replaces the rule's fields if the edited rule validates. An invalid edit
    /// leaves the stored rule untouched.
    pub async fn update_rule(&mut self, id: &str, edit: RuleEdit) -> Result<Rule, StoreError> {
        let index = self.position(id)?;
        let updated = validate_rule(&self.rules[index].apply(edit))?;
        self.rules[index] = updated.clone();
        self.persist_rules().await?;
        Ok(updated)
    }

    /// Toggles a rule without re-validating it.
    pub async fn set_rule_enabled(&mut self, id: &str, enabled: bool) -> Result<Rule, StoreError> {
        let index = self.position(id)?;
        self.rules[index].enabled = enabled;
        let rule = self.rules[index].clone();
        self.persist_rules().await?;
        Ok(rule)
    }

    /// Removes a rule. Its metrics entry is left in place.
    pub async fn delete_rule(&mut self, id: &str) -> Result<Rule, StoreError> {
        let index = self.position(id)?;
        let removed = self.rules.remove(index);
        self.persist_rules().await?;
        Ok(removed)
    }

    /// Applies hourly-rate input. Blank input clears the rate.
    pub async fn set_hourly_rate(&mut self, raw: &str) -> Result<Option<f64>, StoreError> {
        let hourly_rate = validate_hourly_rate(raw).map_err(StoreError::InvalidRate)?;
        self.settings.hourly_rate = hourly_rate;
        self.persist_settings().await?;
        Ok(hourly_rate)
    }

    /// Applies a change notification from the storage substrate.
    ///
    /// This is the only path through which externally written values enter
    /// the store. Returns what was updated, if anything.
    pub fn handle_change(&mut self, change: &StorageChange) -> Option<Reconciled> {
        let removed = Value::Null;
        let new_value = change.new_value.as_ref().unwrap_or(&removed);

        match change.key.as_str() {
            METRICS_KEY if change.area == self.areas.metrics_area() => {
                self.metrics = Metrics::normalize(new_value);
                debug!(
                    total_redirects = self.metrics.total_redirects,
                    "metrics reconciled"
                );
                Some(Reconciled::Metrics)
            }
            SETTINGS_KEY if change.area == self.areas.config_area() => {
                self.settings = Settings::normalize(new_value);
                debug!(hourly_rate = ?self.settings.hourly_rate, "settings reconciled");
                Some(Reconciled::Settings)
            }
            RULES_KEY => {
                debug!(area = %change.area, "ignoring rules change notification");
                None
            }
            _ => None,
        }
    }

    fn position(&self, id: &str) -> Result<usize, StoreError> {
        self.rules
            .iter()
            .position(|rule| rule.id == id)
            .ok_or_else(|| StoreError::RuleNotFound { id: id.to_string() })
    }
}

async fn read_or_null(area: &dyn StorageArea, key: &str) -> Value {
    match area.get(key).await {
        Ok(value) => value.unwrap_or(Value::Null),
        Err(error) => {
            warn!(%error, key, area = %area.area_id(), "storage read failed, using defaults");
            Value::Null
        }
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value, StorageError> {
    serde_json::to_value(value).map_err(|error| StorageError::Write {
        message: error.to_string(),
    })
}
