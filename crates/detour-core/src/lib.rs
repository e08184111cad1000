//! Detour core library
//!
//! Contains the redirect rule domain, the validator, the storage ports (traits)
//! and the configuration store that keeps rules, metrics and settings in sync
//! with an externally mutable storage substrate.
//! This crate has no knowledge of infrastructure concerns.

pub mod config;
pub mod domain;
pub mod ports;
pub mod store;
pub mod validation;

pub use config::{Config, ConfigError, StorageConfig, WatchConfig};
pub use domain::{
    format_duration, format_money, mint_rule_id, minutes_saved, money_saved, Metrics, Rule,
    RuleDraft, RuleEdit, RuleId, Savings, Settings, MINUTES_SAVED_PER_REDIRECT,
};
pub use ports::{AreaId, ChangeFeed, StorageArea, StorageChange, StorageError};
pub use store::{
    ConfigStore, Reconciled, StorageAreas, StoreError, METRICS_KEY, RULES_KEY, SETTINGS_KEY,
};
pub use validation::{
    validate_hostname, validate_hourly_rate, validate_rule, validate_target_url, RuleError,
    TargetUrl, ValidationError,
};
