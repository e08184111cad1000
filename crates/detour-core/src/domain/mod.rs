mod metrics;
mod rule;
mod savings;
mod settings;

pub use metrics::Metrics;
pub use rule::{mint_rule_id, Rule, RuleDraft, RuleEdit, RuleId};
pub use savings::{
    format_duration, format_money, minutes_saved, money_saved, Savings,
    MINUTES_SAVED_PER_REDIRECT,
};
pub use settings::Settings;
