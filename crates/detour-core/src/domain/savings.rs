use super::{Metrics, Settings};

/// Fixed productivity estimate for one avoided visit.
pub const MINUTES_SAVED_PER_REDIRECT: f64 = 17.5;

const MINUTES_PER_HOUR: f64 = 60.0;
const MINUTES_PER_DAY: f64 = 1440.0;

/// Time and money estimates derived from raw redirect counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Savings {
    pub redirects: u64,
    pub minutes: f64,
    pub money: f64,
}

impl Savings {
    pub fn from_redirects(redirects: u64, settings: &Settings) -> Self {
        let minutes = minutes_saved(redirects);

        Self {
            redirects,
            minutes,
            money: money_saved(minutes, settings.hourly_rate),
        }
    }

    pub fn total(metrics: &Metrics, settings: &Settings) -> Self {
        Self::from_redirects(metrics.total_redirects, settings)
    }

    pub fn for_rule(metrics: &Metrics, settings: &Settings, rule_id: &str) -> Self {
        Self::from_redirects(metrics.count_for(rule_id), settings)
    }

    pub fn duration_label(&self) -> String {
        format_duration(self.minutes)
    }

    pub fn money_label(&self) -> String {
        format_money(self.money)
    }
}

pub fn minutes_saved(redirects: u64) -> f64 {
    redirects as f64 * MINUTES_SAVED_PER_REDIRECT
}

/// An unset rate is worth nothing.
pub fn money_saved(minutes: f64, hourly_rate: Option<f64>) -> f64 {
    hourly_rate
        .map(|rate| minutes * (rate / MINUTES_PER_HOUR))
        .unwrap_or(0.0)
}

pub fn format_duration(minutes: f64) -> String {
    if minutes < MINUTES_PER_HOUR {
        return format!("{:.1}m", minutes);
    }

    if minutes < MINUTES_PER_DAY {
        let hours = (minutes / MINUTES_PER_HOUR).floor();
        let remaining_minutes = (minutes % MINUTES_PER_HOUR).floor();
        return if remaining_minutes == 0.0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, remaining_minutes)
        };
    }

    let days = (minutes / MINUTES_PER_DAY).floor();
    let hours = ((minutes % MINUTES_PER_DAY) / MINUTES_PER_HOUR).floor();
    if hours == 0.0 {
        format!("{}d", days)
    } else {
        format!("{}d {}h", days, hours)
    }
}

/// The compact form applies once the amount rounds to at least $1000.00.
pub fn format_money(amount: f64) -> String {
    let cents = (amount * 100.0).round() / 100.0;
    if cents >= 1000.0 {
        format!("${:.1}k", amount / 1000.0)
    } else {
        format!("${:.2}", amount)
    }
}
