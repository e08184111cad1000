//! Pure normalization and validation of user input.
//!
//! Every function here is total: malformed input produces an error value,
//! never a panic, and nothing touches storage.

use thiserror::Error;
use url::Url;

use crate::domain::{mint_rule_id, Rule, RuleDraft};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("enter a hostname such as example.com, without scheme, path or port")]
    InvalidHostname,

    #[error("enter a full URL such as https://example.com/page")]
    InvalidUrl,

    #[error("only http and https targets are supported")]
    UnsupportedScheme,

    #[error("target must not point back to the source hostname")]
    SelfLoop,

    #[error("hourly rate must be a number")]
    NotANumber,

    #[error("hourly rate cannot be negative")]
    Negative,
}

/// A rule validation failure, attached to the field it should be shown next to.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleError {
    #[error("source: {0}")]
    Source(ValidationError),

    #[error("target: {0}")]
    Target(ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUrl {
    pub url: String,
    pub hostname: String,
}

pub fn validate_hostname(raw: &str) -> Result<String, ValidationError> {
    let hostname = raw.trim().to_lowercase();

    if hostname.is_empty() || hostname.contains(['/', ' ', ':', '?']) {
        return Err(ValidationError::InvalidHostname);
    }

    let labels: Vec<&str> = hostname.split('.').collect();
    if labels.len() < 2 || !labels.iter().all(|label| is_valid_label(label)) {
        return Err(ValidationError::InvalidHostname);
    }

    Ok(hostname)
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .bytes()
            .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'-')
}

pub fn validate_target_url(raw: &str) -> Result<TargetUrl, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidUrl);
    }

    let url = Url::parse(trimmed).map_err(|_| ValidationError::InvalidUrl)?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::UnsupportedScheme);
    }

    let hostname = url
        .host_str()
        .map(str::to_ascii_lowercase)
        .ok_or(ValidationError::InvalidUrl)?;

    Ok(TargetUrl {
        url: url.to_string(),
        hostname,
    })
}

/// Validates and normalizes a complete rule.
///
/// Source errors win over target errors, and the self-loop check only runs
/// once both fields are individually valid. The returned rule always has an id.
pub fn validate_rule(draft: &RuleDraft) -> Result<Rule, RuleError> {
    let source_hostname = validate_hostname(&draft.source_hostname).map_err(RuleError::Source)?;
    let target = validate_target_url(&draft.target_url).map_err(RuleError::Target)?;

    if target.hostname == source_hostname {
        return Err(RuleError::Target(ValidationError::SelfLoop));
    }

    let id = draft
        .id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(mint_rule_id);

    Ok(Rule {
        id,
        enabled: draft.enabled,
        source_hostname,
        target_url: target.url,
    })
}

/// Blank input clears the rate. Accepted values are rounded to cents.
pub fn validate_hourly_rate(raw: &str) -> Result<Option<f64>, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let rate = trimmed
        .parse::<f64>()
        .ok()
        .filter(|rate| rate.is_finite())
        .ok_or(ValidationError::NotANumber)?;

    if rate < 0.0 {
        return Err(ValidationError::Negative);
    }

    // `-0` parses to negative zero.
    if rate == 0.0 {
        return Ok(Some(0.0));
    }

    Ok(Some(round_to_cents(rate)))
}

// Rounds half-up on the shortest decimal spelling of `value`, so 12.345
// becomes 12.35 even though its binary value sits just below the midpoint.
fn round_to_cents(value: f64) -> f64 {
    let spelled = value.to_string();
    let Some((whole, fraction)) = spelled.split_once('.') else {
        return value;
    };
    if fraction.len() <= 2 {
        return value;
    }

    let Ok(cents) = format!("{}{}", whole, &fraction[..2]).parse::<f64>() else {
        return value;
    };
    let round_up = fraction.as_bytes()[2] >= b'5';
    let cents = if round_up { cents + 1.0 } else { cents };

    cents / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_is_trimmed_and_lowercased() {
        assert_eq!(
            validate_hostname("  Old.Example.COM "),
            Ok("old.example.com".to_string())
        );
    }

    #[test]
    fn hostname_rejects_scheme_path_port_and_query() {
        for raw in [
            "https://example.com",
            "example.com/path",
            "example.com:8080",
            "example.com?q=1",
            "exa mple.com",
        ] {
            assert_eq!(
                validate_hostname(raw),
                Err(ValidationError::InvalidHostname),
                "{raw}"
            );
        }
    }

    #[test]
    fn hostname_requires_two_labels() {
        assert_eq!(validate_hostname(""), Err(ValidationError::InvalidHostname));
        assert_eq!(validate_hostname("   "), Err(ValidationError::InvalidHostname));
        assert_eq!(
            validate_hostname("localhost"),
            Err(ValidationError::InvalidHostname)
        );
    }

    #[test]
    fn hostname_rejects_malformed_labels() {
        for raw in [
            "example..com",
            ".example.com",
            "example.com.",
            "-example.com",
            "example-.com",
            "exa_mple.com",
            "exämple.com",
        ] {
            assert_eq!(
                validate_hostname(raw),
                Err(ValidationError::InvalidHostname),
                "{raw}"
            );
        }
    }

    #[test]
    fn accepted_hostnames_are_well_formed() {
        for raw in ["a.b", "news.ycombinator.com", "x-1.co.uk", "123.example.org"] {
            let hostname = validate_hostname(raw).unwrap();
            assert_eq!(hostname, hostname.to_lowercase());
            assert!(hostname.contains('.'));
            for label in hostname.split('.') {
                assert!(is_valid_label(label));
            }
        }
    }

    #[test]
    fn target_url_is_canonicalized() {
        let target = validate_target_url("  HTTPS://New.Example.com/Path ").unwrap();

        assert_eq!(target.url, "https://new.example.com/Path");
        assert_eq!(target.hostname, "new.example.com");
    }

    #[test]
    fn target_url_rejects_empty_and_relative() {
        assert_eq!(validate_target_url(""), Err(ValidationError::InvalidUrl));
        assert_eq!(
            validate_target_url("new.example.com/path"),
            Err(ValidationError::InvalidUrl)
        );
        assert_eq!(validate_target_url("/path"), Err(ValidationError::InvalidUrl));
    }

    #[test]
    fn target_url_rejects_other_schemes() {
        for raw in [
            "ftp://files.example.com",
            "javascript:alert(1)",
            "mailto:someone@example.com",
            "file:///etc/hosts",
        ] {
            assert_eq!(
                validate_target_url(raw),
                Err(ValidationError::UnsupportedScheme),
                "{raw}"
            );
        }
    }

    #[test]
    fn rule_is_normalized_with_minted_id() {
        let draft = RuleDraft::new("Old.Example.com", "https://new.example.com/path");

        let rule = validate_rule(&draft).unwrap();

        assert!(!rule.id.is_empty());
        assert!(rule.enabled);
        assert_eq!(rule.source_hostname, "old.example.com");
        assert_eq!(rule.target_url, "https://new.example.com/path");
    }

    #[test]
    fn rule_keeps_existing_id() {
        let mut draft = RuleDraft::new("a.example.com", "https://b.example.com");
        draft.id = Some("kept".to_string());

        assert_eq!(validate_rule(&draft).unwrap().id, "kept");
    }

    #[test]
    fn rule_rejects_self_loop() {
        let draft = RuleDraft::new("example.com", "http://example.com");

        assert_eq!(
            validate_rule(&draft),
            Err(RuleError::Target(ValidationError::SelfLoop))
        );
    }

    #[test]
    fn self_loop_ignores_case() {
        let draft = RuleDraft::new("EXAMPLE.com", "https://Example.COM/somewhere");

        let error = validate_rule(&draft).unwrap_err();

        assert_eq!(error, RuleError::Target(ValidationError::SelfLoop));
    }

    #[test]
    fn source_error_takes_priority() {
        let draft = RuleDraft::new("not a host", "not a url");

        assert_eq!(
            validate_rule(&draft),
            Err(RuleError::Source(ValidationError::InvalidHostname))
        );
    }

    #[test]
    fn target_error_reported_when_source_is_valid() {
        let draft = RuleDraft::new("example.com", "ftp://example.org");

        assert_eq!(
            validate_rule(&draft),
            Err(RuleError::Target(ValidationError::UnsupportedScheme))
        );
    }

    #[test]
    fn subdomain_target_is_not_a_self_loop() {
        let draft = RuleDraft::new("example.com", "https://www.example.com");
        assert!(validate_rule(&draft).is_ok());
    }

    #[test]
    fn blank_rate_is_unset() {
        assert_eq!(validate_hourly_rate(""), Ok(None));
        assert_eq!(validate_hourly_rate("   "), Ok(None));
    }

    #[test]
    fn negative_rate_is_rejected() {
        assert_eq!(validate_hourly_rate("-1"), Err(ValidationError::Negative));
    }

    #[test]
    fn non_numeric_rate_is_rejected() {
        for raw in ["abc", "12abc", "inf", "NaN", "$20"] {
            assert_eq!(
                validate_hourly_rate(raw),
                Err(ValidationError::NotANumber),
                "{raw}"
            );
        }
    }

    #[test]
    fn rate_is_rounded_to_cents() {
        assert_eq!(validate_hourly_rate("12.345"), Ok(Some(12.35)));
        assert_eq!(validate_hourly_rate("12.344"), Ok(Some(12.34)));
        assert_eq!(validate_hourly_rate("1.005"), Ok(Some(1.01)));
        assert_eq!(validate_hourly_rate(" 20 "), Ok(Some(20.0)));
        assert_eq!(validate_hourly_rate("0.1"), Ok(Some(0.1)));
    }

    #[test]
    fn negative_zero_rate_is_zero() {
        let rate = validate_hourly_rate("-0").unwrap().unwrap();
        assert_eq!(rate, 0.0);
        assert!(rate.is_sign_positive());
    }
}
