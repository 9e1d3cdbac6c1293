//! Configuration validation
//!
//! Validates config consistency:
//! - At least one host is configured
//! - Host names are unique (case-insensitive)
//! - Category patterns compile
//! - Poll and metrics intervals are non-zero

use crate::Config;
use crate::error::{ConfigError, Result};
use regex::Regex;
use std::collections::HashSet;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_hosts(config)?;
    validate_intervals(config)?;
    Ok(())
}

fn validate_hosts(config: &Config) -> Result<()> {
    if config.hosts.is_empty() {
        return Err(ConfigError::NoHosts);
    }

    let mut seen = HashSet::new();
    for host in &config.hosts {
        if host.name.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "hosts",
                &host.name,
                "name",
                "must not be empty",
            ));
        }
        if !seen.insert(host.name.to_ascii_lowercase()) {
            return Err(ConfigError::duplicate_host(&host.name));
        }
        if let Err(e) = Regex::new(&host.categories) {
            return Err(ConfigError::invalid_value(
                "hosts",
                &host.name,
                "categories",
                e.to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_intervals(config: &Config) -> Result<()> {
    if config.poll.interval.is_zero() {
        return Err(ConfigError::invalid_value(
            "poll",
            "poll",
            "interval",
            "must be greater than zero",
        ));
    }
    if config.metrics.enabled && config.metrics.interval.is_zero() {
        return Err(ConfigError::invalid_value(
            "metrics",
            "metrics",
            "interval",
            "must be greater than zero",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::Config;
    use crate::error::ConfigError;
    use std::str::FromStr;

    #[test]
    fn test_missing_hosts() {
        let result = Config::from_str("[server]\nport = 7000");
        assert!(matches!(result, Err(ConfigError::NoHosts)));
    }

    #[test]
    fn test_duplicate_host_ignores_case() {
        let toml = r#"
[[hosts]]
name = "web01"

[[hosts]]
name = "WEB01"
"#;
        let result = Config::from_str(toml);
        assert!(matches!(result, Err(ConfigError::DuplicateHost { ref host }) if host == "WEB01"));
    }

    #[test]
    fn test_bad_category_pattern() {
        let toml = r#"
[[hosts]]
name = "localhost"
categories = "(Processor"
"#;
        let result = Config::from_str(toml);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "categories", .. })
        ));
    }

    #[test]
    fn test_zero_poll_interval() {
        let toml = r#"
[poll]
interval = "0s"

[[hosts]]
name = "localhost"
"#;
        let result = Config::from_str(toml);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { component: "poll", .. })
        ));
    }

    #[test]
    fn test_zero_metrics_interval_only_matters_when_enabled() {
        let toml = r#"
[metrics]
enabled = false
interval = "0s"

[[hosts]]
name = "localhost"
"#;
        assert!(Config::from_str(toml).is_ok());
    }
}
