// src/config/validate.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile, ReadinessSection};
use crate::errors::{Result, SvctestError};
use crate::lifecycle::ReadinessPolicy;
use crate::manifest::is_valid_name;
use crate::types::RunTimeout;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SvctestError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_global_config(&raw)?;
        let readiness = readiness_policy(&raw.readiness)?;

        Ok(ConfigFile::new_unchecked(
            raw.config.app,
            RunTimeout::from_secs(raw.config.timeout),
            PathBuf::from(raw.config.state_dir),
            readiness,
        ))
    }
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.timeout == 0 {
        return Err(SvctestError::Config(
            "[config].timeout must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.config.state_dir.trim().is_empty() {
        return Err(SvctestError::Config(
            "[config].state_dir must not be empty".to_string(),
        ));
    }

    if let Some(app) = &cfg.config.app {
        if !is_valid_name(app) {
            return Err(SvctestError::Config(format!(
                "[config].app '{}' is not a valid app name",
                app
            )));
        }
    }

    Ok(())
}

fn readiness_policy(section: &ReadinessSection) -> Result<ReadinessPolicy> {
    let field = |name: &str, value: &str| {
        parse_duration(value)
            .map_err(|e| SvctestError::Config(format!("[readiness].{name}: {e}")))
    };

    let initial_interval = field("initial_interval", &section.initial_interval)?;
    let max_interval = field("max_interval", &section.max_interval)?;
    let deadline = field("deadline", &section.deadline)?;

    if initial_interval.is_zero() {
        return Err(SvctestError::Config(
            "[readiness].initial_interval must be greater than zero".to_string(),
        ));
    }
    if max_interval < initial_interval {
        return Err(SvctestError::Config(
            "[readiness].max_interval must be >= initial_interval".to_string(),
        ));
    }
    if deadline.is_zero() {
        return Err(SvctestError::Config(
            "[readiness].deadline must be greater than zero".to_string(),
        ));
    }

    Ok(ReadinessPolicy {
        initial_interval,
        max_interval,
        deadline,
    })
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("3s"), Ok(Duration::from_secs(3)));
        assert_eq!(parse_duration("5m"), Ok(Duration::from_secs(300)));
        assert_eq!(parse_duration(" 1h "), Ok(Duration::from_secs(3600)));
    }

    #[test]
    fn rejects_missing_or_unknown_units() {
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("2d").is_err());
        assert!(parse_duration("s").is_err());
    }

    #[test]
    fn rejects_durations_that_overflow() {
        let err = parse_duration("999999999999999999h").unwrap_err();
        assert!(err.contains("too large"), "{err}");
        assert!(parse_duration("18446744073709551615m").is_err());
        assert_eq!(
            parse_duration("18446744073709551615s"),
            Ok(Duration::from_secs(u64::MAX))
        );
    }

    #[test]
    fn defaults_convert_to_default_policy() {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        assert_eq!(cfg.timeout, RunTimeout::default());
        assert_eq!(cfg.readiness, ReadinessPolicy::default());
        assert!(cfg.app.is_none());
    }
}
