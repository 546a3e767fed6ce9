//! Runtime configuration, read from the environment (and `.env` via dotenvy)

use chrono::{FixedOffset, Offset, Utc};
use std::env;
use thiserror::Error;

use crate::intervals::INTERVALS_API_BASE;
use crate::llm::{GEMINI_API_BASE, GEMINI_MODEL};

const DEFAULT_SCHEDULE_HOUR: u32 = 19;
/// KST
const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("Missing configuration: {0}")]
  Missing(String),

  #[error("Invalid value for {name}: {value}")]
  Invalid { name: String, value: String },
}

#[derive(Debug, Clone)]
pub struct CoachConfig {
  pub intervals_api_key: String,
  pub athlete_id: String,
  pub intervals_api_base: String,
  pub gemini_api_key: String,
  pub gemini_api_base: String,
  pub gemini_model: String,
  /// Workout library folder the generated workout is filed under
  pub target_folder_id: Option<i64>,
  /// Local hour (0-23) the calendar event starts at
  pub schedule_hour: u32,
  pub utc_offset_hours: i32,
}

impl CoachConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    let schedule_hour = parse_var("SCHEDULE_HOUR")?.unwrap_or(DEFAULT_SCHEDULE_HOUR);
    if schedule_hour > 23 {
      return Err(ConfigError::Invalid {
        name: "SCHEDULE_HOUR".into(),
        value: schedule_hour.to_string(),
      });
    }

    let utc_offset_hours = parse_var("UTC_OFFSET_HOURS")?.unwrap_or(DEFAULT_UTC_OFFSET_HOURS);
    if !(-12..=14).contains(&utc_offset_hours) {
      return Err(ConfigError::Invalid {
        name: "UTC_OFFSET_HOURS".into(),
        value: utc_offset_hours.to_string(),
      });
    }

    Ok(Self {
      intervals_api_key: required("INTERVALS_API_KEY")?,
      athlete_id: required("ATHLETE_ID")?,
      intervals_api_base: optional("INTERVALS_API_BASE")
        .unwrap_or_else(|| INTERVALS_API_BASE.to_string()),
      gemini_api_key: required("GEMINI_API_KEY")?,
      gemini_api_base: optional("GEMINI_API_BASE").unwrap_or_else(|| GEMINI_API_BASE.to_string()),
      gemini_model: optional("GEMINI_MODEL").unwrap_or_else(|| GEMINI_MODEL.to_string()),
      target_folder_id: parse_var("TARGET_FOLDER_ID")?,
      schedule_hour,
      utc_offset_hours,
    })
  }

  /// The athlete's local offset
  pub fn utc_offset(&self) -> FixedOffset {
    FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
  }
}

fn optional(name: &str) -> Option<String> {
  env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &str) -> Result<String, ConfigError> {
  optional(name).ok_or_else(|| ConfigError::Missing(name.into()))
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
  optional(name)
    .map(|value| {
      value.trim().parse().map_err(|_| ConfigError::Invalid {
        name: name.into(),
        value,
      })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  /// Required vars set, optional ones cleared, then `overrides` applied
  fn env_with(
    overrides: &[(&'static str, Option<&'static str>)],
  ) -> Vec<(&'static str, Option<&'static str>)> {
    let mut vars = vec![
      ("INTERVALS_API_KEY", Some("ik")),
      ("ATHLETE_ID", Some("i12345")),
      ("GEMINI_API_KEY", Some("gk")),
      ("INTERVALS_API_BASE", None),
      ("GEMINI_API_BASE", None),
      ("GEMINI_MODEL", None),
      ("TARGET_FOLDER_ID", None),
      ("SCHEDULE_HOUR", None),
      ("UTC_OFFSET_HOURS", None),
    ];
    for (name, value) in overrides {
      match vars.iter_mut().find(|(n, _)| n == name) {
        Some(slot) => slot.1 = *value,
        None => vars.push((*name, *value)),
      }
    }
    vars
  }

  #[test]
  #[serial]
  fn test_defaults() {
    temp_env::with_vars(env_with(&[]), || {
      let config = CoachConfig::from_env().unwrap();
      assert_eq!(config.athlete_id, "i12345");
      assert_eq!(config.schedule_hour, 19);
      assert_eq!(config.utc_offset_hours, 9);
      assert_eq!(config.utc_offset().local_minus_utc(), 9 * 3600);
      assert_eq!(config.target_folder_id, None);
      assert_eq!(config.gemini_model, "gemini-2.5-flash");
      assert_eq!(config.intervals_api_base, INTERVALS_API_BASE);
    });
  }

  #[test]
  #[serial]
  fn test_overrides() {
    let vars = env_with(&[
      ("TARGET_FOLDER_ID", Some("224530")),
      ("SCHEDULE_HOUR", Some("6")),
      ("UTC_OFFSET_HOURS", Some("-5")),
      ("GEMINI_MODEL", Some("gemini-2.5-pro")),
    ]);

    temp_env::with_vars(vars, || {
      let config = CoachConfig::from_env().unwrap();
      assert_eq!(config.target_folder_id, Some(224530));
      assert_eq!(config.schedule_hour, 6);
      assert_eq!(config.utc_offset().local_minus_utc(), -5 * 3600);
      assert_eq!(config.gemini_model, "gemini-2.5-pro");
    });
  }

  #[test]
  #[serial]
  fn test_missing_required() {
    temp_env::with_vars(env_with(&[("ATHLETE_ID", None)]), || {
      assert_eq!(
        CoachConfig::from_env().unwrap_err(),
        ConfigError::Missing("ATHLETE_ID".into())
      );
    });
  }

  #[test]
  #[serial]
  fn test_invalid_numbers() {
    temp_env::with_vars(env_with(&[("SCHEDULE_HOUR", Some("25"))]), || {
      assert!(matches!(
        CoachConfig::from_env(),
        Err(ConfigError::Invalid { ref name, .. }) if name == "SCHEDULE_HOUR"
      ));
    });

    temp_env::with_vars(env_with(&[("TARGET_FOLDER_ID", Some("abc"))]), || {
      assert_eq!(
        CoachConfig::from_env().unwrap_err(),
        ConfigError::Invalid {
          name: "TARGET_FOLDER_ID".into(),
          value: "abc".into()
        }
      );
    });
  }
}
