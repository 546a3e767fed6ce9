//! Upstream record shapes from intervals.icu, as the resolver consumes them.
//! Every field is optional: the resolver decides what missing data means.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-sport block embedded in a wellness record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SportInfo {
  #[serde(rename = "type", default)]
  pub sport_type: String,
  #[serde(default)]
  pub eftp: Option<f64>,
  #[serde(rename = "wPrime", default)]
  pub w_prime: Option<f64>,
}

/// One day of wellness data. `id` is the ISO date (YYYY-MM-DD).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WellnessRecord {
  pub id: String,
  #[serde(default)]
  pub ctl: Option<f64>,
  #[serde(default)]
  pub atl: Option<f64>,
  #[serde(rename = "sportInfo", default)]
  pub sport_info: Vec<SportInfo>,
  #[serde(rename = "hrvSDNN", default)]
  pub hrv_sdnn: Option<f64>,
  #[serde(default)]
  pub sdnn: Option<f64>,
  /// intervals.icu reports rMSSD under plain `hrv`
  #[serde(default)]
  pub hrv: Option<f64>,
}

impl WellnessRecord {
  pub fn date(&self) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&self.id, "%Y-%m-%d").ok()
  }

  pub fn ride(&self) -> Option<&SportInfo> {
    self.sport_info.iter().find(|i| i.sport_type == "Ride")
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SportSettings {
  #[serde(default)]
  pub types: Vec<String>,
  #[serde(default)]
  pub ftp: Option<f64>,
  #[serde(default)]
  pub w_prime: Option<f64>,
}

/// Account settings record; only the sport settings matter here
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountSettings {
  #[serde(rename = "sportSettings", default)]
  pub sport_settings: Vec<SportSettings>,
}

impl AccountSettings {
  pub fn ride(&self) -> Option<&SportSettings> {
    self
      .sport_settings
      .iter()
      .find(|s| s.types.iter().any(|t| t == "Ride"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_wellness_record_deserializes_partial_payload() {
    let json = r#"{
      "id": "2026-10-18",
      "ctl": 41.7,
      "sportInfo": [
        {"type": "Run", "eftp": 4.1},
        {"type": "Ride", "eftp": 231.4, "wPrime": 14200}
      ],
      "hrvSDNN": null,
      "hrv": 62.0
    }"#;

    let record: WellnessRecord = serde_json::from_str(json).unwrap();
    assert_eq!(record.date(), NaiveDate::from_ymd_opt(2026, 10, 18));
    assert_eq!(record.atl, None);
    assert_eq!(record.ride().and_then(|r| r.eftp), Some(231.4));
    assert_eq!(record.hrv_sdnn, None);
    assert_eq!(record.hrv, Some(62.0));
  }

  #[test]
  fn test_account_settings_finds_ride_entry() {
    let json = r#"{"sportSettings": [
      {"types": ["Run", "VirtualRun"], "ftp": null},
      {"types": ["Ride", "VirtualRide"], "ftp": 220, "w_prime": 15000}
    ]}"#;

    let settings: AccountSettings = serde_json::from_str(json).unwrap();
    let ride = settings.ride().unwrap();
    assert_eq!(ride.ftp, Some(220.0));
    assert_eq!(ride.w_prime, Some(15000.0));
  }
}
