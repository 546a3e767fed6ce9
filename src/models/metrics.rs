use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which wellness field an HRV value was read from.
/// SDNN and rMSSD live on different numeric scales and must not be mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HrvKind {
  #[serde(rename = "SDNN")]
  Sdnn,
  #[serde(rename = "rMSSD")]
  Rmssd,
}

impl HrvKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      HrvKind::Sdnn => "SDNN",
      HrvKind::Rmssd => "rMSSD",
    }
  }
}

/// Most recent HRV reading found in the lookback window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrvSample {
  /// Raw value in milliseconds, unrounded
  pub value: f64,
  pub kind: HrvKind,
  pub sample_date: NaiveDate,
}

impl HrvSample {
  /// One-decimal value for display. Threshold checks should use `value`.
  pub fn display_value(&self) -> f64 {
    (self.value * 10.0).round() / 10.0
  }
}

/// Canonical metric snapshot for a single run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteMetrics {
  pub ftp_watts: i64,
  /// 0 when neither source reports W'
  pub w_prime_joules: i64,
  pub ctl: f64,
  pub atl: f64,
  /// 0 is the "no recent maximal effort on record" sentinel
  pub five_min_watts: i64,
  pub hrv: Option<HrvSample>,
}

impl AthleteMetrics {
  /// Training Stress Balance ("form"), always derived from CTL and ATL
  pub fn tsb(&self) -> f64 {
    self.ctl - self.atl
  }

  pub fn has_five_min_effort(&self) -> bool {
    self.five_min_watts != 0
  }

  /// Summary trailer in fixed key order: FTP, W', CTL, ATL, TSB, then HRV if known.
  pub fn status_line(&self) -> String {
    let mut line = format!(
      "Status: FTP {}W | W' {}J | CTL {:.1} | ATL {:.1} | TSB {:.1}",
      self.ftp_watts,
      self.w_prime_joules,
      self.ctl,
      self.atl,
      self.tsb()
    );

    if let Some(hrv) = &self.hrv {
      line.push_str(&format!(
        " | HRV {:.1}ms ({})",
        hrv.display_value(),
        hrv.kind.as_str()
      ));
    }

    line
  }
}
