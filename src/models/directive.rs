use serde::{Deserialize, Serialize};

use super::metrics::HrvSample;

/// Training diagnosis chosen by the intensity policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnosis {
  Detrained,
  Recovery,
  SweetSpot,
  Vo2Max,
}

impl Diagnosis {
  pub fn label(&self) -> &'static str {
    match self {
      Diagnosis::Detrained => "Detrained",
      Diagnosis::Recovery => "Recovery",
      Diagnosis::SweetSpot => "Sweet Spot",
      Diagnosis::Vo2Max => "VO2 Max",
    }
  }
}

impl std::fmt::Display for Diagnosis {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

/// Inclusive percentage band, e.g. 88-94
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentBand {
  pub low: u8,
  pub high: u8,
}

impl PercentBand {
  pub const fn new(low: u8, high: u8) -> Self {
    Self { low, high }
  }

  /// Apply the band to a reference wattage, rounding to whole watts
  pub fn of(&self, watts: i64) -> WattRange {
    let scale = |pct: u8| (watts as f64 * pct as f64 / 100.0).round() as i64;
    WattRange {
      low: scale(self.low),
      high: scale(self.high),
    }
  }
}

impl std::fmt::Display for PercentBand {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}-{}%", self.low, self.high)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WattRange {
  pub low: i64,
  pub high: i64,
}

impl std::fmt::Display for WattRange {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}-{}W", self.low, self.high)
  }
}

/// How hard the generated workout is allowed to go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntensityGuidance {
  /// Stay inside a power zone, expressed as % of FTP
  Zone { zone: u8, ftp_pct: PercentBand },
  /// Work intervals as % of FTP
  FtpPercent { ftp_pct: PercentBand },
  /// Work intervals capped against the measured 5-minute maximum
  FiveMinCeiling {
    five_min_pct: PercentBand,
    watts: WattRange,
  },
}

impl IntensityGuidance {
  pub fn describe(&self) -> String {
    match self {
      IntensityGuidance::Zone { zone, ftp_pct } => {
        format!("Zone {} only ({} FTP)", zone, ftp_pct)
      }
      IntensityGuidance::FtpPercent { ftp_pct } => format!("{} FTP", ftp_pct),
      IntensityGuidance::FiveMinCeiling {
        five_min_pct,
        watts,
      } => format!("{} of recent 5m max ({})", five_min_pct, watts),
    }
  }
}

/// Output of the intensity policy, consumed by the prompt builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDirective {
  pub diagnosis: Diagnosis,
  pub guidance: IntensityGuidance,
  /// HRV sample the generator must weigh before allowing anything above
  /// Zone 2 / low sweet spot. Absent means the stress check is skipped.
  pub high_stress_guard: Option<HrvSample>,
  /// Which rule fired, for logs and tests. Not parsed downstream.
  pub rationale: String,
}

impl WorkoutDirective {
  /// Watt ceiling, only present for VO2 max work
  pub fn ceiling_watts(&self) -> Option<WattRange> {
    match self.guidance {
      IntensityGuidance::FiveMinCeiling { watts, .. } => Some(watts),
      _ => None,
    }
  }

  pub fn allows_high_intensity(&self) -> bool {
    matches!(self.diagnosis, Diagnosis::SweetSpot | Diagnosis::Vo2Max)
  }
}
