//! Intensity policy: metrics -> workout directive
//!
//! Pure decision table with no I/O, first matching rule wins:
//! 1. CTL < 30 or no recent 5m effort -> Detrained (Zone 2 only)
//! 2. HRV on record -> attach a high-stress guard for the generator to weigh
//! 3. TSB band -> Recovery / Sweet Spot / VO2 Max

use crate::models::{AthleteMetrics, Diagnosis, IntensityGuidance, PercentBand, WorkoutDirective};

pub const DETRAINED_CTL: f64 = 30.0;
pub const RECOVERY_TSB: f64 = -10.0;
pub const VO2_TSB: f64 = 10.0;

const ZONE2_FTP: PercentBand = PercentBand::new(55, 65);
const ZONE1_FTP: PercentBand = PercentBand::new(40, 55);
const SWEET_SPOT_FTP: PercentBand = PercentBand::new(88, 94);
const SWEET_SPOT_WIDE_FTP: PercentBand = PercentBand::new(88, 100);
const VO2_FIVE_MIN: PercentBand = PercentBand::new(90, 95);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntensityPolicy {
  sweet_spot: PercentBand,
}

impl Default for IntensityPolicy {
  fn default() -> Self {
    Self {
      sweet_spot: SWEET_SPOT_FTP,
    }
  }
}

impl IntensityPolicy {
  /// Sweet spot widened to 88-100% FTP
  pub fn widened() -> Self {
    Self {
      sweet_spot: SWEET_SPOT_WIDE_FTP,
    }
  }

  pub fn sweet_spot(&self) -> PercentBand {
    self.sweet_spot
  }

  pub fn prescribe(&self, metrics: &AthleteMetrics) -> WorkoutDirective {
    let tsb = metrics.tsb();

    if metrics.ctl < DETRAINED_CTL || !metrics.has_five_min_effort() {
      let reason = if metrics.ctl < DETRAINED_CTL {
        format!("CTL {:.1} < {:.0}", metrics.ctl, DETRAINED_CTL)
      } else {
        "no recent 5m max effort on record".to_string()
      };
      return WorkoutDirective {
        diagnosis: Diagnosis::Detrained,
        guidance: IntensityGuidance::Zone {
          zone: 2,
          ftp_pct: ZONE2_FTP,
        },
        // Already capped at Zone 2, nothing left for a stress check to cap
        high_stress_guard: None,
        rationale: format!("detraining rule: {}", reason),
      };
    }

    let (diagnosis, guidance, band_reason) = if tsb < RECOVERY_TSB {
      (
        Diagnosis::Recovery,
        IntensityGuidance::Zone {
          zone: 1,
          ftp_pct: ZONE1_FTP,
        },
        format!("TSB {:.1} < {:.0}", tsb, RECOVERY_TSB),
      )
    } else if tsb <= VO2_TSB {
      (
        Diagnosis::SweetSpot,
        IntensityGuidance::FtpPercent {
          ftp_pct: self.sweet_spot,
        },
        format!("TSB {:.1} within [{:.0}, {:.0}]", tsb, RECOVERY_TSB, VO2_TSB),
      )
    } else {
      (
        Diagnosis::Vo2Max,
        IntensityGuidance::FiveMinCeiling {
          five_min_pct: VO2_FIVE_MIN,
          watts: VO2_FIVE_MIN.of(metrics.five_min_watts),
        },
        format!("TSB {:.1} > {:.0}", tsb, VO2_TSB),
      )
    };

    let rationale = match &metrics.hrv {
      Some(hrv) => format!(
        "hrv stress guard ({} {:.1}ms on {}); tsb rule: {}",
        hrv.kind.as_str(),
        hrv.display_value(),
        hrv.sample_date,
        band_reason
      ),
      None => format!("tsb rule: {}", band_reason),
    };

    WorkoutDirective {
      diagnosis,
      guidance,
      high_stress_guard: metrics.hrv.clone(),
      rationale,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{HrvKind, HrvSample, WattRange};
  use crate::test_utils::{day, mock_metrics};

  fn with_load(ctl: f64, atl: f64, five_min: i64) -> AthleteMetrics {
    AthleteMetrics {
      ctl,
      atl,
      five_min_watts: five_min,
      ..mock_metrics()
    }
  }

  #[test]
  fn test_low_ctl_beats_fresh_tsb() {
    // ctl=20, tsb=15 would be VO2 max if the CTL rule did not fire first
    let directive = IntensityPolicy::default().prescribe(&with_load(20.0, 5.0, 150));
    assert_eq!(directive.diagnosis, Diagnosis::Detrained);
    assert!(directive.rationale.starts_with("detraining rule"));
    assert!(directive.rationale.contains("CTL 20.0"));
    assert_eq!(directive.ceiling_watts(), None);
    assert!(!directive.allows_high_intensity());
  }

  #[test]
  fn test_missing_five_min_is_detrained() {
    let directive = IntensityPolicy::default().prescribe(&with_load(60.0, 40.0, 0));
    assert_eq!(directive.diagnosis, Diagnosis::Detrained);
    assert!(directive.rationale.contains("no recent 5m max"));
    assert_eq!(
      directive.guidance,
      IntensityGuidance::Zone {
        zone: 2,
        ftp_pct: PercentBand::new(55, 65)
      }
    );
  }

  #[test]
  fn test_tsb_bands() {
    let policy = IntensityPolicy::default();

    assert_eq!(policy.prescribe(&with_load(50.0, 61.0, 280)).diagnosis, Diagnosis::Recovery);
    assert_eq!(policy.prescribe(&with_load(50.0, 60.0, 280)).diagnosis, Diagnosis::SweetSpot);
    assert_eq!(policy.prescribe(&with_load(50.0, 50.0, 280)).diagnosis, Diagnosis::SweetSpot);
    assert_eq!(policy.prescribe(&with_load(50.0, 40.0, 280)).diagnosis, Diagnosis::SweetSpot);
    assert_eq!(policy.prescribe(&with_load(50.0, 39.0, 280)).diagnosis, Diagnosis::Vo2Max);
  }

  #[test]
  fn test_vo2_ceiling_uses_five_min_not_ftp() {
    let directive = IntensityPolicy::default().prescribe(&with_load(50.0, 35.0, 300));
    assert_eq!(directive.diagnosis, Diagnosis::Vo2Max);
    assert_eq!(directive.ceiling_watts(), Some(WattRange { low: 270, high: 285 }));
    assert!(directive.rationale.contains("tsb rule: TSB 15.0 > 10"));
  }

  #[test]
  fn test_widened_sweet_spot() {
    let directive = IntensityPolicy::widened().prescribe(&with_load(50.0, 50.0, 280));
    assert_eq!(
      directive.guidance,
      IntensityGuidance::FtpPercent {
        ftp_pct: PercentBand::new(88, 100)
      }
    );
  }

  #[test]
  fn test_hrv_attaches_stress_guard() {
    let sample = HrvSample {
      value: 38.44,
      kind: HrvKind::Rmssd,
      sample_date: day(1),
    };
    let metrics = AthleteMetrics {
      hrv: Some(sample.clone()),
      ..with_load(50.0, 35.0, 300)
    };

    let directive = IntensityPolicy::default().prescribe(&metrics);

    assert_eq!(directive.diagnosis, Diagnosis::Vo2Max);
    assert_eq!(directive.high_stress_guard, Some(sample));
    assert!(directive.rationale.starts_with("hrv stress guard (rMSSD 38.4ms"));
  }

  #[test]
  fn test_detrained_ignores_hrv() {
    let metrics = AthleteMetrics {
      hrv: Some(HrvSample {
        value: 38.0,
        kind: HrvKind::Sdnn,
        sample_date: day(0),
      }),
      ..with_load(12.0, 3.0, 0)
    };
    let directive = IntensityPolicy::default().prescribe(&metrics);
    assert_eq!(directive.diagnosis, Diagnosis::Detrained);
    assert_eq!(directive.high_stress_guard, None);
  }

  #[test]
  fn test_policy_is_deterministic() {
    let policy = IntensityPolicy::default();
    let metrics = with_load(47.3, 41.9, 264);
    assert_eq!(policy.prescribe(&metrics), policy.prescribe(&metrics));
  }
}
