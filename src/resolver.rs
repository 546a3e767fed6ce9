//! Athlete metric resolution
//!
//! Rebuilds a single `AthleteMetrics` snapshot from overlapping upstream
//! sources. Each metric has an ordered list of strategies; the first one
//! that yields a value wins. Only a missing FTP is fatal, every other gap
//! degrades to a defined default so a conservative workout can still be built.

use chrono::{Duration, NaiveDate};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{AccountSettings, AthleteMetrics, HrvKind, HrvSample, WellnessRecord};
use crate::power_curve::{CurveSelector, PowerCurvePayload, DEFAULT_CURVE_PRIORITY};

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum MetricResolutionError {
  #[error("FTP not found in wellness eFTP or Ride sport settings")]
  MissingFtp,

  #[error("Malformed upstream payload: {0}")]
  MalformedPayload(String),

  #[error("Data source failed: {0}")]
  Source(String),
}

/// ---------------------------------------------------------------------------
/// Data Source
/// ---------------------------------------------------------------------------

/// Narrow view of the upstream platform the resolver reads from.
#[allow(async_fn_in_trait)]
pub trait AthleteDataSource {
  /// Wellness records for an inclusive date range, in any order
  async fn wellness(
    &self,
    oldest: NaiveDate,
    newest: NaiveDate,
  ) -> Result<Vec<WellnessRecord>, MetricResolutionError>;

  /// Account settings, or None when the platform does not return them
  async fn account_settings(&self) -> Result<Option<AccountSettings>, MetricResolutionError>;

  /// Ride power curves as of `day`, or None when unavailable
  async fn power_curves(
    &self,
    day: NaiveDate,
  ) -> Result<Option<PowerCurvePayload>, MetricResolutionError>;
}

/// ---------------------------------------------------------------------------
/// Strategies
/// ---------------------------------------------------------------------------

/// Where an FTP / W' pair can come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpStrategy {
  /// Ride `eftp`/`wPrime` embedded in today's wellness record
  WellnessEftp,
  /// Static `ftp`/`w_prime` of the Ride-typed sport settings
  SportSettings,
}

pub const DEFAULT_FTP_CHAIN: [FtpStrategy; 2] =
  [FtpStrategy::WellnessEftp, FtpStrategy::SportSettings];

/// HRV fields in the order they are tried on each day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HrvField {
  HrvSdnn,
  Sdnn,
  Rmssd,
}

pub const DEFAULT_HRV_FIELDS: [HrvField; 3] = [HrvField::HrvSdnn, HrvField::Sdnn, HrvField::Rmssd];

impl HrvField {
  pub fn kind(&self) -> HrvKind {
    match self {
      HrvField::HrvSdnn | HrvField::Sdnn => HrvKind::Sdnn,
      HrvField::Rmssd => HrvKind::Rmssd,
    }
  }

  pub fn read(&self, record: &WellnessRecord) -> Option<f64> {
    match self {
      HrvField::HrvSdnn => record.hrv_sdnn,
      HrvField::Sdnn => record.sdnn,
      HrvField::Rmssd => record.hrv,
    }
  }
}

/// Resolved FTP and the W' reported alongside it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FtpReading {
  pub ftp_watts: i64,
  pub w_prime_joules: Option<i64>,
  pub strategy: FtpStrategy,
}

impl FtpReading {
  fn new(ftp: Option<f64>, w_prime: Option<f64>, strategy: FtpStrategy) -> Option<Self> {
    let ftp = ftp.filter(|f| *f > 0.0)?;
    Some(Self {
      ftp_watts: ftp.round() as i64,
      w_prime_joules: w_prime.map(|w| w.round() as i64),
      strategy,
    })
  }

  pub fn from_wellness(record: &WellnessRecord) -> Option<Self> {
    let ride = record.ride()?;
    Self::new(ride.eftp, ride.w_prime, FtpStrategy::WellnessEftp)
  }

  pub fn from_settings(settings: &AccountSettings) -> Option<Self> {
    let ride = settings.ride()?;
    Self::new(ride.ftp, ride.w_prime, FtpStrategy::SportSettings)
  }
}

/// ---------------------------------------------------------------------------
/// Resolver
/// ---------------------------------------------------------------------------

pub struct MetricResolver<S> {
  source: S,
  ftp_chain: Vec<FtpStrategy>,
  curve_priority: Vec<CurveSelector>,
  hrv_fields: Vec<HrvField>,
  hrv_lookback_days: i64,
}

impl<S: AthleteDataSource> MetricResolver<S> {
  pub fn new(source: S) -> Self {
    Self {
      source,
      ftp_chain: DEFAULT_FTP_CHAIN.to_vec(),
      curve_priority: DEFAULT_CURVE_PRIORITY.to_vec(),
      hrv_fields: DEFAULT_HRV_FIELDS.to_vec(),
      hrv_lookback_days: 7,
    }
  }

  pub fn with_ftp_chain(mut self, chain: Vec<FtpStrategy>) -> Self {
    self.ftp_chain = chain;
    self
  }

  pub fn with_curve_priority(mut self, priority: Vec<CurveSelector>) -> Self {
    self.curve_priority = priority;
    self
  }

  pub fn with_hrv_fields(mut self, fields: Vec<HrvField>) -> Self {
    self.hrv_fields = fields;
    self
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  /// Resolve the metric snapshot for `today`
  pub async fn resolve(&self, today: NaiveDate) -> Result<AthleteMetrics, MetricResolutionError> {
    let oldest = today - Duration::days(self.hrv_lookback_days - 1);
    let window = self.source.wellness(oldest, today).await?;
    let today_record = window.iter().find(|r| r.date() == Some(today));

    if today_record.is_none() {
      warn!(%today, "no wellness record for today");
    }

    let ftp = self.resolve_ftp(today_record).await?;

    let w_prime_joules = ftp.w_prime_joules.unwrap_or_else(|| {
      warn!("W' not reported, defaulting to 0");
      0
    });

    let ctl = today_record.and_then(|r| r.ctl).unwrap_or_else(|| {
      warn!("CTL missing, defaulting to 0");
      0.0
    });
    let atl = today_record.and_then(|r| r.atl).unwrap_or_else(|| {
      warn!("ATL missing, defaulting to 0");
      0.0
    });

    let five_min_watts = self.resolve_five_min(today).await?;
    let hrv = self.resolve_hrv(&window);

    let metrics = AthleteMetrics {
      ftp_watts: ftp.ftp_watts,
      w_prime_joules,
      ctl,
      atl,
      five_min_watts,
      hrv,
    };

    info!(
      ftp = metrics.ftp_watts,
      w_prime = metrics.w_prime_joules,
      ctl = metrics.ctl,
      atl = metrics.atl,
      tsb = metrics.tsb(),
      five_min = metrics.five_min_watts,
      "metrics resolved"
    );

    Ok(metrics)
  }

  async fn resolve_ftp(
    &self,
    today_record: Option<&WellnessRecord>,
  ) -> Result<FtpReading, MetricResolutionError> {
    for strategy in &self.ftp_chain {
      let reading = match strategy {
        FtpStrategy::WellnessEftp => today_record.and_then(FtpReading::from_wellness),
        FtpStrategy::SportSettings => self
          .source
          .account_settings()
          .await?
          .as_ref()
          .and_then(FtpReading::from_settings),
      };

      match reading {
        Some(reading) => {
          info!(ftp = reading.ftp_watts, source = ?strategy, "FTP resolved");
          return Ok(reading);
        }
        None => debug!(source = ?strategy, "FTP not available"),
      }
    }

    Err(MetricResolutionError::MissingFtp)
  }

  /// 0 when no curve carries a 300-second bucket
  async fn resolve_five_min(&self, today: NaiveDate) -> Result<i64, MetricResolutionError> {
    let Some(payload) = self.source.power_curves(today).await? else {
      warn!("no power curve available, 5m max set to 0");
      return Ok(0);
    };

    match payload.five_minute_best(&self.curve_priority) {
      Some(best) => {
        info!(watts = best.watts, curve = %best.curve, "5m max power found");
        Ok(best.watts)
      }
      None => {
        warn!("no 300s bucket in any power curve, 5m max set to 0");
        Ok(0)
      }
    }
  }

  /// Scan most-recent-first and stop at the first populated field on any day
  fn resolve_hrv(&self, window: &[WellnessRecord]) -> Option<HrvSample> {
    let mut days: Vec<(NaiveDate, &WellnessRecord)> = window
      .iter()
      .filter_map(|r| r.date().map(|d| (d, r)))
      .collect();
    days.sort_by(|a, b| b.0.cmp(&a.0));

    let sample = days.iter().find_map(|(date, record)| {
      self.hrv_fields.iter().find_map(|field| {
        field.read(record).map(|value| HrvSample {
          value,
          kind: field.kind(),
          sample_date: *date,
        })
      })
    });

    match &sample {
      Some(s) => info!(value = s.display_value(), kind = s.kind.as_str(), date = %s.sample_date, "HRV found"),
      None => warn!(days = self.hrv_lookback_days, "no HRV in lookback window, skipping stress check"),
    }

    sample
  }
}
