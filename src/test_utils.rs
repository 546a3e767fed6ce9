//! Test utilities shared by the unit tests
//!
//! This module provides:
//! - Mock data factories for wellness records, settings and power curves
//! - An in-memory `AthleteDataSource` that counts calls
//! - Fake generator and publisher for orchestrator tests

use chrono::{Duration, NaiveDate};
use std::cell::{Cell, RefCell};

use crate::coach::{CalendarPublisher, PublishedWorkout, ScheduledWorkout, WorkoutGenerator};
use crate::intervals::IntervalsError;
use crate::llm::LlmError;
use crate::models::{
  AccountSettings, AthleteMetrics, SportInfo, SportSettings, WellnessRecord,
};
use crate::power_curve::{PowerCurve, PowerCurvePayload};
use crate::resolver::{AthleteDataSource, MetricResolutionError};

/// ---------------------------------------------------------------------------
/// Dates
/// ---------------------------------------------------------------------------

/// Fixed "today" so tests do not depend on the clock
pub fn today() -> NaiveDate {
  NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date")
}

/// `days_ago` days before `today()`
pub fn day(days_ago: i64) -> NaiveDate {
  today() - Duration::days(days_ago)
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Wellness record with CTL 42 / ATL 35 and an optional Ride eFTP
pub fn mock_wellness(date: NaiveDate, eftp: Option<f64>, w_prime: Option<f64>) -> WellnessRecord {
  WellnessRecord {
    id: date.format("%Y-%m-%d").to_string(),
    ctl: Some(42.0),
    atl: Some(35.0),
    sport_info: vec![SportInfo {
      sport_type: "Ride".to_string(),
      eftp,
      w_prime,
    }],
    hrv_sdnn: None,
    sdnn: None,
    hrv: None,
  }
}

pub fn mock_settings(ftp: Option<f64>, w_prime: Option<f64>) -> AccountSettings {
  AccountSettings {
    sport_settings: vec![SportSettings {
      types: vec!["Ride".to_string(), "VirtualRide".to_string()],
      ftp,
      w_prime,
    }],
  }
}

/// 42-day curve with a 300s bucket at `five_min` watts
pub fn mock_curves(five_min: i64) -> PowerCurvePayload {
  PowerCurvePayload::Curves(vec![PowerCurve {
    id: "42d".to_string(),
    label: "42 days".to_string(),
    secs: vec![5, 60, 300, 1200],
    watts: vec![
      Some(850.0),
      Some(380.0),
      Some(five_min as f64),
      Some(215.0),
    ],
  }])
}

pub fn mock_metrics() -> AthleteMetrics {
  AthleteMetrics {
    ftp_watts: 200,
    w_prime_joules: 13500,
    ctl: 42.0,
    atl: 35.0,
    five_min_watts: 260,
    hrv: None,
  }
}

/// ---------------------------------------------------------------------------
/// Fake Data Source
/// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeSource {
  wellness: Vec<WellnessRecord>,
  wellness_malformed: bool,
  settings: Option<AccountSettings>,
  curves: Option<PowerCurvePayload>,
  settings_calls: Cell<usize>,
  curve_calls: Cell<usize>,
}

impl FakeSource {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_wellness(mut self, records: Vec<WellnessRecord>) -> Self {
    self.wellness = records;
    self
  }

  pub fn with_wellness_error(mut self) -> Self {
    self.wellness_malformed = true;
    self
  }

  pub fn with_settings(mut self, settings: AccountSettings) -> Self {
    self.settings = Some(settings);
    self
  }

  pub fn with_curves(mut self, curves: PowerCurvePayload) -> Self {
    self.curves = Some(curves);
    self
  }

  pub fn settings_calls(&self) -> usize {
    self.settings_calls.get()
  }

  pub fn curve_calls(&self) -> usize {
    self.curve_calls.get()
  }
}

impl AthleteDataSource for FakeSource {
  async fn wellness(
    &self,
    oldest: NaiveDate,
    newest: NaiveDate,
  ) -> Result<Vec<WellnessRecord>, MetricResolutionError> {
    if self.wellness_malformed {
      return Err(MetricResolutionError::MalformedPayload(
        "expected a list of wellness records".to_string(),
      ));
    }
    Ok(
      self
        .wellness
        .iter()
        .filter(|r| r.date().is_some_and(|d| d >= oldest && d <= newest))
        .cloned()
        .collect(),
    )
  }

  async fn account_settings(&self) -> Result<Option<AccountSettings>, MetricResolutionError> {
    self.settings_calls.set(self.settings_calls.get() + 1);
    Ok(self.settings.clone())
  }

  async fn power_curves(
    &self,
    _day: NaiveDate,
  ) -> Result<Option<PowerCurvePayload>, MetricResolutionError> {
    self.curve_calls.set(self.curve_calls.get() + 1);
    Ok(self.curves.clone())
  }
}

/// ---------------------------------------------------------------------------
/// Fake Generator / Publisher
/// ---------------------------------------------------------------------------

/// Returns canned text and remembers the prompt it was given
pub struct FakeGenerator {
  pub text: String,
  pub prompts: RefCell<Vec<String>>,
}

impl FakeGenerator {
  pub fn new(text: &str) -> Self {
    Self {
      text: text.to_string(),
      prompts: RefCell::new(Vec::new()),
    }
  }
}

impl WorkoutGenerator for FakeGenerator {
  async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
    self.prompts.borrow_mut().push(prompt.to_string());
    Ok(self.text.clone())
  }
}

#[derive(Default)]
pub struct FakePublisher {
  pub published: RefCell<Vec<ScheduledWorkout>>,
}

impl CalendarPublisher for FakePublisher {
  async fn publish(&self, workout: &ScheduledWorkout) -> Result<PublishedWorkout, IntervalsError> {
    self.published.borrow_mut().push(workout.clone());
    Ok(PublishedWorkout { workout_id: 4242 })
  }
}
