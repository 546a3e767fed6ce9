//! intervals.icu integration
//!
//! Reads wellness, account settings and power curves for the resolver, and
//! publishes the finished workout to the library and calendar. Authentication
//! is HTTP basic with the fixed user `API_KEY` and the athlete's key.

use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::coach::{CalendarPublisher, PublishedWorkout, ScheduledWorkout};
use crate::config::CoachConfig;
use crate::models::{AccountSettings, WellnessRecord};
use crate::power_curve::{PowerCurveList, PowerCurvePayload, PowerCurveTable};
use crate::resolver::{AthleteDataSource, MetricResolutionError};

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

pub const INTERVALS_API_BASE: &str = "https://intervals.icu";
const AUTH_USER: &str = "API_KEY";
const SPORT: &str = "Ride";
/// Curve ids requested from the power-curve endpoints. intervals.icu has no
/// request id for a current-ability curve; when the response carries one
/// anyway (by id or label) the `Currency` selector picks it up.
const CURVE_IDS: &str = "42d,s0";

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum IntervalsError {
  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("Invalid URL: {0}")]
  Url(#[from] url::ParseError),

  #[error("Not authenticated with intervals.icu")]
  NotAuthenticated,

  #[error("API error {status}: {body}")]
  Api { status: StatusCode, body: String },

  #[error("Failed to parse {what}: {message}")]
  Parse { what: &'static str, message: String },
}

impl From<IntervalsError> for MetricResolutionError {
  fn from(e: IntervalsError) -> Self {
    match e {
      IntervalsError::Parse { .. } => MetricResolutionError::MalformedPayload(e.to_string()),
      other => MetricResolutionError::Source(other.to_string()),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Publishing Payloads
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct NewWorkout<'a> {
  name: &'a str,
  description: &'a str,
  #[serde(rename = "type")]
  workout_type: &'a str,
  sport: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  folder_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CreatedWorkout {
  id: i64,
}

#[derive(Debug, Serialize)]
struct NewEvent<'a> {
  category: &'a str,
  start_date_local: String,
  name: &'a str,
  #[serde(rename = "type")]
  event_type: &'a str,
  workout_id: i64,
  description: &'a str,
}

/// ---------------------------------------------------------------------------
/// Client
/// ---------------------------------------------------------------------------

pub struct IntervalsClient {
  client: Client,
  api_key: String,
  athlete_id: String,
  api_base: String,
}

impl IntervalsClient {
  pub fn new(api_key: &str, athlete_id: &str, api_base: &str) -> Self {
    Self {
      client: Client::new(),
      api_key: api_key.to_string(),
      athlete_id: athlete_id.to_string(),
      api_base: api_base.trim_end_matches('/').to_string(),
    }
  }

  pub fn from_config(config: &CoachConfig) -> Self {
    Self::new(
      &config.intervals_api_key,
      &config.athlete_id,
      &config.intervals_api_base,
    )
  }

  /// `/api/v1/athlete/{id}{path}`
  fn endpoint(&self, path: &str) -> Result<Url, IntervalsError> {
    Ok(Url::parse(&format!(
      "{}/api/v1/athlete/{}{}",
      self.api_base, self.athlete_id, path
    ))?)
  }

  async fn get(&self, url: Url) -> Result<reqwest::Response, IntervalsError> {
    let response = self
      .client
      .get(url)
      .basic_auth(AUTH_USER, Some(&self.api_key))
      .send()
      .await?;

    if response.status() == StatusCode::UNAUTHORIZED {
      return Err(IntervalsError::NotAuthenticated);
    }

    Ok(response)
  }

  async fn error_for(response: reqwest::Response) -> IntervalsError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    IntervalsError::Api { status, body }
  }

  /// Wellness records for an inclusive date range
  pub async fn fetch_wellness(
    &self,
    oldest: NaiveDate,
    newest: NaiveDate,
  ) -> Result<Vec<WellnessRecord>, IntervalsError> {
    let mut url = self.endpoint("/wellness")?;
    url
      .query_pairs_mut()
      .append_pair("oldest", &oldest.format("%Y-%m-%d").to_string())
      .append_pair("newest", &newest.format("%Y-%m-%d").to_string());

    let response = self.get(url).await?;
    if !response.status().is_success() {
      return Err(Self::error_for(response).await);
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| IntervalsError::Parse {
      what: "wellness list",
      message: e.to_string(),
    })
  }

  /// Athlete record with sport settings. Any non-success status is treated
  /// as "no settings".
  pub async fn fetch_account_settings(&self) -> Result<Option<AccountSettings>, IntervalsError> {
    let response = self.get(self.endpoint("")?).await?;

    if !response.status().is_success() {
      warn!(status = %response.status(), "athlete settings unavailable");
      return Ok(None);
    }

    let text = response.text().await?;
    serde_json::from_str(&text)
      .map(Some)
      .map_err(|e| IntervalsError::Parse {
        what: "athlete settings",
        message: e.to_string(),
      })
  }

  fn power_curve_url(&self, ext: &str, day: NaiveDate) -> Result<Url, IntervalsError> {
    let mut url = self.endpoint(&format!("/power-curves.{}", ext))?;
    url
      .query_pairs_mut()
      .append_pair("type", SPORT)
      .append_pair("curves", CURVE_IDS)
      .append_pair("newest", &day.format("%Y-%m-%d").to_string());
    Ok(url)
  }

  /// Ride power curves, JSON first with the CSV export as a fallback.
  /// None when neither form is available.
  pub async fn fetch_power_curves(
    &self,
    day: NaiveDate,
  ) -> Result<Option<PowerCurvePayload>, IntervalsError> {
    let response = self.get(self.power_curve_url("json", day)?).await?;
    if response.status().is_success() {
      let text = response.text().await?;
      match serde_json::from_str::<PowerCurveList>(&text) {
        Ok(list) => return Ok(Some(PowerCurvePayload::Curves(list.into_curves()))),
        Err(e) => debug!(error = %e, "power-curves.json unreadable, trying CSV"),
      }
    } else {
      debug!(status = %response.status(), "power-curves.json unavailable, trying CSV");
    }

    let response = self.get(self.power_curve_url("csv", day)?).await?;
    if !response.status().is_success() {
      warn!(status = %response.status(), "power-curves.csv unavailable");
      return Ok(None);
    }

    let text = response.text().await?;
    match PowerCurveTable::from_csv(&text) {
      Ok(table) => Ok(Some(PowerCurvePayload::Table(table))),
      Err(e) => {
        warn!(error = %e, "power-curves.csv unreadable");
        Ok(None)
      }
    }
  }

  /// Create a library workout and return its id
  pub async fn create_workout(
    &self,
    name: &str,
    description: &str,
    folder_id: Option<i64>,
  ) -> Result<i64, IntervalsError> {
    let payload = NewWorkout {
      name,
      description,
      workout_type: SPORT,
      sport: SPORT,
      folder_id,
    };

    let response = self
      .client
      .post(self.endpoint("/workouts")?)
      .basic_auth(AUTH_USER, Some(&self.api_key))
      .json(&payload)
      .send()
      .await?;

    if !response.status().is_success() {
      return Err(Self::error_for(response).await);
    }

    let text = response.text().await?;
    let created: CreatedWorkout = serde_json::from_str(&text).map_err(|e| IntervalsError::Parse {
      what: "created workout",
      message: e.to_string(),
    })?;

    Ok(created.id)
  }

  /// Upsert a calendar event pointing at a library workout
  pub async fn upsert_event(
    &self,
    workout: &ScheduledWorkout,
    workout_id: i64,
  ) -> Result<(), IntervalsError> {
    let event = NewEvent {
      category: "WORKOUT",
      start_date_local: workout.start_date_local.format("%Y-%m-%dT%H:%M:%S").to_string(),
      name: &workout.name,
      event_type: SPORT,
      workout_id,
      description: &workout.description,
    };

    let mut url = self.endpoint("/events/bulk")?;
    url.query_pairs_mut().append_pair("upsert", "true");

    let response = self
      .client
      .post(url)
      .basic_auth(AUTH_USER, Some(&self.api_key))
      .json(&[event])
      .send()
      .await?;

    if !response.status().is_success() {
      return Err(Self::error_for(response).await);
    }

    Ok(())
  }
}

/// ---------------------------------------------------------------------------
/// Trait Implementations
/// ---------------------------------------------------------------------------

impl AthleteDataSource for IntervalsClient {
  async fn wellness(
    &self,
    oldest: NaiveDate,
    newest: NaiveDate,
  ) -> Result<Vec<WellnessRecord>, MetricResolutionError> {
    Ok(self.fetch_wellness(oldest, newest).await?)
  }

  async fn account_settings(&self) -> Result<Option<AccountSettings>, MetricResolutionError> {
    Ok(self.fetch_account_settings().await?)
  }

  async fn power_curves(
    &self,
    day: NaiveDate,
  ) -> Result<Option<PowerCurvePayload>, MetricResolutionError> {
    Ok(self.fetch_power_curves(day).await?)
  }
}

impl CalendarPublisher for IntervalsClient {
  async fn publish(&self, workout: &ScheduledWorkout) -> Result<PublishedWorkout, IntervalsError> {
    let workout_id = self
      .create_workout(&workout.name, &workout.description, workout.folder_id)
      .await?;
    self.upsert_event(workout, workout_id).await?;
    Ok(PublishedWorkout { workout_id })
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
