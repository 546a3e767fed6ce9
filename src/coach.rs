//! Daily coaching run
//!
//! resolve metrics -> prescribe -> prompt -> generate -> normalize -> publish.
//! Every fatal error comes back to the caller as a `CoachError`; nothing in
//! here terminates the process.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::CoachConfig;
use crate::intervals::IntervalsError;
use crate::llm::LlmError;
use crate::models::{AthleteMetrics, Diagnosis, WorkoutDirective, WorkoutScript};
use crate::normalizer::{normalize_with_discards, EmptyScriptError};
use crate::policy::IntensityPolicy;
use crate::prompt::build_workout_prompt;
use crate::resolver::{AthleteDataSource, MetricResolutionError, MetricResolver};

/// ---------------------------------------------------------------------------
/// Collaborators
/// ---------------------------------------------------------------------------

/// Turns a prompt into raw workout text
#[allow(async_fn_in_trait)]
pub trait WorkoutGenerator {
  async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Files a finished workout in the library and on the calendar
#[allow(async_fn_in_trait)]
pub trait CalendarPublisher {
  async fn publish(&self, workout: &ScheduledWorkout) -> Result<PublishedWorkout, IntervalsError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledWorkout {
  pub name: String,
  pub description: String,
  pub start_date_local: NaiveDateTime,
  pub folder_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PublishedWorkout {
  pub workout_id: i64,
}

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum CoachError {
  #[error("Metric resolution failed: {0}")]
  Metrics(#[from] MetricResolutionError),

  #[error("Workout generation failed: {0}")]
  Generation(#[from] LlmError),

  #[error("Normalization failed: {0}")]
  EmptyScript(#[from] EmptyScriptError),

  #[error("Publishing failed: {0}")]
  Publish(#[from] IntervalsError),

  #[error("Invalid schedule hour: {0}")]
  ScheduleHour(u32),
}

/// ---------------------------------------------------------------------------
/// Run Report
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CoachReport {
  pub metrics: AthleteMetrics,
  pub directive: WorkoutDirective,
  pub script: WorkoutScript,
  pub workout_name: String,
  pub scheduled_for: NaiveDateTime,
  /// None on dry runs
  pub workout_id: Option<i64>,
}

/// Where and when the workout lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
  /// Local hour (0-23)
  pub hour: u32,
  pub folder_id: Option<i64>,
}

impl Schedule {
  pub fn from_config(config: &CoachConfig) -> Self {
    Self {
      hour: config.schedule_hour,
      folder_id: config.target_folder_id,
    }
  }

  pub fn start_on(&self, day: NaiveDate) -> Result<NaiveDateTime, CoachError> {
    NaiveTime::from_hms_opt(self.hour, 0, 0)
      .map(|time| day.and_time(time))
      .ok_or(CoachError::ScheduleHour(self.hour))
  }
}

/// The athlete's calendar date at `now`
pub fn local_today(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
  now.with_timezone(&offset).date_naive()
}

pub fn workout_name(metrics: &AthleteMetrics, directive: &WorkoutDirective) -> String {
  match directive.diagnosis {
    Diagnosis::Detrained => format!("AI Coach: Detrained (CTL {:.1})", metrics.ctl),
    diagnosis => format!("AI Coach: {} (TSB {:.1})", diagnosis.label(), metrics.tsb()),
  }
}

/// ---------------------------------------------------------------------------
/// Orchestrator
/// ---------------------------------------------------------------------------

pub struct DailyCoach<S, G, P> {
  resolver: MetricResolver<S>,
  policy: IntensityPolicy,
  generator: G,
  publisher: P,
  schedule: Schedule,
}

impl<S, G, P> DailyCoach<S, G, P>
where
  S: AthleteDataSource,
  G: WorkoutGenerator,
  P: CalendarPublisher,
{
  pub fn new(
    resolver: MetricResolver<S>,
    policy: IntensityPolicy,
    generator: G,
    publisher: P,
    schedule: Schedule,
  ) -> Self {
    Self {
      resolver,
      policy,
      generator,
      publisher,
      schedule,
    }
  }

  pub fn generator(&self) -> &G {
    &self.generator
  }

  pub fn publisher(&self) -> &P {
    &self.publisher
  }

  pub async fn run(&self, today: NaiveDate, dry_run: bool) -> Result<CoachReport, CoachError> {
    // Reject a bad hour before spending a generation call
    let scheduled_for = self.schedule.start_on(today)?;

    let metrics = self.resolver.resolve(today).await?;

    let directive = self.policy.prescribe(&metrics);
    info!(
      diagnosis = %directive.diagnosis,
      intensity = %directive.guidance.describe(),
      hrv_guard = directive.high_stress_guard.is_some(),
      rationale = %directive.rationale,
      "directive"
    );

    let prompt = build_workout_prompt(&metrics, &directive);
    let raw = self.generator.generate(&prompt).await?;
    debug!(chars = raw.len(), "generator returned");

    let (script, discarded) = normalize_with_discards(&raw)?;
    for line in &discarded {
      debug!(line = %line.line, reason = line.reason, "dropped line");
    }
    let script = script.with_default_status(metrics.status_line());
    info!(
      steps = script.step_count(),
      minutes = script.total_seconds() / 60,
      dropped = discarded.len(),
      "workout normalized\n{}",
      script
    );

    let workout_name = workout_name(&metrics, &directive);
    let workout = ScheduledWorkout {
      name: workout_name.clone(),
      description: script.to_text(),
      start_date_local: scheduled_for,
      folder_id: self.schedule.folder_id,
    };

    let workout_id = if dry_run {
      info!(name = %workout.name, at = %scheduled_for, "dry run, not publishing");
      None
    } else {
      let published = self.publisher.publish(&workout).await?;
      info!(
        name = %workout.name,
        at = %scheduled_for,
        workout_id = published.workout_id,
        "workout scheduled"
      );
      Some(published.workout_id)
    };

    Ok(CoachReport {
      metrics,
      directive,
      script,
      workout_name,
      scheduled_for,
      workout_id,
    })
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
