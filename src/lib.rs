pub mod coach;
pub mod config;
pub mod intervals;
pub mod llm;
pub mod models;
pub mod normalizer;
pub mod policy;
pub mod power_curve;
pub mod prompt;
pub mod resolver;

#[cfg(test)]
mod test_utils;

use chrono::{NaiveDate, Utc};
use tracing::info;

use coach::{local_today, CoachError, CoachReport, DailyCoach, Schedule};
use config::CoachConfig;
use intervals::IntervalsClient;
use llm::GeminiClient;
use policy::IntensityPolicy;
use resolver::MetricResolver;

/// One coaching run against the live services. `date` overrides the
/// athlete's local "today".
pub async fn run(
  config: &CoachConfig,
  date: Option<NaiveDate>,
  dry_run: bool,
) -> Result<CoachReport, CoachError> {
  let today = date.unwrap_or_else(|| local_today(Utc::now(), config.utc_offset()));
  info!(%today, athlete = %config.athlete_id, dry_run, "starting daily coach");

  let coach = DailyCoach::new(
    MetricResolver::new(IntervalsClient::from_config(config)),
    IntensityPolicy::default(),
    GeminiClient::from_config(config),
    IntervalsClient::from_config(config),
    Schedule::from_config(config),
  );

  coach.run(today, dry_run).await
}
