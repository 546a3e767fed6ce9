use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use daily_coach_lib::config::CoachConfig;

#[derive(Parser)]
#[command(name = "daily-coach", about = "Generate and schedule today's cycling workout")]
struct Cli {
  /// Resolve, generate and normalize, but do not publish
  #[arg(long, env = "COACH_DRY_RUN")]
  dry_run: bool,

  /// Run for this date (YYYY-MM-DD) instead of local today
  #[arg(long)]
  date: Option<NaiveDate>,

  /// JSON log output, and print the run report as JSON
  #[arg(long)]
  json: bool,
}

fn init_tracing(json: bool) {
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("daily_coach=info"));
  let registry = tracing_subscriber::registry().with(filter);

  if json {
    registry.with(fmt::layer().json()).init();
  } else {
    registry.with(fmt::layer()).init();
  }
}

#[tokio::main]
async fn main() -> ExitCode {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let cli = Cli::parse();
  init_tracing(cli.json);

  let config = match CoachConfig::from_env() {
    Ok(config) => config,
    Err(e) => {
      error!(error = %e, "configuration error");
      return ExitCode::FAILURE;
    }
  };

  match daily_coach_lib::run(&config, cli.date, cli.dry_run).await {
    Ok(report) => {
      if cli.json {
        match serde_json::to_string_pretty(&report) {
          Ok(json) => println!("{}", json),
          Err(e) => {
            error!(error = %e, "failed to serialize report");
            return ExitCode::FAILURE;
          }
        }
      } else {
        println!("{}\n\n{}", report.workout_name, report.script);
      }
      ExitCode::SUCCESS
    }
    Err(e) => {
      error!(error = %e, "daily coach run failed");
      ExitCode::FAILURE
    }
  }
}
