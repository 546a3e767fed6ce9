//! Prompt assembly for the workout generator
//!
//! The generator only sees numbers and rules computed here; it never decides
//! the diagnosis itself, except for the qualitative HRV stress check.

use crate::models::{AthleteMetrics, Diagnosis, WorkoutDirective};

const WORKOUT_FORMAT: &str = include_str!("prompts/workout_format.txt");

/// Target session length in minutes
pub const SESSION_MINUTES: u32 = 60;

pub fn build_workout_prompt(metrics: &AthleteMetrics, directive: &WorkoutDirective) -> String {
  let mut prompt = String::new();

  prompt.push_str("Role: Expert Cycling Coach.\n");
  prompt.push_str(&format!(
    "Task: Create a {}-minute structured cycling workout for Intervals.icu.\n\n",
    SESSION_MINUTES
  ));

  prompt.push_str(&athlete_block(metrics));
  prompt.push('\n');
  prompt.push_str(&directive_block(metrics, directive));
  prompt.push('\n');
  prompt.push_str(&WORKOUT_FORMAT.replace("{status_line}", &metrics.status_line()));

  prompt
}

fn athlete_block(metrics: &AthleteMetrics) -> String {
  let five_min = if metrics.has_five_min_effort() {
    format!("{} W", metrics.five_min_watts)
  } else {
    "none on record".to_string()
  };

  let mut block = format!(
    "[ATHLETE DATA]\n\
     - FTP: {} W\n\
     - W': {} J\n\
     - CTL: {:.1}\n\
     - ATL: {:.1}\n\
     - TSB: {:.1}\n\
     - Recent 5m Max: {}\n",
    metrics.ftp_watts,
    metrics.w_prime_joules,
    metrics.ctl,
    metrics.atl,
    metrics.tsb(),
    five_min
  );

  if let Some(hrv) = &metrics.hrv {
    block.push_str(&format!(
      "- HRV: {:.1} ms ({}, measured {})\n",
      hrv.display_value(),
      hrv.kind.as_str(),
      hrv.sample_date
    ));
  }

  block
}

fn directive_block(metrics: &AthleteMetrics, directive: &WorkoutDirective) -> String {
  let mut block = format!(
    "[COACHING DECISION]\n\
     - Diagnosis: {}\n\
     - Intensity: {}\n",
    directive.diagnosis.label().to_uppercase(),
    directive.guidance.describe()
  );

  match directive.diagnosis {
    Diagnosis::Detrained => {
      block.push_str("- STRICTLY Zone 2. NO high intensity work of any kind.\n");
    }
    Diagnosis::Recovery => {
      block.push_str("- Recovery ride. Keep every step in Zone 1.\n");
    }
    Diagnosis::SweetSpot => {
      block.push_str(&format!(
        "- Sweet spot intervals ({} of {} W FTP) with easy recoveries.\n",
        directive.guidance.describe(),
        metrics.ftp_watts
      ));
    }
    Diagnosis::Vo2Max => {
      if let Some(ceiling) = directive.ceiling_watts() {
        block.push_str(&format!(
          "- VO2 max intervals at {} (based on the recent 5m max, NOT on FTP).\n",
          ceiling
        ));
      }
    }
  }

  if let Some(hrv) = &directive.high_stress_guard {
    block.push_str(&format!(
      "- HRV CHECK: {} {:.1} ms on {}. If, by general physiological principles, this \
       indicates unusually poor recovery, treat the day as HIGH STRESS: cap intensity \
       at Zone 2 / low sweet spot and do NOT prescribe VO2 max work.\n",
      hrv.kind.as_str(),
      hrv.display_value(),
      hrv.sample_date
    ));
  }

  block
}
