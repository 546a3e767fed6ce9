//! Workout text normalizer
//!
//! Turns free-form generated text into a `WorkoutScript` in a single forward
//! pass. Each line is classified on its own, then folded through a small state
//! machine (`BeforeSection` -> `InSection`, with `AfterStatus` once the trailer
//! has been captured). Nothing is backtracked; blank lines from the input are
//! never trusted and separators are regenerated on output.

use thiserror::Error;

use crate::models::script::is_repeat_token;
use crate::models::{Section, SectionHeader, Step, WorkoutScript};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("generated text contained no valid workout steps")]
pub struct EmptyScriptError;

/// ---------------------------------------------------------------------------
/// Line Classification
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
  Blank,
  Status(String),
  Header(SectionHeader),
  /// "Main Set" style header, never emitted
  MainSetMarker,
  /// `3x` loop header, never emitted
  RepeatMarker,
  /// Dash-prefixed candidate step (leading dash repaired if it was missing)
  StepCandidate(String),
  Other,
}

pub fn classify(raw: &str) -> LineKind {
  let line = raw.trim();
  let lower = line.to_lowercase();

  if line.is_empty() {
    return LineKind::Blank;
  }
  if lower.starts_with("status:") {
    return LineKind::Status(line.to_string());
  }
  if let Some(header) = SectionHeader::from_line_prefix(line) {
    return LineKind::Header(header);
  }
  if lower.contains("main set") {
    return LineKind::MainSetMarker;
  }
  if is_repeat_marker(line) {
    return LineKind::RepeatMarker;
  }
  if line.starts_with(|c: char| c.is_ascii_digit()) {
    return LineKind::StepCandidate(format!("- {}", line));
  }
  if line.starts_with('-') {
    return LineKind::StepCandidate(line.to_string());
  }
  LineKind::Other
}

/// Any token, after an optional leading dash, is a repeat count such as
/// `3x` or `2x30s`
fn is_repeat_marker(line: &str) -> bool {
  line
    .trim_start_matches('-')
    .split_whitespace()
    .any(is_repeat_token)
}

/// ---------------------------------------------------------------------------
/// State Machine
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
  BeforeSection,
  InSection,
  /// Trailer captured; later status lines are dropped, steps still land
  /// in the open section
  AfterStatus,
}

/// A line that did not make it into the script, with its classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscardedLine {
  pub line: String,
  pub reason: &'static str,
}

#[derive(Debug, Clone)]
struct Machine {
  state: State,
  sections: Vec<Section>,
  status_line: Option<String>,
  discarded: Vec<DiscardedLine>,
}

impl Machine {
  fn new() -> Self {
    Self {
      state: State::BeforeSection,
      sections: Vec::new(),
      status_line: None,
      discarded: Vec::new(),
    }
  }

  fn discard(mut self, line: &str, reason: &'static str) -> Self {
    self.discarded.push(DiscardedLine {
      line: line.trim().to_string(),
      reason,
    });
    self
  }

  fn open(mut self, header: Option<SectionHeader>) -> Self {
    self.sections.push(Section::new(header));
    if self.state == State::BeforeSection {
      self.state = State::InSection;
    }
    self
  }

  fn feed(self, raw: &str) -> Self {
    match (self.state, classify(raw)) {
      (_, LineKind::Blank) => self,

      (State::AfterStatus, LineKind::Status(_)) => self.discard(raw, "duplicate status line"),
      (_, LineKind::Status(line)) => {
        let mut next = self;
        next.status_line = Some(line);
        next.state = State::AfterStatus;
        next
      }

      (_, LineKind::Header(header)) => self.open(Some(header)),

      // Leaves a titled section so the following steps form the main block
      (_, LineKind::MainSetMarker) => {
        let titled = self.sections.last().is_some_and(|s| s.header.is_some());
        let next = self.discard(raw, "main set header");
        if titled {
          next.open(None)
        } else {
          next
        }
      }

      (_, LineKind::RepeatMarker) => self.discard(raw, "repeat header"),

      (_, LineKind::StepCandidate(line)) => {
        let mut next = if self.sections.is_empty() {
          self.open(None)
        } else {
          self
        };
        let in_ramp_section = next.sections.last().is_some_and(Section::allows_ramps);
        match Step::parse(&line, in_ramp_section) {
          Some(step) => {
            if let Some(section) = next.sections.last_mut() {
              section.steps.push(step);
            }
            next
          }
          None => next.discard(raw, "step without duration or intensity"),
        }
      }

      (_, LineKind::Other) => self.discard(raw, "free text"),
    }
  }

  fn finish(self) -> Result<(WorkoutScript, Vec<DiscardedLine>), EmptyScriptError> {
    let sections: Vec<Section> = self
      .sections
      .into_iter()
      .filter(|s| !s.steps.is_empty())
      .collect();

    if sections.is_empty() {
      return Err(EmptyScriptError);
    }

    Ok((
      WorkoutScript {
        sections,
        status_line: self.status_line,
      },
      self.discarded,
    ))
  }
}

/// ---------------------------------------------------------------------------
/// Public API
/// ---------------------------------------------------------------------------

/// Normalize generated text, also returning every dropped line
pub fn normalize_with_discards(
  raw: &str,
) -> Result<(WorkoutScript, Vec<DiscardedLine>), EmptyScriptError> {
  raw.lines().fold(Machine::new(), Machine::feed).finish()
}

pub fn normalize(raw: &str) -> Result<WorkoutScript, EmptyScriptError> {
  normalize_with_discards(raw).map(|(script, _)| script)
}

#[cfg(test)]
mod tests {
  use super::*;

  const MESSY: &str = "Warmup\n10m ramp 40-60%\n\n5m z2\nMain Set\n3x\n- 5m z4\nCooldown\n5m ramp z2-z1\nStatus: FTP 200W";

  #[test]
  fn test_repairs_messy_generator_output() {
    let script = normalize(MESSY).unwrap();

    assert_eq!(
      script.to_text(),
      "Warmup\n- 10m ramp 40-60%\n- 5m z2\n- 5m z4\n\nCooldown\n- 5m ramp z2-z1\n\nStatus: FTP 200W"
    );
  }

  #[test]
  fn test_messy_output_structure() {
    let (script, discarded) = normalize_with_discards(MESSY).unwrap();

    let headers: Vec<Option<SectionHeader>> = script.sections.iter().map(|s| s.header).collect();
    assert_eq!(
      headers,
      vec![Some(SectionHeader::Warmup), None, Some(SectionHeader::Cooldown)]
    );
    assert!(script.sections[0].steps[0].is_ramp);
    assert!(!script.sections[0].steps[1].is_ramp);
    assert!(script.sections[2].steps[0].is_ramp);

    let reasons: Vec<&str> = discarded.iter().map(|d| d.reason).collect();
    assert_eq!(reasons, vec!["main set header", "repeat header"]);
  }

  #[test]
  fn test_idempotent_on_normalized_text() {
    let once = normalize(MESSY).unwrap().to_text();
    let twice = normalize(&once).unwrap().to_text();
    assert_eq!(once, twice);
  }

  #[test]
  fn test_no_step_lines_is_error() {
    let text = "Here is your workout!\nWarmup\nEnjoy the ride.\nStatus: FTP 200W";
    assert_eq!(normalize(text), Err(EmptyScriptError));
    assert_eq!(normalize(""), Err(EmptyScriptError));
  }

  #[test]
  fn test_first_status_line_wins() {
    let text = "- 10m z2\nstatus: first\n- 5m z1\nStatus: second";
    let (script, discarded) = normalize_with_discards(text).unwrap();

    assert_eq!(script.status_line.as_deref(), Some("status: first"));
    assert_eq!(script.step_count(), 2);
    assert_eq!(discarded[0].reason, "duplicate status line");
    assert!(script.to_text().ends_with("- 5m z1\n\nstatus: first"));
  }

  #[test]
  fn test_steps_before_any_header_form_main_block() {
    let text = "- 20m 88-94%\n- 5m z1\nCooldown\n- 10m ramp 60-40%";
    let script = normalize(text).unwrap();

    assert_eq!(script.sections[0].header, None);
    assert!(!script.sections[0].steps[0].is_ramp);
    assert_eq!(
      script.to_text(),
      "- 20m 88-94%\n- 5m z1\n\nCooldown\n- 10m ramp 60-40%"
    );
  }

  #[test]
  fn test_header_text_is_canonicalised() {
    let script = normalize("WARMUP (easy spin)\n- 10m z1").unwrap();
    assert_eq!(script.to_text(), "Warmup\n- 10m z1");
  }

  #[test]
  fn test_intro_and_outro_dropped() {
    let text = "Sure! Here's a workout:\n```\nWarmup\n- 10m ramp z1-z2\n```\nHave fun!";
    let script = normalize(text).unwrap();
    assert_eq!(script.to_text(), "Warmup\n- 10m ramp z1-z2");
  }

  #[test]
  fn test_repeat_marker_with_trailing_text_dropped() {
    assert_eq!(classify("3x"), LineKind::RepeatMarker);
    assert_eq!(classify("4X 5m z4"), LineKind::RepeatMarker);
    assert_eq!(
      classify("30s 120%"),
      LineKind::StepCandidate("- 30s 120%".to_string())
    );
  }

  #[test]
  fn test_dash_lines_with_repeat_counts_dropped() {
    assert_eq!(classify("- 3x 5m z4"), LineKind::RepeatMarker);
    assert_eq!(classify("-3x"), LineKind::RepeatMarker);
    assert_eq!(classify("2x30s 120%"), LineKind::RepeatMarker);

    let (script, discarded) = normalize_with_discards("- 3x 5m z4\n- 5m z2").unwrap();
    assert_eq!(script.to_text(), "- 5m z2");
    assert_eq!(discarded[0].line, "- 3x 5m z4");
    assert_eq!(discarded[0].reason, "repeat header");
  }

  #[test]
  fn test_oversized_duration_is_discarded() {
    let (script, discarded) =
      normalize_with_discards("- 9999999999999999h z2\n- 10m z1").unwrap();
    assert_eq!(script.step_count(), 1);
    assert_eq!(script.total_seconds(), 600);
    assert_eq!(discarded[0].reason, "step without duration or intensity");
    assert_eq!(normalize("- 9999999999999999h z2"), Err(EmptyScriptError));
  }

  #[test]
  fn test_classify_order() {
    assert_eq!(classify("  "), LineKind::Blank);
    assert_eq!(
      classify("STATUS: FTP 200W"),
      LineKind::Status("STATUS: FTP 200W".to_string())
    );
    assert_eq!(classify("Cooldown"), LineKind::Header(SectionHeader::Cooldown));
    assert_eq!(classify("** Main Set **"), LineKind::MainSetMarker);
    assert_eq!(classify("Intervals:"), LineKind::Other);
  }

  #[test]
  fn test_dash_line_without_tokens_dropped() {
    let (script, discarded) = normalize_with_discards("- 10m z2\n- spin easy").unwrap();
    assert_eq!(script.step_count(), 1);
    assert_eq!(discarded[0].line, "- spin easy");
  }

  #[test]
  fn test_blank_lines_are_regenerated() {
    let text = "\n\nWarmup\n\n\n- 10m z1\n\n\n\n- 20m 90%\n\n\nCooldown\n- 5m z1\n\n";
    let script = normalize(text).unwrap();
    assert_eq!(
      script.to_text(),
      "Warmup\n- 10m z1\n- 20m 90%\n\nCooldown\n- 5m z1"
    );
  }
}
