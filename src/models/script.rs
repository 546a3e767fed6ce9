//! Workout script types for the intervals.icu workout text format
//!
//! A script is a list of sections (Warmup, untitled main block, Cooldown),
//! each holding dash-prefixed step lines, plus an optional `Status:` trailer.

use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Sections
/// ---------------------------------------------------------------------------

/// The only header lines the output format permits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionHeader {
  Warmup,
  Cooldown,
}

impl SectionHeader {
  pub fn as_str(&self) -> &'static str {
    match self {
      SectionHeader::Warmup => "Warmup",
      SectionHeader::Cooldown => "Cooldown",
    }
  }

  /// Case-insensitive prefix match, e.g. "WARMUP (10 min)" -> Warmup
  pub fn from_line_prefix(line: &str) -> Option<Self> {
    let lower = line.to_lowercase();
    [SectionHeader::Warmup, SectionHeader::Cooldown]
      .into_iter()
      .find(|h| lower.starts_with(&h.as_str().to_lowercase()))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
  /// None for the untitled main block
  pub header: Option<SectionHeader>,
  pub steps: Vec<Step>,
}

impl Section {
  pub fn new(header: Option<SectionHeader>) -> Self {
    Self {
      header,
      steps: Vec::new(),
    }
  }

  pub fn allows_ramps(&self) -> bool {
    self.header.is_some()
  }
}

/// ---------------------------------------------------------------------------
/// Steps
/// ---------------------------------------------------------------------------

/// Most digits accepted in one duration component (`9999m` is plenty)
const MAX_DURATION_DIGITS: usize = 4;

/// Duration such as `10m`, `5m30s`, `1h`, `45s`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationToken(String);

impl DurationToken {
  pub fn parse(token: &str) -> Option<Self> {
    let mut rest = token;
    let mut last_unit = 0;
    let mut matched = false;

    while !rest.is_empty() {
      let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
      if digits == 0 || digits > MAX_DURATION_DIGITS {
        return None;
      }
      let unit = rest[digits..].chars().next()?;
      // Units must appear in h, m, s order, each at most once
      let rank = match unit {
        'h' => 1,
        'm' => 2,
        's' => 3,
        _ => return None,
      };
      if rank <= last_unit {
        return None;
      }
      last_unit = rank;
      matched = true;
      rest = &rest[digits + 1..];
    }

    matched.then(|| Self(token.to_string()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn total_seconds(&self) -> i64 {
    let mut total: i64 = 0;
    let mut value: i64 = 0;
    for c in self.0.chars() {
      match c {
        '0'..='9' => {
          value = value
            .saturating_mul(10)
            .saturating_add(c.to_digit(10).unwrap_or(0) as i64)
        }
        'h' => {
          total = value.saturating_mul(3600).saturating_add(total);
          value = 0;
        }
        'm' => {
          total = value.saturating_mul(60).saturating_add(total);
          value = 0;
        }
        's' => {
          total = value.saturating_add(total);
          value = 0;
        }
        _ => {}
      }
    }
    total
  }
}

/// Step target: percentage of FTP, power zone, absolute watts or freeride.
/// `high` is set only for ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntensityToken {
  Percent { low: u32, high: Option<u32> },
  Zone { low: u8, high: Option<u8> },
  Watts { low: u32, high: Option<u32> },
  FreeRide,
}

impl IntensityToken {
  pub fn parse(token: &str) -> Option<Self> {
    let lower = token.to_lowercase();

    if lower == "freeride" {
      return Some(IntensityToken::FreeRide);
    }

    if let Some(body) = lower.strip_suffix('%') {
      let (low, high) = parse_range(body, |s| s.strip_suffix('%').unwrap_or(s).parse::<u32>().ok())?;
      return Some(IntensityToken::Percent { low, high });
    }

    if let Some(body) = lower.strip_suffix('w') {
      let (low, high) = parse_range(body, |s| s.strip_suffix('w').unwrap_or(s).parse::<u32>().ok())?;
      return Some(IntensityToken::Watts { low, high });
    }

    if lower.starts_with('z') {
      let zone = |s: &str| -> Option<u8> {
        let n: u8 = s.strip_prefix('z')?.parse().ok()?;
        (1..=5).contains(&n).then_some(n)
      };
      let (low, high) = parse_range(&lower, zone)?;
      return Some(IntensityToken::Zone { low, high });
    }

    None
  }

  pub fn is_range(&self) -> bool {
    match self {
      IntensityToken::Percent { high, .. } | IntensityToken::Watts { high, .. } => high.is_some(),
      IntensityToken::Zone { high, .. } => high.is_some(),
      IntensityToken::FreeRide => false,
    }
  }
}

/// Token that starts with a repeat count: `3x`, `2x30s`, `4X`
pub fn is_repeat_token(token: &str) -> bool {
  let digits = token.chars().take_while(|c| c.is_ascii_digit()).count();
  digits > 0 && matches!(token[digits..].chars().next(), Some('x' | 'X'))
}

/// Split `a-b` (or a single `a`) and parse each side
fn parse_range<T>(body: &str, parse: impl Fn(&str) -> Option<T>) -> Option<(T, Option<T>)> {
  match body.split_once('-') {
    Some((low, high)) => Some((parse(low)?, Some(parse(high)?))),
    None => Some((parse(body)?, None)),
  }
}

/// A single `- <duration> [ramp] <intensity> [label]` line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
  /// The line as accepted, always starting with `-`
  pub line: String,
  pub duration: DurationToken,
  pub intensity: IntensityToken,
  /// Range target inside a Warmup/Cooldown section
  pub is_ramp: bool,
  pub label: String,
}

impl Step {
  /// Parse a dash-prefixed line. Returns None when the line lacks either a
  /// duration or an intensity token, or carries a repeat count.
  pub fn parse(line: &str, in_ramp_section: bool) -> Option<Self> {
    let body = line.strip_prefix('-')?;
    if body.split_whitespace().any(is_repeat_token) {
      return None;
    }

    let mut duration = None;
    let mut intensity = None;
    let mut label = Vec::new();

    for token in body.split_whitespace() {
      if duration.is_none() {
        if let Some(d) = DurationToken::parse(token) {
          duration = Some(d);
          continue;
        }
      }
      if intensity.is_none() {
        if let Some(i) = IntensityToken::parse(token) {
          intensity = Some(i);
          continue;
        }
      }
      if token.eq_ignore_ascii_case("ramp") {
        continue;
      }
      label.push(token);
    }

    let intensity = intensity?;
    Some(Self {
      line: line.to_string(),
      duration: duration?,
      is_ramp: in_ramp_section && intensity.is_range(),
      intensity,
      label: label.join(" "),
    })
  }
}

/// ---------------------------------------------------------------------------
/// Script
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutScript {
  pub sections: Vec<Section>,
  pub status_line: Option<String>,
}

impl WorkoutScript {
  pub fn step_count(&self) -> usize {
    self.sections.iter().map(|s| s.steps.len()).sum()
  }

  pub fn total_seconds(&self) -> i64 {
    self
      .sections
      .iter()
      .flat_map(|s| &s.steps)
      .map(|step| step.duration.total_seconds())
      .fold(0, i64::saturating_add)
  }

  /// Attach a trailer only if the generator did not supply one
  pub fn with_default_status(mut self, status_line: String) -> Self {
    if self.status_line.is_none() {
      self.status_line = Some(status_line);
    }
    self
  }

  /// Output lines: one blank line before every header except in first
  /// position, steps as received, then a blank line and the status trailer.
  pub fn lines(&self) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();

    for section in &self.sections {
      if let Some(header) = section.header {
        if !out.is_empty() {
          out.push(String::new());
        }
        out.push(header.as_str().to_string());
      }
      out.extend(section.steps.iter().map(|s| s.line.clone()));
    }

    if let Some(status) = &self.status_line {
      out.push(String::new());
      out.push(status.clone());
    }

    out
  }

  pub fn to_text(&self) -> String {
    self.lines().join("\n")
  }
}

impl std::fmt::Display for WorkoutScript {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.to_text())
  }
}
