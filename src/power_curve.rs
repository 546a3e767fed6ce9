//! Power-duration curve payloads and the five-minute bucket lookup
//!
//! intervals.icu exposes curves in two shapes: a JSON list of curves with
//! parallel `secs`/`watts` arrays, and a CSV export with one row per duration
//! and one column per curve. Both go through the same selection priority.

use serde::Deserialize;
use std::collections::HashMap;

/// Duration of the bucket we read, in seconds
pub const FIVE_MINUTES_SECS: i64 = 300;

/// ---------------------------------------------------------------------------
/// Payload Shapes
/// ---------------------------------------------------------------------------

/// One curve in the list-of-curves form
#[derive(Debug, Clone, Deserialize)]
pub struct PowerCurve {
  pub id: String,
  #[serde(default)]
  pub label: String,
  #[serde(default)]
  pub secs: Vec<i64>,
  #[serde(default)]
  pub watts: Vec<Option<f64>>,
}

impl PowerCurve {
  /// Wattage at `target` seconds, reading `secs` and `watts` as parallel arrays
  pub fn watts_at(&self, target: i64) -> Option<i64> {
    let idx = self.secs.iter().position(|&s| s == target)?;
    self
      .watts
      .get(idx)
      .copied()
      .flatten()
      .map(|w| w as i64)
  }
}

/// The JSON endpoint returns either a bare array or `{"list": [...]}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PowerCurveList {
  Bare(Vec<PowerCurve>),
  Wrapped { list: Vec<PowerCurve> },
}

impl PowerCurveList {
  pub fn into_curves(self) -> Vec<PowerCurve> {
    match self {
      PowerCurveList::Bare(curves) => curves,
      PowerCurveList::Wrapped { list } => list,
    }
  }
}

/// CSV form: a duration key column (`secs` or `Time`) plus one column per curve
#[derive(Debug, Clone, Default)]
pub struct PowerCurveTable {
  pub columns: Vec<String>,
  pub rows: Vec<HashMap<String, String>>,
}

const DURATION_KEYS: [&str; 2] = ["secs", "Time"];

impl PowerCurveTable {
  /// Parse a CSV export. Header names are trimmed and stripped of a BOM.
  pub fn from_csv(text: &str) -> Result<Self, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
      .flexible(true)
      .from_reader(text.as_bytes());

    let columns: Vec<String> = reader
      .headers()?
      .iter()
      .map(|h| h.replace('\u{feff}', "").trim().to_string())
      .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
      let record = record?;
      let row = columns
        .iter()
        .cloned()
        .zip(record.iter().map(|v| v.trim().to_string()))
        .collect();
      rows.push(row);
    }

    Ok(Self { columns, rows })
  }

  /// Curve columns, i.e. everything except the duration key
  pub fn curve_columns(&self) -> impl Iterator<Item = &String> {
    self
      .columns
      .iter()
      .filter(|c| !DURATION_KEYS.contains(&c.as_str()))
  }

  pub fn watts_at(&self, column: &str, target: i64) -> Option<i64> {
    let row = self.rows.iter().find(|row| {
      DURATION_KEYS
        .iter()
        .find_map(|k| row.get(*k).filter(|v| !v.is_empty()))
        .and_then(|v| v.parse::<f64>().ok())
        .is_some_and(|secs| secs == target as f64)
    })?;

    row
      .get(column)
      .filter(|v| !v.is_empty())
      .and_then(|v| v.parse::<f64>().ok())
      .map(|w| w as i64)
  }
}

#[derive(Debug, Clone)]
pub enum PowerCurvePayload {
  Curves(Vec<PowerCurve>),
  Table(PowerCurveTable),
}

/// ---------------------------------------------------------------------------
/// Curve Selection
/// ---------------------------------------------------------------------------

/// One entry of the curve priority list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveSelector {
  /// Rolling 42-day curve
  Days42,
  /// Current-ability ("currency") curve
  Currency,
  SeasonToDate,
  /// Whatever the source returned first
  First,
}

pub const DEFAULT_CURVE_PRIORITY: [CurveSelector; 4] = [
  CurveSelector::Days42,
  CurveSelector::Currency,
  CurveSelector::SeasonToDate,
  CurveSelector::First,
];

impl CurveSelector {
  /// Does a curve with this id/label satisfy the selector?
  pub fn matches(&self, id: &str, label: &str) -> bool {
    let id = id.to_lowercase();
    let label = label.to_lowercase();
    match self {
      CurveSelector::Days42 => is_42_day(&id) || is_42_day(&label),
      CurveSelector::Currency => {
        id.contains("currency") || label.contains("currency") || label.contains("current")
      }
      CurveSelector::SeasonToDate => id == "s0" || label.contains("season"),
      CurveSelector::First => true,
    }
  }
}

/// `42d` as a whole word, or `42` followed by `day`/`days`
fn is_42_day(text: &str) -> bool {
  let words: Vec<&str> = text
    .split(|c: char| !c.is_ascii_alphanumeric())
    .filter(|w| !w.is_empty())
    .collect();

  words.iter().any(|w| *w == "42d")
    || words
      .windows(2)
      .any(|pair| pair[0] == "42" && matches!(pair[1], "day" | "days"))
}

/// Result of a successful five-minute lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiveMinuteBest {
  pub watts: i64,
  /// Id or column name of the curve it came from
  pub curve: String,
  pub selector: CurveSelector,
}

impl PowerCurvePayload {
  /// Walk the priority list and return the first selected curve that has a
  /// 300-second bucket. None if no curve has one.
  pub fn five_minute_best(&self, priority: &[CurveSelector]) -> Option<FiveMinuteBest> {
    priority.iter().find_map(|selector| match self {
      PowerCurvePayload::Curves(curves) => {
        let curve = curves.iter().find(|c| selector.matches(&c.id, &c.label))?;
        curve.watts_at(FIVE_MINUTES_SECS).map(|watts| FiveMinuteBest {
          watts,
          curve: curve.id.clone(),
          selector: *selector,
        })
      }
      PowerCurvePayload::Table(table) => {
        let column = table.curve_columns().find(|c| selector.matches(c, c))?;
        table
          .watts_at(column, FIVE_MINUTES_SECS)
          .map(|watts| FiveMinuteBest {
            watts,
            curve: column.clone(),
            selector: *selector,
          })
      }
    })
  }
}
