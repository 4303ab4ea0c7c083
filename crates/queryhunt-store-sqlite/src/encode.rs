//! Encoding and decoding helpers between Rust domain types and the values
//! stored in (or read from) SQLite.
//!
//! Dates are stored as `YYYY-MM-DD` text. Player query results are converted
//! to JSON scalars column by column.

use chrono::NaiveDate;
use queryhunt_core::leaderboard::LeaderboardEntry;
use rusqlite::types::ValueRef;

use crate::{Error, Result};

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Result cells ────────────────────────────────────────────────────────────

/// Convert one result cell into a JSON scalar.
///
/// Reals that JSON cannot represent (NaN, ±inf) become `null`. Text and blobs
/// are decoded lossily as UTF-8.
pub fn cell_to_json(value: ValueRef<'_>) -> serde_json::Value {
  match value {
    ValueRef::Null => serde_json::Value::Null,
    ValueRef::Integer(i) => i.into(),
    ValueRef::Real(f) => serde_json::Number::from_f64(f)
      .map(serde_json::Value::Number)
      .unwrap_or(serde_json::Value::Null),
    ValueRef::Text(t) | ValueRef::Blob(t) => {
      serde_json::Value::String(String::from_utf8_lossy(t).into_owned())
    }
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `Leaderboard` row.
pub struct RawLeaderboardEntry {
  pub username: Option<String>,
  pub date:     Option<String>,
  pub time_sec: Option<i64>,
}

impl RawLeaderboardEntry {
  pub fn into_entry(self) -> Result<LeaderboardEntry> {
    let date = self
      .date
      .as_deref()
      .ok_or_else(|| Error::DateParse("leaderboard row without a date".into()))
      .and_then(decode_date)?;

    Ok(LeaderboardEntry {
      username: self.username.unwrap_or_default(),
      date,
      time_sec: self.time_sec.unwrap_or_default(),
    })
  }
}
