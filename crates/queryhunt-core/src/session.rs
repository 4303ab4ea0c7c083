//! Player sessions and their lifecycle.
//!
//! ```text
//! NoSession ──start──▶ Provisioning ──story loaded──▶ Active ──correct accusation──▶ Completed
//!                           ▲                          │  ▲
//!                           └───────── start ──────────┘  └── query / hint / wrong accusation
//! ```
//!
//! A [`PlayerSession`] only exists from `Provisioning` onwards; `NoSession`
//! is the absence of a record and is reported as such by higher layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, SchemaName};

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
  NoSession,
  Provisioning,
  Active,
  Completed,
}

// ─── Session record ──────────────────────────────────────────────────────────

/// One player's in-progress (or just finished) game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSession {
  /// Fresh for every game started, even when the schema is recycled.
  pub game_id:       Uuid,
  pub schema:        SchemaName,
  pub state:         SessionState,
  pub story:         Option<String>,
  /// Every query that passed validation, whether or not it executed cleanly.
  pub queries:       Vec<String>,
  pub hints:         Vec<String>,
  pub accusations:   Vec<String>,
  pub started_at:    Option<DateTime<Utc>>,
  pub ended_at:      Option<DateTime<Utc>>,
  pub last_activity: DateTime<Utc>,
}

impl PlayerSession {
  /// A new session for `schema`, waiting for its sandbox to be provisioned.
  pub fn provisioning(schema: SchemaName, now: DateTime<Utc>) -> Self {
    Self {
      game_id: Uuid::new_v4(),
      schema,
      state: SessionState::Provisioning,
      story: None,
      queries: Vec::new(),
      hints: Vec::new(),
      accusations: Vec::new(),
      started_at: None,
      ended_at: None,
      last_activity: now,
    }
  }

  fn transition(&mut self, to: SessionState) -> Result<()> {
    let allowed = matches!(
      (self.state, to),
      (SessionState::Provisioning, SessionState::Active)
        | (SessionState::Active, SessionState::Completed)
    );
    if !allowed {
      return Err(Error::InvalidTransition { from: self.state, to });
    }
    self.state = to;
    Ok(())
  }

  /// The sandbox is populated: start the clock.
  pub fn activate(&mut self, story: String, now: DateTime<Utc>) -> Result<()> {
    self.transition(SessionState::Active)?;
    self.story = Some(story);
    self.started_at = Some(now);
    self.last_activity = now;
    Ok(())
  }

  /// Stop the clock and return the elapsed whole seconds.
  pub fn complete(&mut self, now: DateTime<Utc>) -> Result<i64> {
    self.transition(SessionState::Completed)?;
    self.ended_at = Some(now);
    self.last_activity = now;
    Ok(self.elapsed_secs().unwrap_or_default())
  }

  pub fn record_query(&mut self, raw: &str, now: DateTime<Utc>) {
    self.queries.push(raw.to_owned());
    self.last_activity = now;
  }

  pub fn record_hint(&mut self, hint: String, now: DateTime<Utc>) {
    self.hints.push(hint);
    self.last_activity = now;
  }

  pub fn record_accusation(&mut self, attempt: &str, now: DateTime<Utc>) {
    self.accusations.push(attempt.to_owned());
    self.last_activity = now;
  }

  /// Seconds between start and end, truncated. `None` until completed.
  pub fn elapsed_secs(&self) -> Option<i64> {
    let (start, end) = (self.started_at?, self.ended_at?);
    Some((end - start).num_seconds().max(0))
  }

  pub fn is_active(&self) -> bool { self.state == SessionState::Active }

  /// Whether the session has seen no activity since `cutoff`.
  pub fn idle_since(&self, cutoff: DateTime<Utc>) -> bool { self.last_activity < cutoff }
}

// ─── Accusations ─────────────────────────────────────────────────────────────

/// Exact, case-sensitive comparison after trimming surrounding whitespace.
pub fn accusation_matches(attempt: &str, ground_truth: &str) -> bool {
  attempt.trim() == ground_truth.trim()
}

/// Render whole seconds as `m:ss`.
pub fn format_elapsed(secs: i64) -> String {
  let secs = secs.max(0);
  format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  fn session() -> PlayerSession {
    PlayerSession::provisioning(SchemaName::parse("userA").unwrap(), Utc::now())
  }

  #[test]
  fn accusation_trims_but_respects_case() {
    assert!(accusation_matches("  Jane Doe  ", "Jane Doe"));
    assert!(accusation_matches("Jane Doe\n", "Jane Doe"));
    assert!(!accusation_matches("jane doe", "Jane Doe"));
    assert!(!accusation_matches("Jane  Doe", "Jane Doe"));
    assert!(!accusation_matches("Jane", "Jane Doe"));
  }

  #[test]
  fn lifecycle_runs_forward_only() {
    let mut s = session();
    let t0 = Utc::now();
    assert!(matches!(
      s.complete(t0),
      Err(Error::InvalidTransition { from: SessionState::Provisioning, .. })
    ));

    s.activate("A body in the library.".into(), t0).unwrap();
    assert!(s.is_active());
    assert!(s.activate("again".into(), t0).is_err());

    let elapsed = s.complete(t0 + Duration::seconds(125)).unwrap();
    assert_eq!(elapsed, 125);
    assert_eq!(s.state, SessionState::Completed);
    assert!(s.complete(t0).is_err());
  }

  #[test]
  fn elapsed_truncates_to_whole_seconds() {
    let mut s = session();
    let t0 = Utc::now();
    s.activate("story".into(), t0).unwrap();
    assert_eq!(s.elapsed_secs(), None);
    s.complete(t0 + Duration::milliseconds(61_999)).unwrap();
    assert_eq!(s.elapsed_secs(), Some(61));
  }

  #[test]
  fn histories_touch_last_activity() {
    let mut s = session();
    let later = s.last_activity + Duration::minutes(5);
    s.record_query("SELECT 1", later);
    assert_eq!(s.queries, vec!["SELECT 1".to_string()]);
    assert_eq!(s.last_activity, later);
    assert!(s.idle_since(later + Duration::seconds(1)));
    assert!(!s.idle_since(later));
  }

  #[test]
  fn formats_minutes_and_seconds() {
    assert_eq!(format_elapsed(0), "0:00");
    assert_eq!(format_elapsed(65), "1:05");
    assert_eq!(format_elapsed(3600), "60:00");
  }
}
