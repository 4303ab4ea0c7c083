//! The game orchestration loop.
//!
//! [`Game`] owns the session registry and drives one player turn at a time:
//! start, query, hint and accuse. Each turn takes the player's slot lock for
//! its whole duration.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::TryStreamExt;
use queryhunt_core::{
  SchemaName, ValidatedQuery,
  narrator::{HintRequest, HintService, StoryWorkflow},
  session::{PlayerSession, SessionState, accusation_matches, format_elapsed},
  store::{QueryOutput, SandboxStore},
};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
  GameError, LeaderboardRecorder, Result, SandboxManager,
  error::WRONG_ACCUSATION_MESSAGE,
  registry::{SessionRegistry, Slot},
};

pub const DEFAULT_HINT_LANGUAGE: &str = "English";

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// A freshly started, populated game.
#[derive(Debug, Clone, Serialize)]
pub struct StartedGame {
  pub game_id: Uuid,
  pub schema:  SchemaName,
  pub story:   String,
}

/// Result of an accusation attempt.
#[derive(Debug, Clone, Serialize)]
pub struct Accusation {
  pub correct:      bool,
  pub message:      String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub elapsed_secs: Option<i64>,
  /// `m:ss`
  #[serde(skip_serializing_if = "Option::is_none")]
  pub elapsed:      Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub share:        Option<String>,
  /// Leaderboard name, absent if recording failed.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub username:     Option<String>,
}

impl Accusation {
  fn wrong() -> Self {
    Self {
      correct:      false,
      message:      WRONG_ACCUSATION_MESSAGE.to_owned(),
      elapsed_secs: None,
      elapsed:      None,
      share:        None,
      username:     None,
    }
  }

  fn solved(elapsed_secs: i64, username: Option<String>) -> Self {
    let elapsed = format_elapsed(elapsed_secs);
    Self {
      correct: true,
      message: format!(
        "Great job! You correctly identified the murderer and solved the QueryHunt game in \
         {elapsed} min!"
      ),
      elapsed_secs: Some(elapsed_secs),
      share: Some(format!("I solved the QueryHunt game in {elapsed} min.")),
      elapsed: Some(elapsed),
      username,
    }
  }
}

/// What one expiry sweep removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
  /// Idle sessions whose sandbox was dropped.
  pub expired: Vec<SchemaName>,
  /// Schemas present in the store that no live session owned.
  pub orphans: Vec<SchemaName>,
}

// ─── Game ────────────────────────────────────────────────────────────────────

pub struct Game<S, W, H> {
  sandbox:       SandboxManager<S>,
  recorder:      LeaderboardRecorder<S>,
  story:         W,
  hints:         H,
  sessions:      SessionRegistry,
  hint_language: String,
}

impl<S, W, H> Game<S, W, H>
where
  S: SandboxStore,
  W: StoryWorkflow,
  H: HintService,
{
  pub fn new(store: Arc<S>, story: W, hints: H) -> Self {
    Self {
      sandbox: SandboxManager::new(store.clone()),
      recorder: LeaderboardRecorder::new(store),
      story,
      hints,
      sessions: SessionRegistry::default(),
      hint_language: DEFAULT_HINT_LANGUAGE.to_owned(),
    }
  }

  /// Language hints are requested in.
  pub fn with_hint_language(mut self, language: impl Into<String>) -> Self {
    self.hint_language = language.into();
    self
  }

  pub fn sandbox(&self) -> &SandboxManager<S> { &self.sandbox }

  // ── Turns ─────────────────────────────────────────────────────────────────

  /// Start a new game for `schema`, recycling any sandbox left behind.
  ///
  /// On a generation failure the session stays in `Provisioning` and the
  /// player may simply start again.
  pub async fn start(&self, schema: &SchemaName) -> Result<StartedGame> {
    let slot = self.sessions.slot(schema);
    let mut guard = slot.lock().await;

    if let Some(previous) = guard.as_ref().filter(|s| s.state != SessionState::Completed) {
      debug!(%schema, game_id = %previous.game_id, "abandoning previous game");
    }
    let session = guard.insert(PlayerSession::provisioning(schema.clone(), Utc::now()));
    let game_id = session.game_id;

    self.sandbox.provision(schema).await?;

    let mystery = self.story.generate().await.map_err(|e| {
      error!(%schema, %game_id, error = %e, "story generation failed");
      GameError::Generation(e.to_string())
    })?;

    if let Err(e) = self.sandbox.load(schema, &mystery).await {
      error!(%schema, %game_id, error = %e, detail = e.detail(), "could not load mystery");
      return Err(e);
    }

    session.activate(mystery.story.clone(), Utc::now())?;
    info!(%schema, %game_id, "game started");

    Ok(StartedGame { game_id, schema: schema.clone(), story: mystery.story })
  }

  /// Validate and run a player query.
  ///
  /// Only queries that pass validation are kept in the history, whether or
  /// not the engine then accepts them.
  pub async fn query(&self, schema: &SchemaName, raw: &str) -> Result<QueryOutput> {
    let slot = self.active_slot(schema)?;
    let mut guard = slot.lock().await;
    let session = active(&mut guard)?;

    let query = ValidatedQuery::parse(raw).map_err(|e| {
      debug!(%schema, error = %e, "query rejected");
      GameError::InvalidQuery
    })?;
    session.record_query(query.raw(), Utc::now());

    self.sandbox.execute_query(schema, &query).await
  }

  /// Ask the hint service for a hint grounded in the story and histories.
  pub async fn hint(&self, schema: &SchemaName) -> Result<String> {
    let slot = self.active_slot(schema)?;
    let mut guard = slot.lock().await;
    let session = active(&mut guard)?;

    let request = HintRequest {
      story:    session.story.clone().unwrap_or_default(),
      queries:  session.queries.clone(),
      hints:    session.hints.clone(),
      language: self.hint_language.clone(),
    };

    let streamed: Result<String, H::Error> = async {
      let stream = self.hints.hint(request).await?;
      stream
        .try_fold(String::new(), |mut acc, fragment| async move {
          acc.push_str(&fragment);
          Ok(acc)
        })
        .await
    }
    .await;

    let hint = streamed.map_err(|e| {
      error!(%schema, error = %e, "hint retrieval failed");
      GameError::Generation(e.to_string())
    })?;

    session.record_hint(hint.clone(), Utc::now());
    Ok(hint)
  }

  /// Check an accusation against the ground truth.
  ///
  /// A correct one stops the clock, records a leaderboard entry and then
  /// drops the sandbox. Neither of the last two steps can fail the turn.
  pub async fn accuse(&self, schema: &SchemaName, name: &str) -> Result<Accusation> {
    let slot = self.active_slot(schema)?;
    let mut guard = slot.lock().await;
    let session = active(&mut guard)?;

    if name.trim().is_empty() {
      return Err(GameError::EmptyAccusation);
    }

    let truth = self.sandbox.ground_truth(schema).await?;
    let now = Utc::now();
    session.record_accusation(name, now);

    if !accusation_matches(name, &truth) {
      debug!(%schema, attempts = session.accusations.len(), "wrong accusation");
      return Ok(Accusation::wrong());
    }

    let elapsed_secs = session.complete(now)?;
    info!(%schema, game_id = %session.game_id, elapsed_secs, "game solved");

    let username = match self.recorder.record(elapsed_secs).await {
      Ok(entry) => Some(entry.username),
      Err(e) => {
        error!(%schema, error = %e, "failed to record leaderboard entry");
        None
      }
    };
    self.sandbox.teardown(schema).await;

    Ok(Accusation::solved(elapsed_secs, username))
  }

  /// A snapshot of the player's session, if any.
  pub async fn view(&self, schema: &SchemaName) -> Option<PlayerSession> {
    let slot = self.sessions.existing(schema)?;
    let guard = slot.lock().await;
    guard.clone()
  }

  // ── Expiry ────────────────────────────────────────────────────────────────

  /// Expire sessions idle for longer than `ttl` and drop sandboxes nobody
  /// owns. Sessions busy with a turn are left for the next sweep.
  pub async fn sweep(&self, now: DateTime<Utc>, ttl: Duration) -> Result<SweepReport> {
    let cutoff = now - ttl;
    let mut report = SweepReport::default();

    for (schema, slot) in self.sessions.entries() {
      let Ok(mut guard) = slot.try_lock() else {
        continue;
      };
      let Some(session) = guard.as_ref() else {
        self.sessions.release(&schema, &slot);
        continue;
      };
      if !session.idle_since(cutoff) {
        continue;
      }

      if session.state != SessionState::Completed {
        self.sandbox.teardown(&schema).await;
        report.expired.push(schema.clone());
      }
      *guard = None;
      self.sessions.release(&schema, &slot);
    }

    let present = self
      .sandbox
      .store()
      .list_schemas()
      .await
      .map_err(GameError::from_store)?;

    for schema in present {
      let slot = self.sessions.slot(&schema);
      let Ok(guard) = slot.try_lock() else {
        continue;
      };
      let owned = guard
        .as_ref()
        .is_some_and(|s| s.state != SessionState::Completed);
      if !owned && self.sandbox.teardown(&schema).await {
        report.orphans.push(schema.clone());
      }
      if guard.is_none() {
        self.sessions.release(&schema, &slot);
      }
    }

    if !report.expired.is_empty() || !report.orphans.is_empty() {
      warn!(
        expired = report.expired.len(),
        orphans = report.orphans.len(),
        "expired idle sandboxes"
      );
    }
    Ok(report)
  }

  fn active_slot(&self, schema: &SchemaName) -> Result<Slot> {
    self.sessions.existing(schema).ok_or(GameError::NotStarted)
  }

  #[cfg(test)]
  pub(crate) fn tracked_sessions(&self) -> usize { self.sessions.len() }
}

/// The session in `slot`, provided it is in a state that accepts turns.
fn active(slot: &mut Option<PlayerSession>) -> Result<&mut PlayerSession> {
  match slot.as_ref().map(|s| s.state) {
    Some(SessionState::Active) => slot.as_mut().ok_or(GameError::NotStarted),
    Some(SessionState::Completed) => Err(GameError::AlreadyCompleted),
    _ => Err(GameError::NotStarted),
  }
}
