//! Appends a record to the shared leaderboard when a game is solved.

use std::sync::Arc;

use chrono::Local;
use queryhunt_core::{
  leaderboard::{LeaderboardEntry, generate_username},
  store::SandboxStore,
};
use tracing::info;

use crate::{GameError, Result};

pub struct LeaderboardRecorder<S> {
  store: Arc<S>,
}

impl<S: SandboxStore> LeaderboardRecorder<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Insert one row under a freshly generated username, dated today.
  pub async fn record(&self, elapsed_secs: i64) -> Result<LeaderboardEntry> {
    let entry = LeaderboardEntry {
      username: generate_username(&mut rand::thread_rng()),
      date:     Local::now().date_naive(),
      time_sec: elapsed_secs,
    };

    self
      .store
      .insert_leaderboard_entry(&entry)
      .await
      .map_err(GameError::from_store)?;

    info!(username = %entry.username, elapsed_secs, "leaderboard entry recorded");
    Ok(entry)
  }
}
