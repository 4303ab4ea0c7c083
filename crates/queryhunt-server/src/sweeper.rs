//! Periodic expiry of idle sessions and orphaned sandboxes.
//!
//! Runs on a fixed `tokio::time::interval` until cancelled. A failed sweep is
//! logged and retried on the next tick.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use queryhunt_core::{
  narrator::{HintService, StoryWorkflow},
  store::SandboxStore,
};
use queryhunt_game::Game;
use tokio_util::sync::CancellationToken;

/// Run the sweep loop. Returns immediately when `ttl` is zero.
pub async fn run<S, W, H>(
  game: Arc<Game<S, W, H>>,
  ttl: Duration,
  every: Duration,
  cancel: CancellationToken,
) where
  S: SandboxStore,
  W: StoryWorkflow,
  H: HintService,
{
  if ttl.is_zero() {
    tracing::info!("session expiry disabled");
    return;
  }
  let Ok(ttl_chrono) = chrono::Duration::from_std(ttl) else {
    tracing::error!(ttl_secs = ttl.as_secs(), "session ttl out of range; expiry disabled");
    return;
  };

  tracing::info!(
    ttl_secs = ttl.as_secs(),
    interval_secs = every.as_secs(),
    "session expiry started"
  );

  let mut interval = tokio::time::interval(every.max(Duration::from_secs(1)));

  loop {
    tokio::select! {
      _ = cancel.cancelled() => {
        tracing::info!("session expiry stopping");
        break;
      }
      _ = interval.tick() => {
        if let Err(e) = game.sweep(Utc::now(), ttl_chrono).await {
          tracing::error!(error = %e, "session expiry: sweep failed");
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use queryhunt_core::SchemaName;

  use super::*;
  use crate::{ServerConfig, StoryConfig, build_state};

  async fn offline_game() -> Arc<crate::AppGame> {
    let config = ServerConfig {
      leaderboard_path: PathBuf::from(":memory:"),
      story: StoryConfig {
        fixture: Some(PathBuf::from(concat!(
          env!("CARGO_MANIFEST_DIR"),
          "/../../fixtures/blackwood-manor.toml"
        ))),
        ..StoryConfig::default()
      },
      ..ServerConfig::default()
    };
    build_state(&config).await.unwrap().game
  }

  #[tokio::test]
  async fn zero_ttl_returns_without_waiting() {
    let game = offline_game().await;
    // Never cancelled: only the zero ttl lets this finish.
    run(game, Duration::ZERO, Duration::from_secs(1), CancellationToken::new()).await;
  }

  #[tokio::test]
  async fn cancellation_stops_the_loop() {
    let game = offline_game().await;
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run(
      game,
      Duration::from_secs(60),
      Duration::from_secs(3600),
      cancel.clone(),
    ));
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
  }

  #[tokio::test]
  async fn first_tick_reclaims_expired_sandboxes() {
    let game = offline_game().await;
    let schema = SchemaName::parse("userA").unwrap();
    game.start(&schema).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let cancel = CancellationToken::new();
    let task = tokio::spawn(run(
      Arc::clone(&game),
      Duration::from_millis(1),
      Duration::from_secs(3600),
      cancel.clone(),
    ));

    // The interval fires immediately; give the sweep a moment to run.
    tokio::time::sleep(Duration::from_millis(200)).await;
    cancel.cancel();
    task.await.unwrap();

    assert!(game.view(&schema).await.is_none());
    assert!(!game.sandbox().store().schema_exists(&schema).await.unwrap());
  }
}
