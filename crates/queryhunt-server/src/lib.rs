//! HTTP server assembly for QueryHunt.
//!
//! Turns a [`ServerConfig`] into a running [`Game`] over SQLite sandboxes and
//! the configured narrators, and wraps the API router with health and
//! request tracing.

pub mod error;
pub mod sweeper;

pub use error::{Error, Result};

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{Router, http::HeaderName, routing::get};
use queryhunt_api::{AppState, IdentityConfig, api_router};
use queryhunt_game::{Game, game::DEFAULT_HINT_LANGUAGE};
use queryhunt_narrator::{
  FixtureStory,
  HintSource,
  HttpHintService,
  HttpStoryWorkflow,
  KnowledgeBaseHints,
  StorySource,
};
use queryhunt_store_sqlite::{Location, SqliteSandbox};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// The game as wired by this server.
pub type AppGame = Game<SqliteSandbox, StorySource, HintSource>;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// `QUERYHUNT_` environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  /// Directory holding one database per schema. Absent means in-memory.
  pub sandbox_dir:         Option<PathBuf>,
  pub leaderboard_path:    PathBuf,
  /// Identity used when a request carries no identity header.
  pub default_player:      Option<String>,
  pub identity_header:     String,
  /// Idle seconds before a sandbox is reclaimed. Zero disables expiry.
  pub session_ttl_secs:    u64,
  pub sweep_interval_secs: u64,
  pub hint_language:       String,
  pub story:               StoryConfig,
  pub hints:               HintConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                "127.0.0.1".to_string(),
      port:                8080,
      sandbox_dir:         None,
      leaderboard_path:    PathBuf::from("leaderboard.db"),
      default_player:      None,
      identity_header:     queryhunt_api::player::DEFAULT_IDENTITY_HEADER.to_string(),
      session_ttl_secs:    3600,
      sweep_interval_secs: 60,
      hint_language:       DEFAULT_HINT_LANGUAGE.to_string(),
      story:               StoryConfig::default(),
      hints:               HintConfig::default(),
    }
  }
}

/// Where mysteries come from. Exactly one of `url` or `fixture` is used;
/// `url` wins when both are set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoryConfig {
  pub url:          Option<String>,
  pub fixture:      Option<PathBuf>,
  pub timeout_secs: u64,
}

impl Default for StoryConfig {
  fn default() -> Self {
    Self { url: None, fixture: None, timeout_secs: 120 }
  }
}

/// Hint service endpoint. Absent `url` selects offline hints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HintConfig {
  pub url:          Option<String>,
  pub timeout_secs: u64,
}

impl Default for HintConfig {
  fn default() -> Self {
    Self { url: None, timeout_secs: 60 }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn session_ttl(&self) -> Duration { Duration::from_secs(self.session_ttl_secs) }

  pub fn sweep_interval(&self) -> Duration { Duration::from_secs(self.sweep_interval_secs) }

  pub fn identity(&self) -> Result<IdentityConfig> {
    let header = HeaderName::try_from(self.identity_header.as_str()).map_err(|e| {
      Error::Config(format!("identity_header {:?}: {e}", self.identity_header))
    })?;
    Ok(IdentityConfig { header, default_player: self.default_player.clone() })
  }
}

// ─── Assembly ─────────────────────────────────────────────────────────────────

/// Open the sandbox store described by `config`.
pub async fn open_store(config: &ServerConfig) -> Result<SqliteSandbox> {
  let location = match &config.sandbox_dir {
    Some(dir) => Location::Directory(dir.clone()),
    None => Location::Memory,
  };
  Ok(SqliteSandbox::open(location, &config.leaderboard_path).await?)
}

pub async fn story_source(config: &StoryConfig) -> Result<StorySource> {
  if let Some(url) = &config.url {
    let workflow = HttpStoryWorkflow::new(url, Duration::from_secs(config.timeout_secs))?;
    return Ok(StorySource::Http(workflow));
  }
  if let Some(path) = &config.fixture {
    return Ok(StorySource::Fixture(FixtureStory::load(path).await?));
  }
  Err(Error::Config("[story] needs either `url` or `fixture`".to_string()))
}

pub fn hint_source(config: &HintConfig) -> Result<HintSource> {
  match &config.url {
    Some(url) => {
      let service = HttpHintService::new(url, Duration::from_secs(config.timeout_secs))?;
      Ok(HintSource::Http(service))
    }
    None => Ok(HintSource::KnowledgeBase(KnowledgeBaseHints)),
  }
}

/// Build the full application state from configuration.
pub async fn build_state(
  config: &ServerConfig,
) -> Result<AppState<SqliteSandbox, StorySource, HintSource>> {
  let identity = config.identity()?;
  let store = open_store(config).await?;
  let story = story_source(&config.story).await?;
  let hints = hint_source(&config.hints)?;

  let game = Game::new(Arc::new(store), story, hints)
    .with_hint_language(config.hint_language.clone());
  Ok(AppState::new(game, identity))
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API plus `/health`, traced.
pub fn router(state: AppState<SqliteSandbox, StorySource, HintSource>) -> Router {
  Router::new()
    .route("/health", get(health))
    .merge(api_router(state))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str { "ok" }

// ─── Tests ────────────────────────────────────────────────────────────────────
