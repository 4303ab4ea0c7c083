//! Player identity extractor.
//!
//! The identity is an opaque per-browser token taken from a configurable
//! header, falling back to a configured default. It is untrusted, so it is
//! sanitized into a [`SchemaName`] before any handler sees it.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, HeaderName, request::Parts},
};
use queryhunt_core::{
  SchemaName,
  narrator::{HintService, StoryWorkflow},
  store::SandboxStore,
};
use queryhunt_game::GameError;

use crate::{AppState, error::ApiError};

pub const DEFAULT_IDENTITY_HEADER: &str = "x-player-token";

/// Where player identities come from.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
  pub header:         HeaderName,
  /// Used when the request carries no identity header.
  pub default_player: Option<String>,
}

impl Default for IdentityConfig {
  fn default() -> Self {
    Self {
      header:         HeaderName::from_static(DEFAULT_IDENTITY_HEADER),
      default_player: None,
    }
  }
}

/// The sanitized schema name of the requesting player.
pub struct Player(pub SchemaName);

/// Resolve and sanitize the identity carried by `headers`.
pub fn identify(headers: &HeaderMap, config: &IdentityConfig) -> Result<SchemaName, ApiError> {
  let raw = match headers.get(&config.header) {
    Some(value) => value
      .to_str()
      .map_err(|_| GameError::InvalidIdentity(String::from_utf8_lossy(value.as_bytes()).into_owned()))?,
    None => config
      .default_player
      .as_deref()
      .ok_or_else(|| ApiError::MissingIdentity(config.header.to_string()))?,
  };
  Ok(SchemaName::parse(raw.trim()).map_err(GameError::from)?)
}

impl<S, W, H> FromRequestParts<AppState<S, W, H>> for Player
where
  S: SandboxStore + 'static,
  W: StoryWorkflow + 'static,
  H: HintService + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, W, H>,
  ) -> Result<Self, Self::Rejection> {
    identify(&parts.headers, &state.identity).map(Player)
  }
}
