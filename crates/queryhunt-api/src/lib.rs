//! JSON REST API for QueryHunt.
//!
//! Exposes an axum [`Router`] driving a [`Game`] over any
//! [`SandboxStore`] and narrator pair. TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(queryhunt_api::api_router(state))
//! ```

pub mod error;
pub mod game;
pub mod player;
pub mod schema;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use queryhunt_core::{
  narrator::{HintService, StoryWorkflow},
  store::SandboxStore,
};
use queryhunt_game::Game;

pub use error::ApiError;
pub use player::{IdentityConfig, Player};

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S, W, H> {
  pub game:     Arc<Game<S, W, H>>,
  pub identity: Arc<IdentityConfig>,
}

impl<S, W, H> Clone for AppState<S, W, H> {
  fn clone(&self) -> Self {
    Self { game: self.game.clone(), identity: self.identity.clone() }
  }
}

impl<S, W, H> AppState<S, W, H> {
  pub fn new(game: Game<S, W, H>, identity: IdentityConfig) -> Self {
    Self { game: Arc::new(game), identity: Arc::new(identity) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S, W, H>(state: AppState<S, W, H>) -> Router<()>
where
  S: SandboxStore + 'static,
  W: StoryWorkflow + 'static,
  H: HintService + 'static,
{
  Router::new()
    // Game turns
    .route("/game", post(game::start::<S, W, H>).get(game::view::<S, W, H>))
    .route("/game/query", post(game::query::<S, W, H>))
    .route("/game/hint", post(game::hint::<S, W, H>))
    .route("/game/accuse", post(game::accuse::<S, W, H>))
    // Reference
    .route("/schema", get(schema::handler))
    .with_state(state)
}
