//! Error type for the game loop.
//!
//! Every variant is scoped to one player's turn. The `Display` text of each
//! variant is what the player sees; underlying detail for generation and
//! store failures is kept on the value for logging only.

use queryhunt_core::{
  session::SessionState,
  store::{SandboxError, SandboxErrorKind},
};
use thiserror::Error;

pub const INVALID_QUERY_MESSAGE: &str =
  "Wrong query syntax or non-Select statement. Please provide a valid SQL query.";
pub const WRONG_ACCUSATION_MESSAGE: &str = "Not exactly...try again!";
pub const GENERATION_FAILED_MESSAGE: &str = "Oops...something went wrong. Please try again!";

#[derive(Debug, Error)]
pub enum GameError {
  #[error("player identity {0:?} is not usable as a schema name")]
  InvalidIdentity(String),

  /// The submission is not a single SELECT statement.
  #[error("{}", INVALID_QUERY_MESSAGE)]
  InvalidQuery,

  /// The engine rejected a validated query. The message is the engine's own.
  #[error("{0}")]
  Execution(String),

  /// The story or hint collaborator failed, or produced an unusable mystery.
  #[error("{}", GENERATION_FAILED_MESSAGE)]
  Generation(String),

  #[error("no game in progress; start a new game first")]
  NotStarted,

  #[error("this game is already solved; start a new game")]
  AlreadyCompleted,

  #[error("an accusation needs a name")]
  EmptyAccusation,

  #[error("storage error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl GameError {
  /// Classify a store error: engine rejections are shown to the player,
  /// everything else is an internal failure.
  pub fn from_store<E: SandboxError>(err: E) -> Self {
    match err.kind() {
      SandboxErrorKind::Execution => GameError::Execution(err.to_string()),
      _ => GameError::Store(Box::new(err)),
    }
  }

  /// Detail to log alongside the player-facing message.
  pub fn detail(&self) -> Option<&str> {
    match self {
      GameError::Generation(detail) => Some(detail),
      _ => None,
    }
  }
}

impl From<queryhunt_core::Error> for GameError {
  fn from(err: queryhunt_core::Error) -> Self {
    use queryhunt_core::Error as E;
    match err {
      E::InvalidIdentity(raw) => GameError::InvalidIdentity(raw),
      E::InvalidQuery(_) => GameError::InvalidQuery,
      E::Destructive(keyword) => {
        GameError::Generation(format!("population statement contains {keyword}"))
      }
      E::InvalidTransition { from: SessionState::Completed, .. } => GameError::AlreadyCompleted,
      E::InvalidTransition { .. } => GameError::NotStarted,
    }
  }
}

pub type Result<T, E = GameError> = std::result::Result<T, E>;
