//! Error types for `queryhunt-core`.

use thiserror::Error;

use crate::session::SessionState;

#[derive(Debug, Error)]
pub enum Error {
  #[error("player identity {0:?} is not a valid schema name")]
  InvalidIdentity(String),

  #[error("query is not a single SELECT statement: {0}")]
  InvalidQuery(&'static str),

  #[error("maintenance statement contains destructive keyword {0}")]
  Destructive(&'static str),

  #[error("session cannot move from {from} to {to}")]
  InvalidTransition {
    from: SessionState,
    to:   SessionState,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
