//! Errors raised while assembling the server from its configuration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid configuration: {0}")]
  Config(String),

  #[error("store error: {0}")]
  Store(#[from] queryhunt_store_sqlite::Error),

  #[error("narrator error: {0}")]
  Narrator(#[from] queryhunt_narrator::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
