//! Error types for `queryhunt-narrator`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{service} answered {status}: {body}")]
  Status {
    service: &'static str,
    status:  u16,
    body:    String,
  },

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid mystery fixture: {0}")]
  Fixture(#[from] toml::de::Error),

  #[error("mystery has no population statements")]
  EmptyMystery,

  #[error("hint stream is not valid UTF-8")]
  Utf8,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
