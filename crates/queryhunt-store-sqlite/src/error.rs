//! Error type for `queryhunt-store-sqlite`.

use std::path::PathBuf;

use queryhunt_core::{
  SchemaName,
  store::{SandboxError, SandboxErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("schema {0} already exists")]
  SchemaExists(SchemaName),

  #[error("schema {0} does not exist")]
  UnknownSchema(SchemaName),

  /// The engine rejected player SQL; the message comes straight from SQLite.
  #[error("{0}")]
  Execution(String),

  #[error("date parse error: {0}")]
  DateParse(String),

  #[error("schema {schema} clashes with existing sandbox {other}")]
  NameClash { schema: SchemaName, other: String },

  #[error("leaderboard {0:?} sits in the sandbox directory and would be read as a schema")]
  LeaderboardInSandboxDir(PathBuf),
}

impl SandboxError for Error {
  fn kind(&self) -> SandboxErrorKind {
    match self {
      Error::SchemaExists(_) => SandboxErrorKind::SchemaExists,
      Error::UnknownSchema(_) => SandboxErrorKind::UnknownSchema,
      Error::Execution(_) => SandboxErrorKind::Execution,
      Error::Database(_)
      | Error::Io(_)
      | Error::DateParse(_)
      | Error::NameClash { .. }
      | Error::LeaderboardInSandboxDir(_) => SandboxErrorKind::Other,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
