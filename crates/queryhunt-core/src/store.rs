//! The `SandboxStore` trait and supporting result types.
//!
//! The trait is implemented by database backends (e.g.
//! `queryhunt-store-sqlite`). The game layer depends on this abstraction, not
//! on any concrete engine. Every method runs with auto-commit semantics: no
//! transaction spans more than one statement.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{SchemaName, ValidatedQuery, leaderboard::LeaderboardEntry, tables::GameTable};

// ─── Results ─────────────────────────────────────────────────────────────────

/// Tabular result of a player query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOutput {
  pub columns:   Vec<String>,
  /// One JSON scalar per column: null, number or string.
  pub rows:      Vec<Vec<serde_json::Value>>,
  /// Set when the backend stopped reading rows at its limit.
  pub truncated: bool,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Backend-independent classification of store errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxErrorKind {
  /// `create_schema_and_tables` found the schema already present.
  SchemaExists,
  /// The schema does not exist.
  UnknownSchema,
  /// The engine rejected a statement (syntax, missing table, constraint...).
  /// The message is safe to show to the player verbatim.
  Execution,
  /// Anything else: I/O, closed connections, corrupt files.
  Other,
}

/// Implemented by backend error types so callers can branch on error kind.
pub trait SandboxError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> SandboxErrorKind;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the engine hosting per-player sandbox schemas and the
/// shared leaderboard.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SandboxStore: Send + Sync {
  type Error: SandboxError;

  // ── Provisioning ──────────────────────────────────────────────────────

  /// Whether a schema named `schema` currently exists.
  fn schema_exists<'a>(
    &'a self,
    schema: &'a SchemaName,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Create the schema and its six empty tables, parents before children.
  ///
  /// Fails with an error of kind [`SandboxErrorKind::SchemaExists`] when the
  /// schema is already present.
  fn create_schema_and_tables<'a>(
    &'a self,
    schema: &'a SchemaName,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Delete every row from the six tables, children before parents. Table
  /// structure is preserved.
  fn reset_schema<'a>(
    &'a self,
    schema: &'a SchemaName,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Drop the schema and everything in it. Dropping a missing schema is not
  /// an error.
  fn drop_schema<'a>(
    &'a self,
    schema: &'a SchemaName,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Every sandbox schema currently present, whether or not a session owns
  /// it.
  fn list_schemas(&self) -> impl Future<Output = Result<Vec<SchemaName>, Self::Error>> + Send + '_;

  // ── Sandbox contents ──────────────────────────────────────────────────

  /// Execute system-issued statements inside `schema`, one at a time.
  ///
  /// Callers are responsible for vetting the statements; the store runs them
  /// as given.
  fn execute_maintenance<'a>(
    &'a self,
    schema: &'a SchemaName,
    statements: &'a [String],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Run a validated player query inside `schema`.
  fn run_query<'a>(
    &'a self,
    schema: &'a SchemaName,
    query: &'a ValidatedQuery,
  ) -> impl Future<Output = Result<QueryOutput, Self::Error>> + Send + 'a;

  /// Every `Murderer.name` in `schema`. A well-formed game has exactly one.
  fn ground_truth<'a>(
    &'a self,
    schema: &'a SchemaName,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'a;

  /// Row count of each of the six tables.
  fn row_counts<'a>(
    &'a self,
    schema: &'a SchemaName,
  ) -> impl Future<Output = Result<Vec<(GameTable, u64)>, Self::Error>> + Send + 'a;

  // ── Leaderboard ───────────────────────────────────────────────────────

  /// Append one row to the shared leaderboard.
  fn insert_leaderboard_entry<'a>(
    &'a self,
    entry: &'a LeaderboardEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
