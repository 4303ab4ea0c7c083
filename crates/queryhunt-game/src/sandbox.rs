//! The session sandbox manager.
//!
//! Binds a sanitized player identity to exactly one live schema. Provisioning
//! is an explicit two-step protocol: look the schema up, then create it or
//! recycle it. A create that still loses the race to another creator falls
//! back to the recycle path.

use std::sync::Arc;

use queryhunt_core::{
  SchemaName, ValidatedQuery,
  narrator::Mystery,
  query::ensure_non_destructive,
  store::{QueryOutput, SandboxError, SandboxErrorKind, SandboxStore},
};
use tracing::{debug, info, warn};

use crate::{GameError, Result};

/// How a sandbox was made ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
  /// A brand-new schema with six empty tables.
  Created,
  /// A schema left behind by an earlier game, emptied for reuse.
  Reset,
}

pub struct SandboxManager<S> {
  store: Arc<S>,
}

impl<S: SandboxStore> SandboxManager<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  /// Make `schema` exist with six empty tables.
  pub async fn provision(&self, schema: &SchemaName) -> Result<Provisioned> {
    let exists = self
      .store
      .schema_exists(schema)
      .await
      .map_err(GameError::from_store)?;

    let outcome = if exists {
      self.reset(schema).await?
    } else {
      match self.store.create_schema_and_tables(schema).await {
        Ok(()) => Provisioned::Created,
        Err(e) if e.kind() == SandboxErrorKind::SchemaExists => self.reset(schema).await?,
        Err(e) => return Err(GameError::from_store(e)),
      }
    };

    info!(%schema, ?outcome, "sandbox ready");
    Ok(outcome)
  }

  async fn reset(&self, schema: &SchemaName) -> Result<Provisioned> {
    self
      .store
      .reset_schema(schema)
      .await
      .map_err(GameError::from_store)?;
    Ok(Provisioned::Reset)
  }

  /// Populate a provisioned sandbox with a generated mystery.
  ///
  /// Every statement is refused if it carries a destructive keyword, and the
  /// result must contain exactly one murderer. Any failure is a generation
  /// failure.
  pub async fn load(&self, schema: &SchemaName, mystery: &Mystery) -> Result<()> {
    for statement in &mystery.statements {
      ensure_non_destructive(statement)?;
    }

    self
      .store
      .execute_maintenance(schema, &mystery.statements)
      .await
      .map_err(|e| GameError::Generation(format!("population failed: {e}")))?;

    self.ground_truth(schema).await?;
    debug!(%schema, statements = mystery.statements.len(), "sandbox populated");
    Ok(())
  }

  /// Run a validated player query inside the player's own schema.
  pub async fn execute_query(&self, schema: &SchemaName, query: &ValidatedQuery) -> Result<QueryOutput> {
    self
      .store
      .run_query(schema, query)
      .await
      .map_err(GameError::from_store)
  }

  /// The single murderer name of `schema`.
  pub async fn ground_truth(&self, schema: &SchemaName) -> Result<String> {
    let mut names = self
      .store
      .ground_truth(schema)
      .await
      .map_err(GameError::from_store)?;

    match names.len() {
      1 => Ok(names.remove(0)),
      rows => Err(GameError::Generation(format!(
        "expected exactly one Murderer row in {schema}, found {rows}"
      ))),
    }
  }

  /// Drop `schema`. Failures are logged and swallowed.
  pub async fn teardown(&self, schema: &SchemaName) -> bool {
    match self.store.drop_schema(schema).await {
      Ok(()) => {
        info!(%schema, "sandbox dropped");
        true
      }
      Err(e) => {
        warn!(%schema, error = %e, "failed to drop sandbox");
        false
      }
    }
  }
}
