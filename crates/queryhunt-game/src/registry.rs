//! In-memory session registry keyed by schema name.
//!
//! Each identity owns one slot. A slot's async lock serialises every turn for
//! that identity, so two tabs starting a game at once cannot interleave their
//! provisioning.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use queryhunt_core::{SchemaName, session::PlayerSession};

pub(crate) type Slot = Arc<tokio::sync::Mutex<Option<PlayerSession>>>;

#[derive(Default)]
pub(crate) struct SessionRegistry {
  slots: Mutex<HashMap<SchemaName, Slot>>,
}

impl SessionRegistry {
  fn slots(&self) -> MutexGuard<'_, HashMap<SchemaName, Slot>> {
    self.slots.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// The slot for `schema`, created empty if missing.
  pub fn slot(&self, schema: &SchemaName) -> Slot {
    self.slots().entry(schema.clone()).or_default().clone()
  }

  pub fn existing(&self, schema: &SchemaName) -> Option<Slot> { self.slots().get(schema).cloned() }

  pub fn entries(&self) -> Vec<(SchemaName, Slot)> {
    self
      .slots()
      .iter()
      .map(|(schema, slot)| (schema.clone(), slot.clone()))
      .collect()
  }

  /// Forget `slot` if nobody but the caller holds it.
  ///
  /// The caller must hold the slot's lock and have left it empty.
  pub fn release(&self, schema: &SchemaName, slot: &Slot) {
    let mut slots = self.slots();
    let unshared = slots
      .get(schema)
      .is_some_and(|held| Arc::ptr_eq(held, slot) && Arc::strong_count(slot) == 2);
    if unshared {
      slots.remove(schema);
    }
  }

  #[cfg(test)]
  pub fn len(&self) -> usize { self.slots().len() }
}
