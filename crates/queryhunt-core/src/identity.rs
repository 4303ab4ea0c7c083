//! Player identity → sandbox schema name.
//!
//! The identity arrives in a request header and is untrusted. It becomes a SQL
//! identifier (and, for file-backed stores, a file name), so it is checked
//! against a strict allow-list before it is used anywhere. Invalid identities
//! are rejected, never truncated or rewritten.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Longest accepted schema name; matches the MySQL identifier limit.
pub const MAX_SCHEMA_NAME_LEN: usize = 64;

/// A schema name derived 1:1 from a player identity.
///
/// Only ASCII letters, digits and `_` are allowed, with a length of
/// 1..=[`MAX_SCHEMA_NAME_LEN`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SchemaName(String);

impl SchemaName {
  pub fn parse(raw: &str) -> Result<Self> {
    let valid = !raw.is_empty()
      && raw.len() <= MAX_SCHEMA_NAME_LEN
      && raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');

    if valid {
      Ok(Self(raw.to_owned()))
    } else {
      Err(Error::InvalidIdentity(raw.to_owned()))
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SchemaName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl AsRef<str> for SchemaName {
  fn as_ref(&self) -> &str { &self.0 }
}

impl std::str::FromStr for SchemaName {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl<'de> Deserialize<'de> for SchemaName {
  fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(d)?;
    Self::parse(&raw).map_err(serde::de::Error::custom)
  }
}
