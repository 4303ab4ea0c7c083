//! Core types and trait definitions for the QueryHunt murder-mystery game.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::SandboxStore`]; story and hint
//! providers implement the traits in [`narrator`].

pub mod error;
pub mod identity;
pub mod leaderboard;
pub mod narrator;
pub mod query;
pub mod session;
pub mod store;
pub mod tables;

pub use error::{Error, Result};
pub use identity::SchemaName;
pub use query::ValidatedQuery;
