//! SQLite backend for QueryHunt sandboxes.
//!
//! Each player schema is its own SQLite database (the MySQL notion of a
//! schema), either a file in a sandbox directory or a private in-memory
//! database. The shared leaderboard lives in a separate database.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on dedicated threads
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{Location, SqliteSandbox};
