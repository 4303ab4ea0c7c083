//! Connection setup and the shared leaderboard DDL.
//!
//! The six game tables are defined in [`queryhunt_core::tables`]; only
//! per-connection pragmas and the leaderboard live here.

/// Run on every sandbox connection as it is opened. SQLite enforces foreign
/// keys per connection, so this must precede any DDL or DML.
pub const SANDBOX_PRAGMAS: &str = "PRAGMA foreign_keys = ON;";

/// Leaderboard database; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const LEADERBOARD_SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS Leaderboard (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username VARCHAR(255),
    date DATE,
    time_sec INT
);
";

/// File extension of sandbox databases inside the sandbox directory.
pub const SANDBOX_EXTENSION: &str = "db";
