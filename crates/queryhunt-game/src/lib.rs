//! Session sandbox management and the game orchestration loop.
//!
//! [`Game`] is generic over the sandbox store and the two narrator
//! collaborators, so it runs unchanged against SQLite in production and
//! against scripted fakes in tests.

pub mod error;
pub mod game;
pub mod leaderboard;
mod registry;
pub mod sandbox;

pub use error::{GameError, Result};
pub use game::{Accusation, Game, StartedGame, SweepReport};
pub use leaderboard::LeaderboardRecorder;
pub use sandbox::{Provisioned, SandboxManager};

#[cfg(test)]
mod tests;
