//! Sealed-number trading game.
//!
//! Root crate for benchmarks and workspace integration tests. The game
//! itself lives in the member crates:
//!
//! - `game-core`: players, trade matching, settlement
//! - `api-server`: HTTP API over a shared game instance

// Re-export for benchmarks
pub use game_core as core;
