//! Achievement runtime
//!
//! This module contains the frame-driven runtime:
//! - `Runtime` - Owns achievements and leaderboards and evaluates them each frame
//! - `RuntimeHandle` - Queues edits from other threads
//! - `RuntimeState` - Snapshot published after every frame
//! - `RuntimeEvent` - Events emitted on state changes

mod events;
mod runner;
mod state;

pub use events::{EventCallback, EventHandler, RuntimeEvent};
pub use runner::{Runtime, RuntimeHandle};
pub use state::{AchievementStatus, LeaderboardStatus, RuntimeState, TriggerState};
