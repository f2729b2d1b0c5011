//! NYA Core Cheevos
//!
//! Achievement condition engine for emulated consoles. Achievement and
//! leaderboard definitions are written in a compact text format, parsed into
//! triggers, and evaluated against emulated memory once per frame.
//!
//! The crate provides:
//! - Memory access with sized reads (bits, nibbles, 8-32 bit integers of either
//!   byte order, bit counts, IEEE and MBF32 floats)
//! - Triggers: conditions, groups, hit counts, pause/reset logic, pointer chains
//! - A parser and serializer for the text format that round-trip exactly
//! - Leaderboards with value expressions and score formatting
//! - Rich presence scripts rendered from memory
//! - A memory search engine for finding addresses
//! - A frame runtime with state change callbacks

pub mod config;
pub mod core;
pub mod error;
pub mod leaderboards;
pub mod memory;
pub mod notes;
pub mod richpresence;
pub mod search;
pub mod triggers;

// Re-export commonly used types
pub use config::{AchievementSetDocument, EngineConfig};
pub use crate::core::{Runtime, RuntimeEvent, RuntimeHandle, RuntimeState, TriggerState};
pub use error::{Error, ParseError, ParseErrorKind, Result, SearchError};
pub use leaderboards::{Leaderboard, LeaderboardState, ValueFormat};
pub use memory::{MemSize, MemoryBlock, MemoryReader};
pub use notes::{CodeNoteLookup, CodeNotes};
pub use richpresence::RichPresence;
pub use search::{ComparisonType, SearchFilterType, SearchResults, SearchType};
pub use triggers::{Condition, ConditionType, Operand, Operator, ParseMode, Trigger};
