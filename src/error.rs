//! Error types
//!
//! Evaluation itself never fails: unreadable memory reads as zero and
//! malformed definitions simply never trigger. Errors are only produced
//! while parsing definitions, loading configuration or setting up searches.

use thiserror::Error;

/// What went wrong while parsing a definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    InvalidMemorySize,
    InvalidAddress,
    InvalidOperand,
    InvalidOperator,
    UnterminatedHitCount,
    InvalidHitCount,
    InvalidConditionType,
    UnexpectedCharacter,
    MissingPart,
}

impl ParseErrorKind {
    /// Human-readable reason
    pub fn description(&self) -> &'static str {
        match self {
            ParseErrorKind::InvalidMemorySize => "invalid memory size",
            ParseErrorKind::InvalidAddress => "invalid address",
            ParseErrorKind::InvalidOperand => "invalid operand",
            ParseErrorKind::InvalidOperator => "invalid operator",
            ParseErrorKind::UnterminatedHitCount => "unterminated hit count",
            ParseErrorKind::InvalidHitCount => "invalid hit count",
            ParseErrorKind::InvalidConditionType => "invalid condition type",
            ParseErrorKind::UnexpectedCharacter => "unexpected character",
            ParseErrorKind::MissingPart => "missing leaderboard part",
        }
    }
}

/// A parse failure at a byte position in the source text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} at position {position}", kind.description())]
pub struct ParseError {
    /// Byte offset into the parsed text
    pub position: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(position: usize, kind: ParseErrorKind) -> Self {
        Self { position, kind }
    }
}

/// Memory search errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("invalid filter value: {0}")]
    InvalidFilterValue(String),

    #[error("search cancelled after {processed} of {total} bytes")]
    Cancelled { processed: usize, total: usize },
}

/// Crate-level error
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("state serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown achievement: {0}")]
    UnknownAchievement(u32),

    #[error("unknown leaderboard: {0}")]
    UnknownLeaderboard(u32),
}

pub type Result<T> = std::result::Result<T, Error>;
