//! Leaderboards
//!
//! A leaderboard is four triggers and a value:
//! `STA:<start>::CAN:<cancel>::SUB:<submit>::VAL:<value>`, optionally followed
//! by `::PRO:<progress>` and `::FOR:<format>`. Parts may appear in any order.
//! The start trigger arms an attempt, cancel abandons it and submit records
//! the current value.

mod format;

pub use format::ValueFormat;

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, ParseErrorKind};
use crate::memory::MemoryReader;
use crate::triggers::{parse_trigger, parse_value, ParseMode, Trigger};

/// Attempt state of a leaderboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardState {
    /// Disabled, not evaluated
    Inactive,
    /// Armed, waiting for the start trigger
    Active,
    /// Attempt in progress
    Started,
    /// Attempt abandoned; re-arms once start is false
    Canceled,
    /// Value submitted; re-arms once start is false
    Triggered,
}

/// State change reported by [`Leaderboard::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardEvent {
    Started,
    Canceled,
    Submitted,
}

/// A parsed leaderboard definition with its attempt state
#[derive(Debug, Clone)]
pub struct Leaderboard {
    start: Trigger,
    cancel: Trigger,
    submit: Trigger,
    value: Trigger,
    progress: Option<Trigger>,
    format: ValueFormat,
    /// Set when the definition carries a `FOR:` part
    format_declared: bool,
    state: LeaderboardState,
    current_value: u32,
    progress_value: u32,
}

impl Leaderboard {
    /// Parse a full definition
    pub fn parse(definition: &str, mode: ParseMode) -> Result<Self, ParseError> {
        let mut start = None;
        let mut cancel = None;
        let mut submit = None;
        let mut value = None;
        let mut progress = None;
        let mut format = None;

        let mut offset = 0;
        for part in definition.split("::") {
            let part_offset = offset;
            offset += part.len() + 2;

            let bytes = part.as_bytes();
            if bytes.len() < 4 || bytes[3] != b':' {
                if mode == ParseMode::Strict {
                    return Err(ParseError::new(part_offset, ParseErrorKind::UnexpectedCharacter));
                }
                log::debug!("skipping malformed leaderboard part {:?}", part);
                continue;
            }

            let key = part[..3].to_ascii_uppercase();
            let body = &part[4..];
            let at = part_offset + 4;
            let relocate = |e: ParseError| ParseError::new(e.position + at, e.kind);

            match key.as_str() {
                "STA" => start = Some(parse_trigger(body, mode).map_err(relocate)?),
                "CAN" => cancel = Some(parse_trigger(body, mode).map_err(relocate)?),
                "SUB" => submit = Some(parse_trigger(body, mode).map_err(relocate)?),
                "VAL" => value = Some(parse_value(body, mode).map_err(relocate)?),
                "PRO" => progress = Some(parse_value(body, mode).map_err(relocate)?),
                "FOR" => format = Some(ValueFormat::parse(body)),
                _ => {
                    if mode == ParseMode::Strict {
                        return Err(ParseError::new(part_offset, ParseErrorKind::UnexpectedCharacter));
                    }
                    log::debug!("ignoring unknown leaderboard part {:?}", key);
                }
            }
        }

        let missing = || ParseError::new(definition.len(), ParseErrorKind::MissingPart);
        Ok(Self {
            start: start.ok_or_else(missing)?,
            cancel: cancel.ok_or_else(missing)?,
            submit: submit.ok_or_else(missing)?,
            value: value.ok_or_else(missing)?,
            progress,
            format: format.unwrap_or_default(),
            format_declared: format.is_some(),
            state: LeaderboardState::Active,
            current_value: 0,
            progress_value: 0,
        })
    }

    pub fn with_format(mut self, format: ValueFormat) -> Self {
        self.format = format;
        self.format_declared = true;
        self
    }

    /// Use `format` unless the definition declared its own with `FOR:`
    pub fn with_default_format(self, format: ValueFormat) -> Self {
        if self.format_declared {
            self
        } else {
            self.with_format(format)
        }
    }

    pub fn state(&self) -> LeaderboardState {
        self.state
    }

    pub fn format(&self) -> ValueFormat {
        self.format
    }

    pub fn start(&self) -> &Trigger {
        &self.start
    }

    pub fn cancel(&self) -> &Trigger {
        &self.cancel
    }

    pub fn submit(&self) -> &Trigger {
        &self.submit
    }

    pub fn value_trigger(&self) -> &Trigger {
        &self.value
    }

    pub fn progress_trigger(&self) -> Option<&Trigger> {
        self.progress.as_ref()
    }

    /// Value measured on the last frame
    pub fn value(&self) -> u32 {
        self.current_value
    }

    /// Progress display value; the measured value when no progress
    /// expression is defined
    pub fn progress(&self) -> u32 {
        if self.progress.is_some() {
            self.progress_value
        } else {
            self.current_value
        }
    }

    /// Current value rendered with the leaderboard's format
    pub fn formatted_value(&self) -> String {
        self.format.format(self.current_value)
    }

    /// Enable or disable evaluation
    pub fn set_active(&mut self, active: bool) {
        match (active, self.state) {
            (false, _) => self.state = LeaderboardState::Inactive,
            (true, LeaderboardState::Inactive) => self.state = LeaderboardState::Active,
            _ => {}
        }
    }

    /// Abandon any attempt and clear all history
    pub fn reset(&mut self) {
        for trigger in [&mut self.start, &mut self.cancel, &mut self.submit, &mut self.value] {
            trigger.reset();
        }
        if let Some(progress) = &mut self.progress {
            progress.reset();
        }
        self.current_value = 0;
        self.progress_value = 0;
        if self.state != LeaderboardState::Inactive {
            self.state = LeaderboardState::Active;
        }
    }

    /// Evaluate one frame and advance the attempt state
    pub fn update(&mut self, reader: &dyn MemoryReader) -> Option<LeaderboardEvent> {
        if self.state == LeaderboardState::Inactive {
            return None;
        }

        let start = self.start.evaluate(reader).is_true;
        let cancel = self.cancel.evaluate(reader).is_true;
        let submit = self.submit.evaluate(reader).is_true;

        let starting = self.state == LeaderboardState::Active && start && !cancel;
        if starting {
            self.value.reset_hits();
        }

        self.current_value = self.value.evaluate_value(reader).as_u32();
        if let Some(progress) = &mut self.progress {
            self.progress_value = progress.evaluate_value(reader).as_u32();
        }

        let (next, event) = match self.state {
            LeaderboardState::Active if starting && submit => {
                (LeaderboardState::Triggered, Some(LeaderboardEvent::Submitted))
            }
            LeaderboardState::Active if starting => (LeaderboardState::Started, Some(LeaderboardEvent::Started)),
            LeaderboardState::Started if cancel => (LeaderboardState::Canceled, Some(LeaderboardEvent::Canceled)),
            LeaderboardState::Started if submit => {
                (LeaderboardState::Triggered, Some(LeaderboardEvent::Submitted))
            }
            LeaderboardState::Canceled | LeaderboardState::Triggered if !start => (LeaderboardState::Active, None),
            state => (state, None),
        };

        if next != self.state {
            log::debug!("leaderboard {:?} -> {:?}", self.state, next);
            self.state = next;
        }
        event
    }
}
