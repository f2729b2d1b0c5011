//! Runtime state types

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::leaderboards::LeaderboardState;

/// Lifecycle of an achievement's trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerState {
    /// Not evaluated
    Inactive,
    /// Was true when first seen; must become false before it can unlock
    Waiting,
    Active,
    /// A PauseIf held this frame
    Paused,
    /// A ResetIf held this frame
    Reset,
    /// Everything but the Trigger conditions held this frame
    Primed,
    /// Unlocked; no longer evaluated
    Triggered,
}

/// Per-achievement entry of a state snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementStatus {
    pub id: u32,
    pub state: TriggerState,
    /// Measured progress as (value, target)
    #[serde(default)]
    pub measured: Option<(u32, u32)>,
}

/// Per-leaderboard entry of a state snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardStatus {
    pub id: u32,
    pub state: LeaderboardState,
    pub value: u32,
    pub formatted_value: String,
}

/// Read-only snapshot published after every frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeState {
    /// Frames evaluated since the runtime was created
    pub frame: u64,
    /// Ids of unlocked achievements, in unlock order
    pub unlocked: Vec<u32>,
    /// Ids of leaderboards with an attempt in progress
    pub active_leaderboards: Vec<u32>,
    #[serde(default)]
    pub achievements: Vec<AchievementStatus>,
    #[serde(default)]
    pub leaderboards: Vec<LeaderboardStatus>,
    /// Rich presence text for the last frame
    #[serde(default)]
    pub rich_presence: Option<String>,
}

impl RuntimeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unlocked(&self, id: u32) -> bool {
        self.unlocked.contains(&id)
    }

    pub fn achievement(&self, id: u32) -> Option<&AchievementStatus> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn leaderboard(&self, id: u32) -> Option<&LeaderboardStatus> {
        self.leaderboards.iter().find(|l| l.id == id)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups() {
        let mut state = RuntimeState::new();
        assert!(!state.is_unlocked(5));
        assert!(state.achievement(5).is_none());

        state.unlocked.push(5);
        state.achievements.push(AchievementStatus {
            id: 5,
            state: TriggerState::Triggered,
            measured: None,
        });
        assert!(state.is_unlocked(5));
        assert_eq!(state.achievement(5).unwrap().state, TriggerState::Triggered);
        assert!(state.leaderboard(5).is_none());
    }

    #[test]
    fn test_state_json() {
        let mut state = RuntimeState::new();
        state.frame = 3;
        state.unlocked.push(1);
        state.achievements.push(AchievementStatus {
            id: 1,
            state: TriggerState::Triggered,
            measured: Some((2, 4)),
        });
        state.leaderboards.push(LeaderboardStatus {
            id: 9,
            state: LeaderboardState::Started,
            value: 18,
            formatted_value: "000018 Points".to_string(),
        });

        let json = state.to_json().unwrap();
        assert!(json.contains("\"state\":\"triggered\""));
        assert!(json.contains("\"state\":\"started\""));
        assert_eq!(RuntimeState::from_json(&json).unwrap(), state);
    }
}
