//! Configuration types
//!
//! Engine settings and achievement-set documents, both loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::leaderboards::ValueFormat;
use crate::notes::CodeNote;
use crate::search::DEFAULT_BLOCK_SIZE;
use crate::triggers::ParseMode;

/// Engine-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How malformed definitions are handled
    #[serde(default)]
    pub parse_mode: ParseMode,
    /// Bytes captured per chunk while searching
    #[serde(default = "default_search_block_size")]
    pub search_block_size: usize,
    /// Let a trigger that is already true on its first frame unlock
    /// immediately instead of waiting for it to become false once
    #[serde(default)]
    pub unlock_on_first_frame: bool,
}

fn default_search_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parse_mode: ParseMode::default(),
            search_block_size: DEFAULT_BLOCK_SIZE,
            unlock_on_first_frame: false,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Game an achievement set belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub id: u32,
    #[serde(default)]
    pub title: String,
}

/// One achievement definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub points: u32,
    /// Trigger in text form, e.g. `0xH1234=5.3._R:0xH0010=0`
    pub trigger: String,
}

/// One leaderboard definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardDefinition {
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// `STA:...::CAN:...::SUB:...::VAL:...`
    pub definition: String,
    /// Display format; a `FOR:` part in the definition takes precedence
    #[serde(default)]
    pub format: Option<ValueFormat>,
}

/// A game's achievements, leaderboards and code notes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AchievementSetDocument {
    #[serde(default)]
    pub game: GameInfo,
    #[serde(default)]
    pub achievements: Vec<AchievementDefinition>,
    #[serde(default)]
    pub leaderboards: Vec<LeaderboardDefinition>,
    #[serde(default)]
    pub notes: Vec<CodeNote>,
    /// Rich presence script
    #[serde(default)]
    pub rich_presence: Option<String>,
}

impl AchievementSetDocument {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a document from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let document = Self::from_toml_str(&text)?;
        log::info!(
            "loaded {} achievements and {} leaderboards for game {} from {}",
            document.achievements.len(),
            document.leaderboards.len(),
            document.game.id,
            path.as_ref().display()
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.parse_mode, ParseMode::Lenient);
        assert_eq!(config.search_block_size, 256 * 1024);
        assert!(!config.unlock_on_first_frame);
    }

    #[test]
    fn test_engine_config_full() {
        let config = EngineConfig::from_toml_str(
            r#"
            parse_mode = "strict"
            search_block_size = 4096
            unlock_on_first_frame = true
        "#,
        )
        .unwrap();
        assert_eq!(config.parse_mode, ParseMode::Strict);
        assert_eq!(config.search_block_size, 4096);
        assert!(config.unlock_on_first_frame);
    }

    #[test]
    fn test_engine_config_invalid() {
        let err = EngineConfig::from_toml_str(r#"parse_mode = "sloppy""#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_achievement_set_document() {
        let document = AchievementSetDocument::from_toml_str(
            r#"
            [game]
            id = 1
            title = "Sonic the Hedgehog"

            [[achievements]]
            id = 10
            title = "Ring Collector"
            points = 5
            trigger = "0xH1234>=100"

            [[leaderboards]]
            id = 20
            title = "Green Hill Act 1"
            definition = "STA:0xH0001=1::CAN:0xH0002=1::SUB:0xH0003=1::VAL:0xH0004"
            format = "frames"

            [[notes]]
            address = 0x1234
            note = "Ring count"
        "#,
        )
        .unwrap();

        assert_eq!(document.game.title, "Sonic the Hedgehog");
        assert_eq!(document.achievements.len(), 1);
        assert_eq!(document.achievements[0].trigger, "0xH1234>=100");
        assert_eq!(document.achievements[0].description, "");
        assert_eq!(document.leaderboards[0].format, Some(ValueFormat::Frames));
        assert_eq!(document.notes[0].address, 0x1234);
    }

    #[test]
    fn test_achievement_requires_trigger() {
        let result = AchievementSetDocument::from_toml_str(
            r#"
            [[achievements]]
            id = 10
        "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = AchievementSetDocument::load("/nonexistent/set.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
