//! Leaderboard value formatting

use serde::{Deserialize, Serialize};

/// How a leaderboard value is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    /// Frame count at 60 fps, shown as `mm:ss.cc`
    Frames,
    /// Whole seconds, shown as `mm:ss`
    Seconds,
    /// Hundredths of a second, shown as `mm:ss.cc`
    Centiseconds,
    /// Whole minutes, shown as `HhMM`
    Minutes,
    /// Whole seconds, shown as `HhMM`
    SecondsAsMinutes,
    /// Signed, zero-padded, with a `Points` suffix
    Score,
    /// Signed decimal
    #[default]
    Value,
    Unsigned,
    /// Signed, zero-padded to six digits
    Other,
}

impl ValueFormat {
    /// Parse a format name as used in leaderboard definitions.
    /// Unknown names fall back to `Value`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "TIME" | "FRAMES" => ValueFormat::Frames,
            "TIMESECS" | "SECS" => ValueFormat::Seconds,
            "MILLISECS" | "CENTISECS" => ValueFormat::Centiseconds,
            "MINUTES" | "MINS" => ValueFormat::Minutes,
            "SECS_AS_MINS" => ValueFormat::SecondsAsMinutes,
            "SCORE" | "POINTS" => ValueFormat::Score,
            "VALUE" => ValueFormat::Value,
            "UNSIGNED" => ValueFormat::Unsigned,
            "OTHER" => ValueFormat::Other,
            other => {
                log::debug!("unknown value format {:?}, using VALUE", other);
                ValueFormat::Value
            }
        }
    }

    /// Canonical definition name
    pub fn name(&self) -> &'static str {
        match self {
            ValueFormat::Frames => "TIME",
            ValueFormat::Seconds => "TIMESECS",
            ValueFormat::Centiseconds => "MILLISECS",
            ValueFormat::Minutes => "MINUTES",
            ValueFormat::SecondsAsMinutes => "SECS_AS_MINS",
            ValueFormat::Score => "SCORE",
            ValueFormat::Value => "VALUE",
            ValueFormat::Unsigned => "UNSIGNED",
            ValueFormat::Other => "OTHER",
        }
    }

    pub fn is_time(&self) -> bool {
        matches!(
            self,
            ValueFormat::Frames
                | ValueFormat::Seconds
                | ValueFormat::Centiseconds
                | ValueFormat::Minutes
                | ValueFormat::SecondsAsMinutes
        )
    }

    /// Render a raw 32-bit value. Signed formats reinterpret the bits.
    pub fn format(&self, value: u32) -> String {
        let signed = value as i32;
        match self {
            ValueFormat::Frames => {
                let minutes = value / 3600;
                let seconds = (value % 3600) / 60;
                let hundredths = (value % 60) * 100 / 60;
                format!("{:02}:{:02}.{:02}", minutes, seconds, hundredths)
            }
            ValueFormat::Seconds => format!("{:02}:{:02}", value / 60, value % 60),
            ValueFormat::Centiseconds => {
                let minutes = value / 6000;
                let seconds = (value % 6000) / 100;
                format!("{:02}:{:02}.{:02}", minutes, seconds, value % 100)
            }
            ValueFormat::Minutes => format!("{}h{:02}", value / 60, value % 60),
            ValueFormat::SecondsAsMinutes => format!("{}h{:02}", value / 3600, (value % 3600) / 60),
            ValueFormat::Score => format!("{:06} Points", signed),
            ValueFormat::Value => signed.to_string(),
            ValueFormat::Unsigned => value.to_string(),
            ValueFormat::Other => format!("{:06}", signed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!(ValueFormat::parse("SCORE"), ValueFormat::Score);
        assert_eq!(ValueFormat::parse("points"), ValueFormat::Score);
        assert_eq!(ValueFormat::parse("TIME"), ValueFormat::Frames);
        assert_eq!(ValueFormat::parse("TIMESECS"), ValueFormat::Seconds);
        assert_eq!(ValueFormat::parse("MILLISECS"), ValueFormat::Centiseconds);
        assert_eq!(ValueFormat::parse("bogus"), ValueFormat::Value);
    }

    #[test]
    fn test_names_parse_back() {
        for format in [
            ValueFormat::Frames,
            ValueFormat::Seconds,
            ValueFormat::Centiseconds,
            ValueFormat::Minutes,
            ValueFormat::SecondsAsMinutes,
            ValueFormat::Score,
            ValueFormat::Value,
            ValueFormat::Unsigned,
            ValueFormat::Other,
        ] {
            assert_eq!(ValueFormat::parse(format.name()), format);
        }
    }

    #[test]
    fn test_format_times() {
        assert_eq!(ValueFormat::Frames.format(3723), "01:02.05");
        assert_eq!(ValueFormat::Seconds.format(125), "02:05");
        assert_eq!(ValueFormat::Centiseconds.format(12345), "02:03.45");
        assert_eq!(ValueFormat::Minutes.format(135), "2h15");
        assert_eq!(ValueFormat::SecondsAsMinutes.format(8100), "2h15");
        assert!(ValueFormat::Frames.is_time());
        assert!(!ValueFormat::Score.is_time());
    }

    #[test]
    fn test_format_numbers() {
        assert_eq!(ValueFormat::Score.format(18), "000018 Points");
        assert_eq!(ValueFormat::Value.format(u32::MAX), "-1");
        assert_eq!(ValueFormat::Unsigned.format(u32::MAX), "4294967295");
        assert_eq!(ValueFormat::Other.format(42), "000042");
    }
}
