//! Memory search
//!
//! A search starts from a snapshot of an address range in which every
//! address is a candidate. Each filter compares the current memory against
//! a constant, the previous snapshot, or the initial snapshot, and keeps the
//! candidates that pass. Candidates can also be excluded by hand.

mod results;

pub use results::{AppliedFilter, SearchMatch, SearchResults};

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::memory::MemSize;
use crate::triggers::{Operator, TypedValue};

/// Default number of bytes captured per chunk
pub const DEFAULT_BLOCK_SIZE: usize = 256 * 1024;

/// How memory is interpreted while searching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    /// Every byte holds two candidates, lower nibble then upper
    FourBit,
    #[default]
    EightBit,
    SixteenBit,
    TwentyFourBit,
    ThirtyTwoBit,
    SixteenBitAligned,
    ThirtyTwoBitAligned,
    SixteenBitBigEndian,
    ThirtyTwoBitBigEndian,
    BitCount,
    Float,
    FloatBigEndian,
    Mbf32,
    Mbf32Le,
}

impl SearchType {
    pub const ALL: [SearchType; 14] = [
        SearchType::FourBit,
        SearchType::EightBit,
        SearchType::SixteenBit,
        SearchType::TwentyFourBit,
        SearchType::ThirtyTwoBit,
        SearchType::SixteenBitAligned,
        SearchType::ThirtyTwoBitAligned,
        SearchType::SixteenBitBigEndian,
        SearchType::ThirtyTwoBitBigEndian,
        SearchType::BitCount,
        SearchType::Float,
        SearchType::FloatBigEndian,
        SearchType::Mbf32,
        SearchType::Mbf32Le,
    ];

    /// Size used to read a candidate. Four-bit searches report the
    /// upper nibble separately.
    pub fn size(&self) -> MemSize {
        match self {
            SearchType::FourBit => MemSize::LowNibble,
            SearchType::EightBit => MemSize::EightBit,
            SearchType::SixteenBit | SearchType::SixteenBitAligned => MemSize::SixteenBit,
            SearchType::TwentyFourBit => MemSize::TwentyFourBit,
            SearchType::ThirtyTwoBit | SearchType::ThirtyTwoBitAligned => MemSize::ThirtyTwoBit,
            SearchType::SixteenBitBigEndian => MemSize::SixteenBitBigEndian,
            SearchType::ThirtyTwoBitBigEndian => MemSize::ThirtyTwoBitBigEndian,
            SearchType::BitCount => MemSize::BitCount,
            SearchType::Float => MemSize::Float,
            SearchType::FloatBigEndian => MemSize::FloatBigEndian,
            SearchType::Mbf32 => MemSize::Mbf32,
            SearchType::Mbf32Le => MemSize::Mbf32Le,
        }
    }

    /// Bytes after a candidate address needed to hold its value
    pub fn padding(&self) -> u32 {
        self.size().byte_width().max(1) - 1
    }

    /// Distance between candidate addresses
    pub fn stride(&self) -> u32 {
        match self {
            SearchType::SixteenBitAligned => 2,
            SearchType::ThirtyTwoBitAligned => 4,
            _ => 1,
        }
    }

    pub fn is_float(&self) -> bool {
        self.size().is_float()
    }

    pub fn description(&self) -> &'static str {
        match self {
            SearchType::FourBit => "4-bit",
            SearchType::EightBit => "8-bit",
            SearchType::SixteenBit => "16-bit",
            SearchType::TwentyFourBit => "24-bit",
            SearchType::ThirtyTwoBit => "32-bit",
            SearchType::SixteenBitAligned => "16-bit (aligned)",
            SearchType::ThirtyTwoBitAligned => "32-bit (aligned)",
            SearchType::SixteenBitBigEndian => "16-bit BE",
            SearchType::ThirtyTwoBitBigEndian => "32-bit BE",
            SearchType::BitCount => "BitCount",
            SearchType::Float => "Float",
            SearchType::FloatBigEndian => "Float BE",
            SearchType::Mbf32 => "MBF32",
            SearchType::Mbf32Le => "MBF32 LE",
        }
    }

    /// Key of a candidate. Four-bit keys address nibbles.
    pub(crate) fn key(&self, address: u32, upper: bool) -> u64 {
        match self {
            SearchType::FourBit => ((address as u64) << 1) | upper as u64,
            _ => address as u64,
        }
    }

    /// Real address and read size of a candidate key
    pub(crate) fn locate(&self, key: u64) -> (u32, MemSize) {
        match self {
            SearchType::FourBit => {
                let size = if key & 1 == 1 { MemSize::HighNibble } else { MemSize::LowNibble };
                ((key >> 1) as u32, size)
            }
            _ => (key as u32, self.size()),
        }
    }
}

/// Comparison applied between the current value and the reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonType {
    #[default]
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl ComparisonType {
    pub fn operator(&self) -> Operator {
        match self {
            ComparisonType::Equals => Operator::Equals,
            ComparisonType::NotEquals => Operator::NotEquals,
            ComparisonType::LessThan => Operator::LessThan,
            ComparisonType::LessThanOrEqual => Operator::LessThanOrEqual,
            ComparisonType::GreaterThan => Operator::GreaterThan,
            ComparisonType::GreaterThanOrEqual => Operator::GreaterThanOrEqual,
        }
    }
}

/// What the current value is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFilterType {
    #[default]
    Constant,
    LastKnownValue,
    LastKnownValuePlus,
    LastKnownValueMinus,
    InitialValue,
}

impl SearchFilterType {
    /// Whether the filter needs a value
    pub fn takes_value(&self) -> bool {
        matches!(
            self,
            SearchFilterType::Constant | SearchFilterType::LastKnownValuePlus | SearchFilterType::LastKnownValueMinus
        )
    }
}

/// Parse a filter value: decimal, `0x`/`h` hex, or a decimal fraction for
/// float searches. Negative integers wrap.
pub fn parse_filter_value(text: &str, search_type: SearchType) -> Result<TypedValue, SearchError> {
    let trimmed = text.trim();
    let invalid = || SearchError::InvalidFilterValue(text.to_string());

    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .or_else(|| trimmed.strip_prefix('h'))
        .or_else(|| trimmed.strip_prefix('H'));
    if let Some(digits) = hex {
        return u32::from_str_radix(digits, 16)
            .map(TypedValue::Unsigned)
            .map_err(|_| invalid());
    }

    if search_type.is_float() {
        return trimmed
            .parse::<f32>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| TypedValue::Float(f as f64))
            .ok_or_else(invalid);
    }

    match trimmed.parse::<i64>() {
        Ok(v) if v >= i32::MIN as i64 && v <= u32::MAX as i64 => Ok(TypedValue::Unsigned(v as u32)),
        _ => Err(invalid()),
    }
}
