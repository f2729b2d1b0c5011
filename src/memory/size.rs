//! Memory size codes

use serde::{Deserialize, Serialize};

/// Width, layout and encoding of a memory read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemSize {
    Bit0,
    Bit1,
    Bit2,
    Bit3,
    Bit4,
    Bit5,
    Bit6,
    Bit7,
    LowNibble,
    HighNibble,
    #[default]
    EightBit,
    SixteenBit,
    TwentyFourBit,
    ThirtyTwoBit,
    SixteenBitBigEndian,
    TwentyFourBitBigEndian,
    ThirtyTwoBitBigEndian,
    BitCount,
    Float,
    FloatBigEndian,
    Mbf32,
    Mbf32Le,
}

impl MemSize {
    /// Every size, in serialization order
    pub const ALL: [MemSize; 22] = [
        MemSize::Bit0,
        MemSize::Bit1,
        MemSize::Bit2,
        MemSize::Bit3,
        MemSize::Bit4,
        MemSize::Bit5,
        MemSize::Bit6,
        MemSize::Bit7,
        MemSize::LowNibble,
        MemSize::HighNibble,
        MemSize::EightBit,
        MemSize::SixteenBit,
        MemSize::TwentyFourBit,
        MemSize::ThirtyTwoBit,
        MemSize::SixteenBitBigEndian,
        MemSize::TwentyFourBitBigEndian,
        MemSize::ThirtyTwoBitBigEndian,
        MemSize::BitCount,
        MemSize::Float,
        MemSize::FloatBigEndian,
        MemSize::Mbf32,
        MemSize::Mbf32Le,
    ];

    /// Number of bytes touched by a read (0 for sub-byte sizes)
    pub fn byte_width(&self) -> u32 {
        match self {
            MemSize::Bit0 | MemSize::Bit1 | MemSize::Bit2 | MemSize::Bit3
            | MemSize::Bit4 | MemSize::Bit5 | MemSize::Bit6 | MemSize::Bit7
            | MemSize::LowNibble | MemSize::HighNibble => 0,
            MemSize::EightBit | MemSize::BitCount => 1,
            MemSize::SixteenBit | MemSize::SixteenBitBigEndian => 2,
            MemSize::TwentyFourBit | MemSize::TwentyFourBitBigEndian => 3,
            MemSize::ThirtyTwoBit | MemSize::ThirtyTwoBitBigEndian
            | MemSize::Float | MemSize::FloatBigEndian
            | MemSize::Mbf32 | MemSize::Mbf32Le => 4,
        }
    }

    /// Largest integer a read of this size can produce
    pub fn max_value(&self) -> u32 {
        match self {
            MemSize::Bit0 | MemSize::Bit1 | MemSize::Bit2 | MemSize::Bit3
            | MemSize::Bit4 | MemSize::Bit5 | MemSize::Bit6 | MemSize::Bit7 => 1,
            MemSize::LowNibble | MemSize::HighNibble => 0x0F,
            MemSize::BitCount => 8,
            MemSize::EightBit => 0xFF,
            MemSize::SixteenBit | MemSize::SixteenBitBigEndian => 0xFFFF,
            MemSize::TwentyFourBit | MemSize::TwentyFourBitBigEndian => 0x00FF_FFFF,
            _ => 0xFFFF_FFFF,
        }
    }

    /// Bit position for single-bit sizes
    pub fn bit_index(&self) -> Option<u32> {
        match self {
            MemSize::Bit0 => Some(0),
            MemSize::Bit1 => Some(1),
            MemSize::Bit2 => Some(2),
            MemSize::Bit3 => Some(3),
            MemSize::Bit4 => Some(4),
            MemSize::Bit5 => Some(5),
            MemSize::Bit6 => Some(6),
            MemSize::Bit7 => Some(7),
            _ => None,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(
            self,
            MemSize::Float | MemSize::FloatBigEndian | MemSize::Mbf32 | MemSize::Mbf32Le
        )
    }

    /// Letter following `0x` in the text format (`f` prefixed letter for floats)
    pub fn code(&self) -> char {
        match self {
            MemSize::Bit0 => 'M',
            MemSize::Bit1 => 'N',
            MemSize::Bit2 => 'O',
            MemSize::Bit3 => 'P',
            MemSize::Bit4 => 'Q',
            MemSize::Bit5 => 'R',
            MemSize::Bit6 => 'S',
            MemSize::Bit7 => 'T',
            MemSize::LowNibble => 'L',
            MemSize::HighNibble => 'U',
            MemSize::EightBit => 'H',
            MemSize::SixteenBit => ' ',
            MemSize::TwentyFourBit => 'W',
            MemSize::ThirtyTwoBit => 'X',
            MemSize::SixteenBitBigEndian => 'I',
            MemSize::TwentyFourBitBigEndian => 'J',
            MemSize::ThirtyTwoBitBigEndian => 'G',
            MemSize::BitCount => 'K',
            MemSize::Float => 'F',
            MemSize::FloatBigEndian => 'B',
            MemSize::Mbf32 => 'M',
            MemSize::Mbf32Le => 'L',
        }
    }

    /// Integer size for a letter following `0x`
    pub fn from_code(c: char) -> Option<Self> {
        let size = match c.to_ascii_uppercase() {
            'M' => MemSize::Bit0,
            'N' => MemSize::Bit1,
            'O' => MemSize::Bit2,
            'P' => MemSize::Bit3,
            'Q' => MemSize::Bit4,
            'R' => MemSize::Bit5,
            'S' => MemSize::Bit6,
            'T' => MemSize::Bit7,
            'L' => MemSize::LowNibble,
            'U' => MemSize::HighNibble,
            'H' => MemSize::EightBit,
            ' ' => MemSize::SixteenBit,
            'W' => MemSize::TwentyFourBit,
            'X' => MemSize::ThirtyTwoBit,
            'I' => MemSize::SixteenBitBigEndian,
            'J' => MemSize::TwentyFourBitBigEndian,
            'G' => MemSize::ThirtyTwoBitBigEndian,
            'K' => MemSize::BitCount,
            _ => return None,
        };
        Some(size)
    }

    /// Float size for a letter following `f`
    pub fn from_float_code(c: char) -> Option<Self> {
        match c {
            'F' => Some(MemSize::Float),
            'B' => Some(MemSize::FloatBigEndian),
            'M' => Some(MemSize::Mbf32),
            'L' => Some(MemSize::Mbf32Le),
            _ => None,
        }
    }

    /// Display name
    pub fn description(&self) -> &'static str {
        match self {
            MemSize::Bit0 => "Bit0",
            MemSize::Bit1 => "Bit1",
            MemSize::Bit2 => "Bit2",
            MemSize::Bit3 => "Bit3",
            MemSize::Bit4 => "Bit4",
            MemSize::Bit5 => "Bit5",
            MemSize::Bit6 => "Bit6",
            MemSize::Bit7 => "Bit7",
            MemSize::LowNibble => "Lower4",
            MemSize::HighNibble => "Upper4",
            MemSize::EightBit => "8-bit",
            MemSize::SixteenBit => "16-bit",
            MemSize::TwentyFourBit => "24-bit",
            MemSize::ThirtyTwoBit => "32-bit",
            MemSize::SixteenBitBigEndian => "16-bit BE",
            MemSize::TwentyFourBitBigEndian => "24-bit BE",
            MemSize::ThirtyTwoBitBigEndian => "32-bit BE",
            MemSize::BitCount => "BitCount",
            MemSize::Float => "Float",
            MemSize::FloatBigEndian => "Float BE",
            MemSize::Mbf32 => "MBF32",
            MemSize::Mbf32Le => "MBF32 LE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_codes_are_unique() {
        for size in MemSize::ALL.iter().filter(|s| !s.is_float()) {
            assert_eq!(MemSize::from_code(size.code()), Some(*size));
        }
        for size in MemSize::ALL.iter().filter(|s| s.is_float()) {
            assert_eq!(MemSize::from_float_code(size.code()), Some(*size));
        }
    }

    #[test]
    fn test_default_is_eight_bit() {
        assert_eq!(MemSize::default(), MemSize::EightBit);
    }

    #[test]
    fn test_lowercase_codes() {
        assert_eq!(MemSize::from_code('h'), Some(MemSize::EightBit));
        assert_eq!(MemSize::from_code('x'), Some(MemSize::ThirtyTwoBit));
        assert_eq!(MemSize::from_code('Z'), None);
    }

    #[test]
    fn test_max_values() {
        assert_eq!(MemSize::Bit5.max_value(), 1);
        assert_eq!(MemSize::HighNibble.max_value(), 0x0F);
        assert_eq!(MemSize::TwentyFourBitBigEndian.max_value(), 0x00FF_FFFF);
    }
}
