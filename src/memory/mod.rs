//! Emulated memory access
//!
//! The host exposes console memory through [`MemoryReader`]. Everything above
//! this module reads through [`read_value`] and [`read_float`], which decode the
//! sized views (bits, nibbles, multi-byte integers of either byte order, bit
//! counts and the float encodings) and never fail: unreadable bytes are zero.

mod block;
mod memref;
mod size;

pub use block::MemoryBlock;
pub use memref::{MemRef, MemRefId, MemRefs};
pub use size::MemSize;

/// Byte-addressable view of emulated memory
pub trait MemoryReader: Send + Sync {
    /// Read a single byte, `None` when the address is not backed by memory
    fn read_u8(&self, address: u32) -> Option<u8>;

    /// Read raw bytes, `None` if any byte in the range is unavailable
    fn read_bytes(&self, address: u32, size: usize) -> Option<Vec<u8>> {
        (0..size as u32)
            .map(|i| self.read_u8(address.wrapping_add(i)))
            .collect()
    }
}

/// Read `count` bytes starting at `address` as a little-endian integer.
/// Missing bytes read as zero.
fn read_le(reader: &dyn MemoryReader, address: u32, count: u32) -> u32 {
    if let Some(bytes) = reader.read_bytes(address, count as usize) {
        return bytes
            .iter()
            .rev()
            .fold(0u32, |acc, &b| (acc << 8) | b as u32);
    }

    (0..count).rev().fold(0u32, |acc, i| {
        let b = reader.read_u8(address.wrapping_add(i)).unwrap_or(0);
        (acc << 8) | b as u32
    })
}

/// Read the raw storage bits for `size` at `address`.
///
/// For integer sizes this is the value itself. For float sizes it is the
/// 32-bit pattern, oriented so that [`decode_float`] can interpret it.
pub fn read_value(reader: &dyn MemoryReader, address: u32, size: MemSize) -> u32 {
    match size {
        MemSize::Bit0 | MemSize::Bit1 | MemSize::Bit2 | MemSize::Bit3
        | MemSize::Bit4 | MemSize::Bit5 | MemSize::Bit6 | MemSize::Bit7 => {
            let shift = size.bit_index().unwrap_or(0);
            (read_le(reader, address, 1) >> shift) & 1
        }
        MemSize::LowNibble => read_le(reader, address, 1) & 0x0F,
        MemSize::HighNibble => (read_le(reader, address, 1) >> 4) & 0x0F,
        MemSize::EightBit => read_le(reader, address, 1),
        MemSize::SixteenBit => read_le(reader, address, 2),
        MemSize::TwentyFourBit => read_le(reader, address, 3),
        MemSize::ThirtyTwoBit | MemSize::Float | MemSize::Mbf32 | MemSize::Mbf32Le => {
            read_le(reader, address, 4)
        }
        MemSize::SixteenBitBigEndian => read_le(reader, address, 2).swap_bytes() >> 16,
        MemSize::TwentyFourBitBigEndian => read_le(reader, address, 3).swap_bytes() >> 8,
        MemSize::ThirtyTwoBitBigEndian | MemSize::FloatBigEndian => {
            read_le(reader, address, 4).swap_bytes()
        }
        MemSize::BitCount => read_le(reader, address, 1).count_ones(),
    }
}

/// Read a value as a float. Integer sizes are widened.
pub fn read_float(reader: &dyn MemoryReader, address: u32, size: MemSize) -> f64 {
    let raw = read_value(reader, address, size);
    if size.is_float() {
        decode_float(raw, size)
    } else {
        raw as f64
    }
}

/// Copy `len` bytes starting at `address`. Unbacked bytes are zero.
pub fn read_range(reader: &dyn MemoryReader, address: u32, len: usize) -> Vec<u8> {
    reader.read_bytes(address, len).unwrap_or_else(|| {
        (0..len as u32)
            .map(|i| reader.read_u8(address.wrapping_add(i)).unwrap_or(0))
            .collect()
    })
}

/// Interpret raw bits produced by [`read_value`] for a float size
pub fn decode_float(raw: u32, size: MemSize) -> f64 {
    match size {
        MemSize::Float | MemSize::FloatBigEndian => f32::from_bits(raw) as f64,
        MemSize::Mbf32 => {
            // stored big-endian: exponent, sign+mantissa high, mantissa mid, mantissa low
            let mantissa = ((raw & 0xFF00_0000) >> 24) | ((raw & 0x00FF_0000) >> 8) | ((raw & 0x7F00) << 8);
            let exponent = (raw & 0xFF) as i32 - 129;
            let negative = raw & 0x8000 != 0;
            mbf32_to_f64(mantissa, exponent, negative)
        }
        MemSize::Mbf32Le => {
            let mantissa = raw & 0x007F_FFFF;
            let exponent = (raw >> 24) as i32 - 129;
            let negative = raw & 0x0080_0000 != 0;
            mbf32_to_f64(mantissa, exponent, negative)
        }
        _ => raw as f64,
    }
}

fn mbf32_to_f64(mantissa: u32, exponent: i32, negative: bool) -> f64 {
    // an exponent byte of zero means zero regardless of the mantissa
    if exponent == -129 {
        return 0.0;
    }

    let value = (1.0 + mantissa as f64 / (1u32 << 23) as f64) * 2f64.powi(exponent);
    if negative {
        -value
    } else {
        value
    }
}

/// Decode packed binary-coded decimal. Nibbles above 9 contribute their raw
/// value as the digit instead of failing.
pub fn decode_bcd(value: u32, size: MemSize) -> u32 {
    let nibbles = match size.byte_width() {
        0 | 1 => 2,
        n => n * 2,
    };

    (0..nibbles).rev().fold(0u32, |acc, i| {
        let digit = (value >> (i * 4)) & 0x0F;
        acc.wrapping_mul(10).wrapping_add(digit)
    })
}

/// Bitwise complement limited to the width of `size`
pub fn invert(value: u32, size: MemSize) -> u32 {
    match size {
        MemSize::BitCount => 8u32.saturating_sub(value),
        _ => !value & size.max_value(),
    }
}
