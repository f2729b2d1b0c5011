//! In-memory reader
//!
//! A flat byte buffer mapped at a base address. Hosts that already hold a
//! copy of console RAM can wrap it directly; tests use it to script frames.

use super::MemoryReader;

/// Contiguous block of memory starting at `base`
#[derive(Debug, Clone, Default)]
pub struct MemoryBlock {
    base: u32,
    data: Vec<u8>,
}

impl MemoryBlock {
    /// Create a zero-filled block of `size` bytes at address 0
    pub fn new(size: usize) -> Self {
        Self {
            base: 0,
            data: vec![0; size],
        }
    }

    /// Wrap existing bytes at address 0
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { base: 0, data }
    }

    /// Map the block at a different base address
    pub fn with_base(mut self, base: u32) -> Self {
        self.base = base;
        self
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    fn offset(&self, address: u32) -> Option<usize> {
        let offset = address.checked_sub(self.base)? as usize;
        (offset < self.data.len()).then_some(offset)
    }

    /// Write bytes, silently dropping anything outside the block
    pub fn write_bytes(&mut self, address: u32, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            if let Some(offset) = self.offset(address.wrapping_add(i as u32)) {
                self.data[offset] = b;
            }
        }
    }

    pub fn write_u8(&mut self, address: u32, value: u8) {
        self.write_bytes(address, &[value]);
    }

    pub fn write_u16(&mut self, address: u32, value: u16) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    pub fn write_u32(&mut self, address: u32, value: u32) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    pub fn write_f32(&mut self, address: u32, value: f32) {
        self.write_bytes(address, &value.to_le_bytes());
    }
}

impl MemoryReader for MemoryBlock {
    fn read_u8(&self, address: u32) -> Option<u8> {
        self.offset(address).map(|o| self.data[o])
    }

    fn read_bytes(&self, address: u32, size: usize) -> Option<Vec<u8>> {
        let start = self.offset(address)?;
        let end = start.checked_add(size)?;
        self.data.get(start..end).map(|s| s.to_vec())
    }
}
