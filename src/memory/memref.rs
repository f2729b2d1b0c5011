//! Memory reference history
//!
//! Each distinct (address, size) read by a trigger gets one slot in a
//! [`MemRefs`] arena. Slots keep the current value, the value one frame ago
//! (delta) and the value before the most recent change (prior). Direct slots
//! are refreshed once at the start of every frame. Indirect slots are read
//! relative to a pointer resolved during evaluation, so they refresh lazily and
//! at most once per frame.

use super::{read_value, MemSize, MemoryReader};

/// Index of a slot in a [`MemRefs`] arena
pub type MemRefId = usize;

/// One tracked memory location
#[derive(Debug, Clone, PartialEq)]
pub struct MemRef {
    /// Literal address, or the offset applied to the resolved pointer when indirect
    pub address: u32,
    pub size: MemSize,
    pub indirect: bool,
    /// Raw bits this frame
    pub value: u32,
    /// Raw bits last frame
    pub delta: u32,
    /// Raw bits before the most recent change
    pub prior: u32,
    last_frame: u64,
}

impl MemRef {
    fn new(address: u32, size: MemSize, indirect: bool) -> Self {
        Self {
            address,
            size,
            indirect,
            value: 0,
            delta: 0,
            prior: 0,
            last_frame: 0,
        }
    }

    /// Shift history and record a freshly read value
    pub fn push(&mut self, value: u32) {
        self.delta = self.value;
        self.value = value;
        if self.value != self.delta {
            self.prior = self.delta;
        }
    }
}

/// Arena of memory references owned by a trigger
#[derive(Debug, Clone, Default)]
pub struct MemRefs {
    refs: Vec<MemRef>,
    frame: u64,
}

impl MemRefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the slot for a direct read. Direct slots are shared.
    pub fn alloc(&mut self, address: u32, size: MemSize) -> MemRefId {
        if let Some(id) = self
            .refs
            .iter()
            .position(|r| !r.indirect && r.address == address && r.size == size)
        {
            return id;
        }

        self.refs.push(MemRef::new(address, size, false));
        self.refs.len() - 1
    }

    /// Create a slot for an indirect read. Indirect slots are never shared
    /// because the pointer they hang off differs per condition.
    pub fn alloc_indirect(&mut self, offset: u32, size: MemSize) -> MemRefId {
        self.refs.push(MemRef::new(offset, size, true));
        self.refs.len() - 1
    }

    pub fn get(&self, id: MemRefId) -> Option<&MemRef> {
        self.refs.get(id)
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Frames processed so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Advance to a new frame and refresh every direct slot
    pub fn update(&mut self, reader: &dyn MemoryReader) {
        self.frame += 1;
        let frame = self.frame;
        for memref in self.refs.iter_mut().filter(|r| !r.indirect) {
            let value = read_value(reader, memref.address, memref.size);
            memref.push(value);
            memref.last_frame = frame;
        }
    }

    /// Refresh an indirect slot against the pointer resolved this frame.
    /// Repeated calls within a frame keep the first read.
    pub fn update_indirect(&mut self, id: MemRefId, reader: &dyn MemoryReader, base: u32) -> Option<&MemRef> {
        let frame = self.frame;
        let memref = self.refs.get_mut(id)?;
        if memref.indirect && memref.last_frame != frame {
            let value = read_value(reader, memref.address.wrapping_add(base), memref.size);
            memref.push(value);
            memref.last_frame = frame;
        }
        Some(memref)
    }
}
