//! Code notes
//!
//! Notes annotate memory addresses with what they hold. They are only used
//! to describe conditions for display and never affect evaluation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::memory::MemSize;

/// Lookup of notes attached to memory addresses
pub trait CodeNoteLookup {
    /// Note covering a read of `size` at `address`
    fn find_note(&self, address: u32, size: MemSize) -> Option<String>;
}

/// A single note as stored in achievement set files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeNote {
    pub address: u32,
    pub note: String,
}

/// Map-backed note store
#[derive(Debug, Clone, Default)]
pub struct CodeNotes {
    notes: BTreeMap<u32, String>,
}

impl CodeNotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: u32, note: impl Into<String>) {
        self.notes.insert(address, note.into());
    }

    pub fn remove(&mut self, address: u32) -> Option<String> {
        self.notes.remove(&address)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

impl FromIterator<CodeNote> for CodeNotes {
    fn from_iter<I: IntoIterator<Item = CodeNote>>(iter: I) -> Self {
        Self {
            notes: iter.into_iter().map(|n| (n.address, n.note)).collect(),
        }
    }
}

impl CodeNoteLookup for CodeNotes {
    fn find_note(&self, address: u32, size: MemSize) -> Option<String> {
        if let Some(note) = self.notes.get(&address) {
            return Some(note.clone());
        }

        // a multi-byte read is described by the first note inside it
        let width = size.byte_width().max(1);
        let end = address.saturating_add(width - 1);
        self.notes
            .range(address..=end)
            .next()
            .map(|(_, note)| note.clone())
    }
}
