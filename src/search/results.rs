//! Search result sets

use std::sync::Arc;

use super::{parse_filter_value, ComparisonType, SearchFilterType, SearchType, DEFAULT_BLOCK_SIZE};
use crate::config::EngineConfig;
use crate::error::SearchError;
use crate::memory::{decode_float, read_range, read_value, MemSize, MemoryBlock, MemoryReader};
use crate::triggers::TypedValue;

/// One surviving candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchMatch {
    pub address: u32,
    pub size: MemSize,
    /// Value in the snapshot taken when the result set was built
    pub value: TypedValue,
}

/// The filter that produced a result set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedFilter {
    pub comparison: ComparisonType,
    pub filter_type: SearchFilterType,
    pub value: TypedValue,
}

/// Candidate addresses plus the memory captured when they were selected.
///
/// Candidates are kept as sorted keys. Exclusions only flip a bit; the key
/// list is compacted on the next indexed access.
#[derive(Debug, Clone)]
pub struct SearchResults {
    search_type: SearchType,
    block_size: usize,
    initial: Arc<MemoryBlock>,
    memory: Arc<MemoryBlock>,
    keys: Vec<u64>,
    excluded: Vec<u64>,
    excluded_count: usize,
    filter: Option<AppliedFilter>,
}

impl SearchResults {
    /// Capture `length` bytes at `start`; every address that can hold a
    /// full value of `search_type` is a candidate
    pub fn initialize(reader: &dyn MemoryReader, start: u32, length: u32, search_type: SearchType) -> Self {
        Self::initialize_with_block_size(reader, start, length, search_type, DEFAULT_BLOCK_SIZE)
    }

    /// Capture using the chunk size from `config`
    pub fn initialize_with_config(
        reader: &dyn MemoryReader,
        start: u32,
        length: u32,
        search_type: SearchType,
        config: &EngineConfig,
    ) -> Self {
        Self::initialize_with_block_size(reader, start, length, search_type, config.search_block_size)
    }

    pub fn initialize_with_block_size(
        reader: &dyn MemoryReader,
        start: u32,
        length: u32,
        search_type: SearchType,
        block_size: usize,
    ) -> Self {
        let block_size = block_size.max(1);
        let mut memory = MemoryBlock::new(length as usize).with_base(start);
        let mut offset = 0usize;
        while offset < length as usize {
            let n = (length as usize - offset).min(block_size);
            let address = start.wrapping_add(offset as u32);
            memory.write_bytes(address, &read_range(reader, address, n));
            offset += n;
        }

        let stride = search_type.stride();
        let last = length.saturating_sub(search_type.padding());
        let mut keys = Vec::new();
        if length > search_type.padding() {
            let first = (start.wrapping_add(stride - 1) / stride * stride).wrapping_sub(start);
            for offset in (first..last).step_by(stride as usize) {
                let address = start.wrapping_add(offset);
                keys.push(search_type.key(address, false));
                if search_type == SearchType::FourBit {
                    keys.push(search_type.key(address, true));
                }
            }
        }

        log::info!(
            "search initialized: {} candidates ({}) at 0x{:x}",
            keys.len(),
            search_type.description(),
            start
        );

        let memory = Arc::new(memory);
        Self {
            search_type,
            block_size,
            initial: Arc::clone(&memory),
            memory,
            excluded: vec![0; keys.len().div_ceil(64)],
            keys,
            excluded_count: 0,
            filter: None,
        }
    }

    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    /// Filter this result set was derived with, `None` for the initial one
    pub fn filter_applied(&self) -> Option<AppliedFilter> {
        self.filter
    }

    pub fn matching_address_count(&self) -> usize {
        self.keys.len() - self.excluded_count
    }

    /// Candidate by index in address order
    pub fn get_matching_address(&mut self, index: usize) -> Option<SearchMatch> {
        self.compact();
        let key = *self.keys.get(index)?;
        Some(self.match_for(key))
    }

    /// Whether `address` is still a candidate (either nibble for
    /// four-bit searches)
    pub fn contains_address(&self, address: u32) -> bool {
        self.positions(address).any(|i| !self.is_excluded(i))
    }

    /// Remove one candidate. Returns false if it was not a candidate.
    pub fn exclude_result(&mut self, result: &SearchMatch) -> bool {
        let key = self.search_type.key(result.address, result.size == MemSize::HighNibble);
        match self.keys.binary_search(&key) {
            Ok(index) => self.exclude_index(index),
            Err(_) => false,
        }
    }

    /// Remove every candidate at `address`
    pub fn exclude_address(&mut self, address: u32) -> bool {
        let positions: Vec<usize> = self.positions(address).collect();
        positions.into_iter().fold(false, |any, i| self.exclude_index(i) | any)
    }

    /// Surviving candidates in address order
    pub fn matches(&self) -> impl Iterator<Item = SearchMatch> + '_ {
        self.live_keys().map(move |key| self.match_for(key))
    }

    /// Keep candidates whose current value passes the comparison
    pub fn filter(
        &self,
        reader: &dyn MemoryReader,
        comparison: ComparisonType,
        filter_type: SearchFilterType,
        value: &str,
    ) -> Result<SearchResults, SearchError> {
        self.filter_with_progress(reader, comparison, filter_type, value, |_, _| true)
    }

    /// Like [`filter`](Self::filter), reporting `(processed, total)` bytes
    /// after every captured chunk. Returning false from `progress` stops the
    /// pass with [`SearchError::Cancelled`]; `self` is left untouched.
    pub fn filter_with_progress<F>(
        &self,
        reader: &dyn MemoryReader,
        comparison: ComparisonType,
        filter_type: SearchFilterType,
        value: &str,
        mut progress: F,
    ) -> Result<SearchResults, SearchError>
    where
        F: FnMut(usize, usize) -> bool,
    {
        let filter_value = if filter_type.takes_value() {
            parse_filter_value(value, self.search_type).inspect_err(|e| log::warn!("{}", e))?
        } else {
            TypedValue::default()
        };
        let operator = comparison.operator();

        let candidates: Vec<u64> = self.live_keys().collect();
        let padding = self.search_type.padding() as u64;
        let (base, total) = match (candidates.first(), candidates.last()) {
            (Some(&first), Some(&last)) => {
                let first = self.search_type.locate(first).0;
                let last = self.search_type.locate(last).0;
                (first, (last as u64 - first as u64 + padding + 1) as usize)
            }
            _ => (self.memory.base(), 0),
        };

        let mut memory = MemoryBlock::new(total).with_base(base);
        let mut keys = Vec::new();
        let mut cursor = 0;
        let mut processed = 0;

        while processed < total {
            let n = (total - processed).min(self.block_size);
            let address = base.wrapping_add(processed as u32);
            memory.write_bytes(address, &read_range(reader, address, n));
            processed += n;

            let captured_end = base as u64 + processed as u64;
            while let Some(&key) = candidates.get(cursor) {
                let (address, size) = self.search_type.locate(key);
                if address as u64 + padding >= captured_end {
                    break;
                }

                let current = read_typed(&memory, address, size);
                let previous = || read_typed(&*self.memory, address, size);
                let reference = match filter_type {
                    SearchFilterType::Constant => filter_value,
                    SearchFilterType::LastKnownValue => previous(),
                    SearchFilterType::LastKnownValuePlus => previous().wrapping_add(filter_value),
                    SearchFilterType::LastKnownValueMinus => previous().wrapping_sub(filter_value),
                    SearchFilterType::InitialValue => read_typed(&*self.initial, address, size),
                };
                if current.compare(operator, reference) {
                    keys.push(key);
                }
                cursor += 1;
            }

            if !progress(processed, total) {
                log::debug!("search cancelled at {}/{} bytes", processed, total);
                return Err(SearchError::Cancelled { processed, total });
            }
        }

        log::info!(
            "search filtered: {} of {} candidates remain",
            keys.len(),
            candidates.len()
        );

        Ok(SearchResults {
            search_type: self.search_type,
            block_size: self.block_size,
            initial: Arc::clone(&self.initial),
            memory: Arc::new(memory),
            excluded: vec![0; keys.len().div_ceil(64)],
            keys,
            excluded_count: 0,
            filter: Some(AppliedFilter {
                comparison,
                filter_type,
                value: filter_value,
            }),
        })
    }

    fn match_for(&self, key: u64) -> SearchMatch {
        let (address, size) = self.search_type.locate(key);
        SearchMatch {
            address,
            size,
            value: read_typed(&*self.memory, address, size),
        }
    }

    fn live_keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.keys
            .iter()
            .enumerate()
            .filter(move |(i, _)| !self.is_excluded(*i))
            .map(|(_, &key)| key)
    }

    /// Indices of the keys at a real address
    fn positions(&self, address: u32) -> impl Iterator<Item = usize> + '_ {
        let low = self.search_type.key(address, false);
        let high = self.search_type.key(address, self.search_type == SearchType::FourBit);
        let start = self.keys.partition_point(|&k| k < low);
        let end = self.keys.partition_point(|&k| k <= high);
        start..end
    }

    fn is_excluded(&self, index: usize) -> bool {
        self.excluded[index / 64] & (1 << (index % 64)) != 0
    }

    fn exclude_index(&mut self, index: usize) -> bool {
        if self.is_excluded(index) {
            return false;
        }
        self.excluded[index / 64] |= 1 << (index % 64);
        self.excluded_count += 1;
        true
    }

    fn compact(&mut self) {
        if self.excluded_count == 0 {
            return;
        }
        let keys: Vec<u64> = self.live_keys().collect();
        self.excluded = vec![0; keys.len().div_ceil(64)];
        self.keys = keys;
        self.excluded_count = 0;
    }
}

fn read_typed(memory: &MemoryBlock, address: u32, size: MemSize) -> TypedValue {
    let raw = read_value(memory, address, size);
    if size.is_float() {
        TypedValue::Float(decode_float(raw, size))
    } else {
        TypedValue::Unsigned(raw)
    }
}
