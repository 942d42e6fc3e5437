//! Ordered, append-only store of decoded log records.
//!
//! `LogBuffer` assigns each appended record the next [`Sequence`] and keeps
//! records in arrival order. Appending is O(1) amortized and lookup by either
//! sequence or index is O(1).
//!
//! In bounded mode the oldest records are evicted once the buffer grows past
//! its limit. The evicted sequences are reported to the caller so anything
//! keyed by sequence (measured heights, scroll anchors) can be purged too.

use crate::model::{ConfigurationError, LogRecord, Sequence, SequencedRecord};
use std::collections::VecDeque;
use std::num::NonZeroUsize;

/// Result of an append in bounded mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Append {
    /// Sequence assigned to the appended record.
    pub sequence: Sequence,
    /// Number of records evicted from the front to make room.
    pub evicted: usize,
}

/// Append-only record store.
///
/// Invariant: sequences of stored records are contiguous and strictly
/// increasing from front to back.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    records: VecDeque<SequencedRecord>,
    next_sequence: Sequence,
    limit: Option<NonZeroUsize>,
}

impl LogBuffer {
    /// Create an unbounded buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer that keeps at most `limit` records.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::ZeroCapacity`] if `limit` is zero.
    pub fn with_capacity_limit(limit: usize) -> Result<Self, ConfigurationError> {
        let limit = NonZeroUsize::new(limit).ok_or(ConfigurationError::ZeroCapacity)?;
        Ok(Self {
            limit: Some(limit),
            ..Self::default()
        })
    }

    /// Maximum number of retained records, if bounded.
    pub fn capacity_limit(&self) -> Option<usize> {
        self.limit.map(NonZeroUsize::get)
    }

    /// Append a record and return its sequence.
    ///
    /// In bounded mode this may evict; use [`append_evicting`](Self::append_evicting)
    /// when the caller needs to know how many records were dropped.
    pub fn append(&mut self, record: LogRecord) -> Sequence {
        self.append_evicting(record).sequence
    }

    /// Append a record, evicting from the front if the limit is exceeded.
    pub fn append_evicting(&mut self, record: LogRecord) -> Append {
        let sequence = self.next_sequence;
        self.next_sequence = sequence.next();
        self.records.push_back(SequencedRecord::new(sequence, record));

        let evicted = match self.limit {
            Some(limit) if self.records.len() > limit.get() => {
                let excess = self.records.len() - limit.get();
                self.records.drain(..excess);
                excess
            }
            _ => 0,
        };

        Append { sequence, evicted }
    }

    /// Look up a record by sequence. `None` for evicted, cleared or future sequences.
    pub fn get(&self, sequence: Sequence) -> Option<&LogRecord> {
        self.index_of(sequence)
            .and_then(|index| self.records.get(index))
            .map(SequencedRecord::record)
    }

    /// Look up a record by its current position (0 = oldest retained).
    pub fn get_index(&self, index: usize) -> Option<&SequencedRecord> {
        self.records.get(index)
    }

    /// Current position of a sequence, if it is still retained.
    pub fn index_of(&self, sequence: Sequence) -> Option<usize> {
        let first = self.first_sequence()?;
        let offset = sequence.get().checked_sub(first.get())?;
        let index = usize::try_from(offset).ok()?;
        (index < self.records.len()).then_some(index)
    }

    /// Sequence of the oldest retained record.
    pub fn first_sequence(&self) -> Option<Sequence> {
        self.records.front().map(SequencedRecord::sequence)
    }

    /// Sequence the next append will receive.
    pub fn next_sequence(&self) -> Sequence {
        self.next_sequence
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records are retained.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record. Sequence numbering continues where it left off.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Retained records, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SequencedRecord> + ExactSizeIterator {
        self.records.iter()
    }
}
