//! VirtualizationEngine - windowed view over a growing record list.
//!
//! Tracks one row per buffered record. Rows start at an estimated height and are
//! corrected when the host reports the measured (rendered) height. A Fenwick tree
//! keeps prefix sums so window queries and corrections are O(log n).
//!
//! Following the newest record is an explicit policy: [`follow_tail`] pins the view
//! to the bottom and any user scroll unpins it. While pinned, every window is computed
//! from the bottom, so appends are followed automatically.
//!
//! [`follow_tail`]: VirtualizationEngine::follow_tail

use super::height_index::HeightIndex;
use super::scroll::ScrollPosition;
use super::types::{Overscan, RowHeight};
use super::window::{ViewportWindow, WindowBounds};
use crate::model::{ConfigurationError, Sequence};
use std::collections::HashMap;

/// Engine parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineSettings {
    /// Height assumed for rows that have not been measured yet.
    pub estimated_row_height: RowHeight,
    /// Extra rows above and below the visible range.
    pub overscan: Overscan,
}

impl EngineSettings {
    /// Validate raw parameters.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::ZeroRowHeight`] if the estimate is zero.
    pub fn new(estimated_row_height: u16, overscan: usize) -> Result<Self, ConfigurationError> {
        Ok(Self {
            estimated_row_height: RowHeight::new(estimated_row_height)?,
            overscan: Overscan::new(overscan),
        })
    }
}

/// Snapshot of the engine's per-row bookkeeping.
#[derive(Debug, Clone, Copy)]
pub struct BufferState<'a> {
    /// Number of tracked rows.
    pub count: usize,
    /// Sum of all row heights (estimated or measured).
    pub total_height: usize,
    /// Measured heights by sequence. Rows absent here use the estimate.
    pub height_cache: &'a HashMap<Sequence, RowHeight>,
}

/// Windowed view over the rows of one buffer.
///
/// # Invariants
/// - Row `i` corresponds to sequence `first_sequence + i`
/// - `measured` only holds sequences of tracked rows
#[derive(Debug, Clone)]
pub struct VirtualizationEngine {
    heights: HeightIndex,
    first_sequence: Option<Sequence>,
    measured: HashMap<Sequence, RowHeight>,
    settings: EngineSettings,
    scroll_offset: usize,
    viewport_height: usize,
    pinned: bool,
}

impl Default for VirtualizationEngine {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

impl VirtualizationEngine {
    /// Create an engine with no rows, pinned to the tail.
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            heights: HeightIndex::new(64),
            first_sequence: None,
            measured: HashMap::new(),
            settings,
            scroll_offset: 0,
            viewport_height: 0,
            pinned: true,
        }
    }

    /// Current parameters.
    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    /// Track a newly appended record at the estimated height.
    ///
    /// Sequences must be pushed in the order the buffer assigned them.
    pub fn push_row(&mut self, sequence: Sequence) {
        match self.first_sequence {
            None => self.first_sequence = Some(sequence),
            Some(first) => debug_assert_eq!(
                sequence.get(),
                first.get() + self.heights.len() as u64,
                "rows must be pushed in sequence order"
            ),
        }
        self.heights
            .push(self.settings.estimated_row_height.as_usize());
    }

    /// Replace a row's height with its measured value.
    ///
    /// Returns `Ok(false)` when the sequence is not tracked (never pushed,
    /// evicted, or cleared). `total_size` changes by exactly
    /// `height - previous`. When the user has scrolled away from the tail and
    /// the row starts above the scroll offset, the offset moves by the same
    /// amount so the rows on screen stay put.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::ZeroRowHeight`] if `height` is zero.
    pub fn report_measured_height(
        &mut self,
        sequence: Sequence,
        height: u16,
    ) -> Result<bool, ConfigurationError> {
        let height = RowHeight::new(height)?;
        let Some(index) = self.index_of(sequence) else {
            return Ok(false);
        };

        let previous = self.heights.set(index, height.as_usize());
        self.measured.insert(sequence, height);

        if !self.pinned && self.heights.offset_of(index) < self.scroll_offset {
            self.scroll_offset = (self.scroll_offset + height.as_usize()).saturating_sub(previous);
        }
        Ok(true)
    }

    /// Forget every measurement and fall back to the estimate.
    ///
    /// Used when the render width changes and wrapped heights are stale.
    pub fn reset_measurements(&mut self) {
        let estimate = self.settings.estimated_row_height.as_usize();
        for sequence in std::mem::take(&mut self.measured).into_keys() {
            if let Some(index) = self.index_of(sequence) {
                self.heights.set(index, estimate);
            }
        }
    }

    /// Compute the window for a viewport of `viewport_height` lines.
    ///
    /// Records the viewport height for subsequent scroll operations. `None`
    /// when no rows are tracked.
    pub fn window(&mut self, viewport_height: usize) -> Option<ViewportWindow> {
        self.viewport_height = viewport_height;
        let len = self.heights.len();
        if len == 0 {
            return None;
        }

        let total = self.heights.total();
        let offset = self.effective_offset();
        if !self.pinned {
            self.scroll_offset = offset;
        }
        let end = offset + viewport_height.max(1);

        let bounds = WindowBounds {
            first: self.heights.lower_bound(offset).unwrap_or(len - 1),
            last: self.heights.lower_bound(end - 1).unwrap_or(len - 1),
            len,
        };
        let range = bounds.with_overscan(self.settings.overscan);

        let mut row_offsets = Vec::with_capacity(range.clone().count());
        let mut start = self.heights.offset_of(*range.start());
        for index in range.clone() {
            row_offsets.push(start);
            start += self.heights.height(index);
        }

        Some(ViewportWindow {
            first_visible_index: *range.start(),
            last_visible_index: *range.end(),
            row_offsets,
            total_size: total,
            scroll_offset: offset,
            viewport_height,
        })
    }

    /// Pin the view to the newest row.
    pub fn follow_tail(&mut self) {
        self.pinned = true;
    }

    /// Whether the view follows the newest row.
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Jump to a position. Unpins the view.
    pub fn scroll_to(&mut self, position: ScrollPosition) {
        let offset = position.resolve(self.heights.total(), self.viewport_height, |sequence| {
            self.index_of(sequence)
                .map(|index| self.heights.offset_of(index))
        });
        self.scroll_offset = offset;
        self.pinned = false;
    }

    /// Scroll by `delta` lines (negative is up). Unpins the view.
    pub fn scroll_by(&mut self, delta: isize) {
        let offset = self
            .effective_offset()
            .saturating_add_signed(delta)
            .min(self.max_offset());
        self.scroll_offset = offset;
        self.pinned = false;
    }

    /// Effective scroll offset for the last viewport height seen.
    pub fn scroll_offset(&self) -> usize {
        self.effective_offset()
    }

    /// Drop the `count` oldest rows (buffer eviction).
    ///
    /// Purges their measured heights and moves the scroll offset up by the
    /// removed height so the rows on screen stay put.
    pub fn evict_front(&mut self, count: usize) {
        let Some(first) = self.first_sequence else {
            return;
        };
        let count = count.min(self.heights.len());
        if count == 0 {
            return;
        }

        let removed = self.heights.remove_front(count);
        let new_first = Sequence::new(first.get() + count as u64);
        self.measured.retain(|sequence, _| *sequence >= new_first);
        self.first_sequence = (!self.heights.is_empty()).then_some(new_first);
        self.scroll_offset = self.scroll_offset.saturating_sub(removed);
    }

    /// Drop every row. The pinned flag is kept.
    pub fn clear(&mut self) {
        self.heights.clear();
        self.first_sequence = None;
        self.measured.clear();
        self.scroll_offset = 0;
    }

    /// Number of tracked rows.
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    /// True when no rows are tracked.
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Sum of all row heights.
    pub fn total_size(&self) -> usize {
        self.heights.total()
    }

    /// Current height of a tracked row.
    pub fn row_height(&self, sequence: Sequence) -> Option<usize> {
        self.index_of(sequence).map(|index| self.heights.height(index))
    }

    /// Per-row bookkeeping snapshot.
    pub fn buffer_state(&self) -> BufferState<'_> {
        BufferState {
            count: self.heights.len(),
            total_height: self.heights.total(),
            height_cache: &self.measured,
        }
    }

    fn index_of(&self, sequence: Sequence) -> Option<usize> {
        let first = self.first_sequence?;
        let index = usize::try_from(sequence.get().checked_sub(first.get())?).ok()?;
        (index < self.heights.len()).then_some(index)
    }

    fn max_offset(&self) -> usize {
        self.heights.total().saturating_sub(self.viewport_height)
    }

    fn effective_offset(&self) -> usize {
        if self.pinned {
            self.max_offset()
        } else {
            self.scroll_offset.min(self.max_offset())
        }
    }
}

#[cfg(test)]
#[path = "virtualizer_tests.rs"]
mod tests;
