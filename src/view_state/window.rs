//! Viewport window: the index range eligible for rendering.
//!
//! [`compute_window`] is the linear reference computation over an arbitrary
//! height function. The indexed engine in [`super::virtualizer`] produces the
//! same windows in O(log n) per query.

use super::types::Overscan;
use crate::model::ConfigurationError;
use std::ops::RangeInclusive;

/// Rows eligible for rendering, overscan included.
///
/// # Invariants
/// - `first_visible_index <= last_visible_index`
/// - both indices are within `[0, buffer_length)`
/// - `row_offsets` holds one start offset per row in the window, non-decreasing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewportWindow {
    /// Index of the first row in the window (inclusive).
    pub first_visible_index: usize,
    /// Index of the last row in the window (inclusive).
    pub last_visible_index: usize,
    /// Start offset of each row from `first_visible_index` to `last_visible_index`.
    pub row_offsets: Vec<usize>,
    /// Sum of all row heights, for sizing a scroll track.
    pub total_size: usize,
    /// Effective scroll offset after clamping (or after pinning to the tail).
    pub scroll_offset: usize,
    /// Viewport height the window was computed for.
    pub viewport_height: usize,
}

impl ViewportWindow {
    /// Number of rows in the window.
    pub fn len(&self) -> usize {
        self.last_visible_index - self.first_visible_index + 1
    }

    /// Always false: an empty buffer has no window at all.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Row indices in the window, in order.
    pub fn indices(&self) -> RangeInclusive<usize> {
        self.first_visible_index..=self.last_visible_index
    }

    /// Whether a row index falls inside the window.
    pub fn contains(&self, index: usize) -> bool {
        self.indices().contains(&index)
    }

    /// Start offset of a row inside the window.
    pub fn row_offset(&self, index: usize) -> Option<usize> {
        index
            .checked_sub(self.first_visible_index)
            .and_then(|i| self.row_offsets.get(i).copied())
    }

    /// Rows of the viewport the row at `index` starts on, relative to the top.
    ///
    /// Negative when the row starts above the viewport (overscan or partially
    /// scrolled out).
    pub fn viewport_row(&self, index: usize) -> Option<isize> {
        self.row_offset(index)
            .map(|offset| offset as isize - self.scroll_offset as isize)
    }
}

/// Locate the window once the visible rows are known.
pub(crate) struct WindowBounds {
    pub first: usize,
    pub last: usize,
    pub len: usize,
}

impl WindowBounds {
    /// Apply overscan on both ends, clamped to the buffer.
    pub fn with_overscan(&self, overscan: Overscan) -> RangeInclusive<usize> {
        let lo = self.first.saturating_sub(overscan.get());
        let hi = self
            .last
            .saturating_add(overscan.get())
            .min(self.len.saturating_sub(1));
        lo..=hi
    }
}

/// Compute the window over `buffer_length` rows whose heights come from `height_of`.
///
/// The scroll offset is clamped to `[0, total - viewport_height]`. The first
/// visible row is the one containing line `scroll_offset`; the last is the one
/// containing line `scroll_offset + viewport_height - 1`. A zero-height viewport
/// still shows the single row at the offset.
///
/// # Errors
///
/// [`ConfigurationError::ZeroRowHeight`] if any row reports height zero.
///
/// # Examples
///
/// ```
/// use livelog::view_state::{compute_window, Overscan};
///
/// let window = compute_window(3, 2, 10, |_| 1, Overscan::new(1))
///     .unwrap()
///     .expect("non-empty buffer");
/// assert_eq!(window.first_visible_index, 1);
/// assert_eq!(window.last_visible_index, 5);
/// assert_eq!(window.total_size, 10);
/// ```
pub fn compute_window<F>(
    viewport_height: usize,
    scroll_offset: usize,
    buffer_length: usize,
    height_of: F,
    overscan: Overscan,
) -> Result<Option<ViewportWindow>, ConfigurationError>
where
    F: Fn(usize) -> usize,
{
    if buffer_length == 0 {
        return Ok(None);
    }

    let mut starts = Vec::with_capacity(buffer_length);
    let mut total = 0usize;
    for index in 0..buffer_length {
        let height = height_of(index);
        if height == 0 {
            return Err(ConfigurationError::ZeroRowHeight);
        }
        starts.push(total);
        total += height;
    }

    let offset = scroll_offset.min(total.saturating_sub(viewport_height));
    let end = offset + viewport_height.max(1);
    let row_containing = |line: usize| {
        // Last row whose start is <= line.
        starts.partition_point(|&start| start <= line).saturating_sub(1)
    };

    let bounds = WindowBounds {
        first: row_containing(offset),
        last: row_containing(end - 1),
        len: buffer_length,
    };
    let range = bounds.with_overscan(overscan);

    Ok(Some(ViewportWindow {
        first_visible_index: *range.start(),
        last_visible_index: *range.end(),
        row_offsets: starts[range].to_vec(),
        total_size: total,
        scroll_offset: offset,
        viewport_height,
    }))
}
