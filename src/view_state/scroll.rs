//! Semantic scroll position

use crate::model::Sequence;

/// Semantic scroll target within the record list.
///
/// A sum type that preserves scroll intent across height changes:
/// - `Top`: Always shows from line 0
/// - `Bottom`: Shows the last lines in the viewport (one-shot; see `follow_tail` for pinning)
/// - `AtLine`: Specific absolute line offset
/// - `AtRecord`: Bring a specific record to the top of the viewport
/// - `Fraction`: Proportional position (for a scrollbar or percentage jump)
///
/// # Clamping Behavior
/// Every variant resolves into `[0, max(0, total_height - viewport_height)]`,
/// so a resolved position never shows a blank viewport below the content.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScrollPosition {
    /// View from the very top (line 0).
    #[default]
    Top,

    /// View from the very bottom.
    /// Resolves to: total_height - viewport_height (clamped to 0).
    Bottom,

    /// Specific line offset from top.
    AtLine(usize),

    /// Keep a specific record at the top of the viewport.
    /// If the record is no longer buffered, resolves to the top.
    AtRecord {
        /// Sequence of the record.
        sequence: Sequence,
        /// Line offset within the record (0 = first line).
        line_in_record: usize,
    },

    /// Fractional position (0.0 = top, 1.0 = bottom).
    /// Clamped to [0.0, 1.0] on resolution.
    Fraction(f64),
}

impl ScrollPosition {
    /// Resolve to an absolute line offset.
    ///
    /// # Arguments
    /// - `total_height`: Total height of content in lines
    /// - `viewport_height`: Height of viewport in lines
    /// - `record_offset`: Start offset of a record by sequence, if buffered
    pub fn resolve<F>(&self, total_height: usize, viewport_height: usize, record_offset: F) -> usize
    where
        F: Fn(Sequence) -> Option<usize>,
    {
        let max_offset = total_height.saturating_sub(viewport_height);
        let wanted = match self {
            Self::Top => 0,
            Self::Bottom => max_offset,
            Self::AtLine(offset) => *offset,
            Self::AtRecord {
                sequence,
                line_in_record,
            } => record_offset(*sequence)
                .map(|start| start.saturating_add(*line_in_record))
                .unwrap_or(0),
            Self::Fraction(fraction) => {
                let fraction = if fraction.is_nan() {
                    0.0
                } else {
                    fraction.clamp(0.0, 1.0)
                };
                (fraction * max_offset as f64).round() as usize
            }
        };
        wanted.min(max_offset)
    }

    /// Create an `AtRecord` position for the first line of a record.
    pub fn at_record(sequence: Sequence) -> Self {
        Self::AtRecord {
            sequence,
            line_in_record: 0,
        }
    }
}
