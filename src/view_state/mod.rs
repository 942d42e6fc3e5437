//! View-state layer - row heights, scrolling, and window computation
//!
//! This module decides which buffered records are eligible for rendering. It has no
//! knowledge of the terminal: the host reports measured heights and asks for windows.
//!
//! # Module Structure
//!
//! - `types`: Core newtypes (RowHeight, Overscan, ViewportDimensions)
//! - `height_index`: HeightIndex - O(log n) prefix sums via Fenwick tree
//! - `scroll`: ScrollPosition - semantic scroll position enum
//! - `window`: ViewportWindow and the linear reference `compute_window`
//! - `virtualizer`: VirtualizationEngine - indexed windows, measurement, tail pinning

pub mod height_index;
pub mod scroll;
pub mod types;
pub mod virtualizer;
pub mod window;

pub use scroll::ScrollPosition;
pub use types::{Overscan, RowHeight, ViewportDimensions};
pub use virtualizer::{BufferState, EngineSettings, VirtualizationEngine};
pub use window::{compute_window, ViewportWindow};
