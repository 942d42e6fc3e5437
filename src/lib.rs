//! livelog
//!
//! Live log stream viewer: connects to a streaming endpoint, decodes
//! compressed log frames, keeps them in a sequenced buffer and paints only the
//! rows inside the viewport window.
//!
//! Pure core (`codec`, `buffer`, `view_state`, `pipeline`) with an impure
//! shell (`session`, `view`).

pub mod buffer;
pub mod codec;
pub mod config;
pub mod demo;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod session;
pub mod view;
pub mod view_state;
