//! Data management module
//!
//! Bars, validation of collaborator input, and the bounded per-pair window.

pub mod candle;
pub mod window;

pub use candle::*;
pub use window::*;
