//! Technical indicators module
//!
//! RSI, the moving average family (including the adaptive VAR smoother) and
//! the MOST trailing line. Every function takes the full series and returns
//! one value per input bar, so a recompute is a pure function of the window.

pub mod ma;
pub mod most;
pub mod rsi;
pub mod var;

pub use ma::*;
pub use most::*;
pub use rsi::*;
pub use var::*;
