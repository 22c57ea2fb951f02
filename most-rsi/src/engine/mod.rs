//! Streaming engine
//!
//! [`PairEngine`] runs the bar -> recompute -> evaluate cycle for one pair;
//! [`EngineRegistry`] owns the engines and their lifecycle.

pub mod pair;
pub mod registry;
pub mod snapshot;

pub use pair::*;
pub use registry::*;
pub use snapshot::*;
