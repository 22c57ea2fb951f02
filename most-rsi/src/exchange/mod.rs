//! Exchange collaborator boundary
//!
//! The engine never talks to an exchange directly; binaries plug in a
//! [`HistoricalLoader`] and wrap it in a [`RetryPolicy`].

pub mod loader;

pub use loader::*;
