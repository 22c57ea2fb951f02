//! Alert state machine
//!
//! Rules describe what to watch, [`AlertBook`] evaluates them for one pair
//! and keeps the sequence gates, [`CooldownLedger`] deduplicates sends across
//! pairs and [`Dispatcher`] hands surviving alerts to a [`Notifier`].

pub mod book;
pub mod cooldown;
pub mod dispatch;
pub mod gate;
pub mod rules;

pub use book::*;
pub use cooldown::*;
pub use dispatch::*;
pub use gate::*;
pub use rules::*;
