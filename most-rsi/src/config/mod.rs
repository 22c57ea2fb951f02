//! Configuration module

pub mod settings;
pub mod profile;

pub use settings::*;
pub use profile::*;
