//! Error types shared across the engine

use thiserror::Error;

/// Errors raised by the oscillator library
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("indicator length must be greater than zero")]
    InvalidLength,
    #[error("unknown moving average type: {0}")]
    UnknownMaType(String),
    #[error("{kind} needs a volume series")]
    MissingVolume { kind: &'static str },
    #[error("volume series has {actual} samples, expected {expected}")]
    VolumeMismatch { expected: usize, actual: usize },
    #[error("series has a gap at index {0} after its warm-up prefix")]
    Gap(usize),
}

/// Errors raised while validating or storing bars
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("malformed bar: missing or non-finite {0}")]
    Malformed(&'static str),
    #[error("bar at {got} is older than the newest stored bar at {newest}")]
    OutOfOrder { newest: i64, got: i64 },
}

/// Errors raised by a pair engine or the registry
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Indicator(#[from] IndicatorError),
    #[error("pair {symbol}:{timeframe} is not registered")]
    UnknownPair { symbol: String, timeframe: String },
}

/// Errors surfaced by a historical bar loader
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected response: {0}")]
    Response(String),
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<LoaderError>,
    },
}

/// Errors surfaced by a notification sender
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),
}

/// Errors raised while loading or validating engine configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid alert rules: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("profile {0} has a zero length")]
    InvalidProfile(String),
    #[error("duplicate profile name: {0}")]
    DuplicateProfile(String),
    #[error("rule {rule} references unknown profile {profile}")]
    UnknownProfile { rule: String, profile: String },
    #[error("sequence rule {0} has no stages")]
    EmptySequence(String),
    #[error("candle limit {limit} is below the required history of {required} bars")]
    CapacityTooSmall { limit: usize, required: usize },
}
