use std::io;

use thiserror::Error;

/// Provides `SeirError` and maps other errors to
/// convert to a `SeirError`
#[derive(Error, Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum SeirError {
    #[error("io error: {0}")]
    IoError(#[from] io::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    CsvError(#[from] csv::Error),

    /// Invalid `SimulationParameters`, surfaced before any tick runs.
    #[error("invalid configuration: {0}")]
    ConfigurationError(String),

    /// An internal consistency check failed. The run cannot continue.
    #[error("invariant violated at tick {tick}: {message}")]
    InvariantViolation {
        tick: u64,
        message: String,
        /// JSON dump of every agent at the point of failure.
        state_dump: String,
    },

    #[error("report error: {0}")]
    ReportError(String),
}

impl SeirError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        SeirError::ConfigurationError(message.into())
    }
}

pub type Result<T> = std::result::Result<T, SeirError>;
