//! Error types for the runner.

use atcommander::AtError;
use thiserror::Error;

/// Errors that can stop an `atcmd` run.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port could not be opened or configured.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Configuration file did not parse.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    /// Driver level error.
    #[error(transparent)]
    At(#[from] AtError),

    /// No serial port given on the command line or in the config file.
    #[error("no serial port configured (use --port or set `port` in the config file)")]
    NoPort,

    /// The requested operation reported failure.
    #[error("{0} failed")]
    OperationFailed(&'static str),
}

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;
