//! Error types for vlansweep.

use std::io;
use thiserror::Error;

/// Main error type for vlansweep operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration loading/validation errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Cleanup execution errors
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Report serialization/output errors
    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

/// Transport layer errors (SSH connection, authentication, CLI scraping).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Privilege elevation (enable mode) failed
    #[error("Privilege elevation failed: {0}")]
    ElevationFailed(String),

    /// Session was closed unexpectedly
    #[error("Session disconnected")]
    Disconnected,

    /// Prompt was not seen within the timeout
    #[error("Prompt not found within {0:?}")]
    PromptTimeout(std::time::Duration),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration errors. These are fatal to starting a run and are
/// surfaced before any device is contacted.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Settings file could not be read
    #[error("Cannot read settings file '{path}': {source}")]
    Unreadable {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Settings file could not be parsed
    #[error("Cannot parse settings file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A required field is missing or empty
    #[error("Invalid settings: {message}")]
    Invalid { message: String },
}

/// Errors from the cleanup execution path.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// Execution was requested on an analyzer built for analysis only
    #[error("Refusing to execute cleanup in dry-run mode")]
    DryRun,

    /// Execution was requested without any analysis results
    #[error("No analysis results available for cleanup execution")]
    NoResults,
}

/// Errors from report output.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Report file could not be written
    #[error("Cannot write report '{path}': {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Report document could not be serialized
    #[error("Cannot serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias using vlansweep's Error.
pub type Result<T> = std::result::Result<T, Error>;
