//! Error types for the geoaddress CLI

use geoaddress_core::adapter::FixtureError;
use geoaddress_core::config::ConfigSourceError;
use geoaddress_core::DispatchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File access or I/O error
    #[error("File error: {0}")]
    FileError(String),

    /// A fixture, bundle or response file could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Dispatch rejected the request before any provider ran
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl CliError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        CliError::InvalidInput(msg.into())
    }

    pub fn file_error(msg: impl Into<String>) -> Self {
        CliError::FileError(msg.into())
    }

    /// Check if this is a user-facing error (vs internal)
    pub fn is_user_error(&self) -> bool {
        match self {
            CliError::InvalidInput(_) | CliError::FileError(_) | CliError::ParseError(_) => true,
            CliError::Dispatch(e) => e.is_user_error(),
            CliError::SerializationError(_) => false,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::FileError(err.to_string())
    }
}

impl From<ConfigSourceError> for CliError {
    fn from(err: ConfigSourceError) -> Self {
        match err {
            ConfigSourceError::Io(msg) => CliError::FileError(msg),
            other => CliError::ParseError(other.to_string()),
        }
    }
}

impl From<FixtureError> for CliError {
    fn from(err: FixtureError) -> Self {
        match err {
            FixtureError::Io { .. } => CliError::FileError(err.to_string()),
            FixtureError::Parse(_) | FixtureError::UnknownOperation(_) => {
                CliError::ParseError(err.to_string())
            }
        }
    }
}
