//! Error types for the protocol core.

use thiserror::Error;

/// Result type alias for protocol core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during protocol core operations.
///
/// Every error is returned straight to the immediate caller; nothing in this
/// crate retries or suppresses a failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed or empty input to a pure function.
    ///
    /// The payload names the offending input, e.g. `"secret is empty"`.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Requested derived-key length exceeds what HKDF expansion can produce.
    #[error("invalid output length {requested} (maximum is {max})")]
    InvalidOutputLength {
        /// Length the caller asked for
        requested: usize,
        /// Largest length the expansion step can produce
        max: usize,
    },

    /// Configuration failed to parse or validate
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::InvalidConfig(err.message().to_owned())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(_: base64::DecodeError) -> Self {
        Error::InvalidInput("malformed base64")
    }
}
