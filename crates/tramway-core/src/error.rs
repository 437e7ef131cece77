//! Error handling for the tramway core
//!
//! Domain faults ([`Fault`]) are the errors most operations return. This
//! module adds the unified [`Error`] used where faults meet infrastructure,
//! such as assembling a tramway from configuration.
//!
//! All error types use `thiserror`.

use thiserror::Error;

use crate::fault::{Fault, FaultKind, Severity};

/// Main error type for the tramway
#[derive(Error, Debug)]
pub enum Error {
    /// A domain fault
    #[error(transparent)]
    Fault(#[from] Fault),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// The wrapped fault, if any
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Error::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Check if this is a configuration (wiring) fault
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Fault(f) if f.kind == FaultKind::Config)
    }

    /// Check if this is a fatal fault
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Fault(f) if f.severity == Severity::Fatal)
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for operations that fail with a domain fault
pub type FaultResult<T> = std::result::Result<T, Fault>;
