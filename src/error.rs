// src/error.rs

//! Crate-wide error type

use thiserror::Error;

/// Errors raised by the library outside of the reconciliation core
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem or process I/O failed
    #[error("I/O error: {0}")]
    IoError(String),

    /// Malformed input (tool output, os-release, device path)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A referenced item does not exist
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A path cannot be expressed in the requested encoding
    #[error("Invalid path: {0}")]
    PathError(String),

    /// The firmware boot variable store could not be read
    #[error("Failed to query UEFI boot entries: {0}")]
    FirmwareQueryError(String),

    /// A firmware boot variable could not be written or deleted
    #[error("Failed to modify UEFI boot entries: {0}")]
    FirmwareWriteError(String),

    /// Another process holds the conversion lock
    #[error("Lock held: {0}")]
    LockHeld(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias for library operations
pub type Result<T> = std::result::Result<T, Error>;
