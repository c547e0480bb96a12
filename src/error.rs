//! Error types for the patching pipeline

use std::io;
use thiserror::Error;

/// Result type alias for patcher operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for patcher operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No source (loose file or archive entry) provides the virtual path
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// No field layout registered for a type table
    #[error("No schema registered for table: {0}")]
    SchemaMissing(String),

    /// A field position matched both a positive and a negative schema mapping
    #[error("Schema conflict in {file}: index {index} of a {width}-field row matches both a positive and a negative mapping")]
    SchemaConflict {
        /// Virtual path of the table being parsed
        file: String,
        /// Field position within the row
        index: usize,
        /// Observed row width
        width: usize,
    },

    /// Append-to-table could not locate the counter header row
    #[error("Header row not found in table: {0}")]
    HeaderNotFound(String),

    /// Append-to-table hit a data row before the counter header row
    #[error("Data row encountered before header row in table: {0}")]
    PrematureData(String),

    /// A mutation would produce output the game engine cannot load
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    /// One or more files failed during write-back
    #[error("Write-back failed for {0} file(s); see log for details")]
    WriteBack(usize),
}

impl Error {
    /// Create a new IntegrityViolation error
    pub fn integrity<S: Into<String>>(msg: S) -> Self {
        Error::IntegrityViolation(msg.into())
    }

    /// Check if this error is recoverable
    ///
    /// A recoverable error skips the operation that caused it (with a
    /// diagnostic) and lets the rest of the run proceed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::FileNotFound(_))
    }
}
