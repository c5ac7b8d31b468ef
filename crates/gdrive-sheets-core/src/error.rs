//! Error types for gdrive-sheets-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gdrive-sheets-core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed cell name (e.g. "2A", "A0", "$A$1")
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Value contains a character that cannot be serialized
    #[error("Invalid value for cell R{row}C{col}: {reason}")]
    InvalidCellValue { row: u32, col: u32, reason: String },

    /// Named-column lookup found no matching header in row 1
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Row/column parameters exceed the declared bounds
    #[error("Out of range: {0}")]
    OutOfRange(String),
}

impl Error {
    /// Create an [`Error::OutOfRange`] with a message
    pub fn out_of_range<S: Into<String>>(msg: S) -> Self {
        Error::OutOfRange(msg.into())
    }
}
