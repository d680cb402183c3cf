//! Error types for rekordusb-core

use std::panic::Location;

use thiserror::Error;

/// Error taxonomy for database and analysis-file operations.
///
/// `open` failures surface as `FileNotFound`, `InvalidFileFormat`, or
/// `IoError`; `CorruptedData` covers structures that point outside the
/// buffer. The remaining kinds exist for caller-facing lookups and future
/// growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileNotFound,
    InvalidFileFormat,
    CorruptedData,
    IoError,
    TableNotFound,
    RowNotFound,
    InvalidParameter,
    OutOfMemory,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::InvalidFileFormat => "InvalidFileFormat",
            ErrorKind::CorruptedData => "CorruptedData",
            ErrorKind::IoError => "IoError",
            ErrorKind::TableNotFound => "TableNotFound",
            ErrorKind::RowNotFound => "RowNotFound",
            ErrorKind::InvalidParameter => "InvalidParameter",
            ErrorKind::OutOfMemory => "OutOfMemory",
            ErrorKind::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error value carrying kind, message, and the source location where it was
/// constructed.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message} ({file}:{line})")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub file: &'static str,
    pub line: u32,
}

impl Error {
    #[track_caller]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let loc = Location::caller();
        Self {
            kind,
            message: message.into(),
            file: loc.file(),
            line: loc.line(),
        }
    }

    /// `file:line` of the construction site, for structured log records.
    pub fn source_location(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }

    /// Map an I/O failure onto the taxonomy: a missing path is
    /// `FileNotFound`, everything else `IoError`.
    #[track_caller]
    pub fn from_io(err: std::io::Error, path: &std::path::Path) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            _ => ErrorKind::IoError,
        };
        Self::new(kind, format!("{}: {}", path.display(), err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
