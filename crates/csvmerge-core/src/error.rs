//! Error types for csvmerge-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in csvmerge-core
#[derive(Debug, Error)]
pub enum Error {
    /// Output delimiter argument is not a single character
    #[error("invalid delimiter '{0}': delimiter must be one character")]
    InvalidDelimiter(String),

    /// One or more rename rules are not of the form `source=target`
    #[error("invalid replace pattern(s): {0}")]
    InvalidRenameRule(String),

    /// Path resolution produced no input files
    #[error("no input files found")]
    NoInputFiles,

    /// A file's header line could not be read
    #[error("no header line in '{path}'")]
    EmptyHeader { path: PathBuf },

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the output file
    #[error("failed to write '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
