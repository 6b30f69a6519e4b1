//! Error types for the request migration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a migration run.
///
/// Configuration and store connection failures surface earlier, in `main`.
/// Batch commit failures are not represented here: the writer logs them and
/// carries on.
#[derive(Error, Debug)]
pub enum MigrationError {
    /// An export file could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    FileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An export file is not valid JSON or does not have the expected layout.
    #[error("Failed to parse {}: {reason}", .path.display())]
    ParseError { path: PathBuf, reason: String },

    /// A record lacks one of the schema's fields.
    #[error("{kind} record {record} is missing field `{field}`")]
    MissingField {
        kind: &'static str,
        record: String,
        field: &'static str,
    },

    /// A record's key field cannot be turned into a document id.
    #[error("{kind} record has unusable `{field}` value {value}")]
    InvalidKey {
        kind: &'static str,
        field: &'static str,
        value: String,
    },
}

impl MigrationError {
    /// Create a parse error for the given file.
    pub fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ParseError {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Errors from reading configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable is set to a value that cannot be used.
    #[error("Invalid value {value:?} for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Batch size outside what a single commit accepts.
    #[error("Batch size {provided} is out of range 1..={max}")]
    BatchSizeOutOfRange { provided: usize, max: usize },
}

impl ConfigError {
    pub fn invalid(name: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            name,
            value: value.into(),
            reason: reason.into(),
        }
    }
}
