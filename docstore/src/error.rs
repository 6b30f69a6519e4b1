//! Document store error types.

use thiserror::Error;

/// Errors from document store operations.
///
/// Shared by every [`crate::DocumentStore`] backend so callers can log and
/// recover from commit failures without knowing which backend is in use.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The credentials file could not be read or is not a service account key.
    #[error("Credentials error: {0}")]
    CredentialsError(String),

    /// Exchanging the signed assertion for an access token failed.
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Transport-level failure talking to the backend.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The backend answered the commit with a non-success status.
    #[error("Commit rejected with status {status}: {body}")]
    CommitRejected { status: u16, body: String },

    /// A batch carried more writes than a single commit accepts.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },

    /// Generic commit failure.
    #[error("Commit error: {0}")]
    CommitError(String),
}

impl StoreError {
    /// Create a credentials error.
    pub fn credentials(msg: impl Into<String>) -> Self {
        Self::CredentialsError(msg.into())
    }

    /// Create an authentication error.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    /// Create a commit error.
    pub fn commit(msg: impl Into<String>) -> Self {
        Self::CommitError(msg.into())
    }
}
