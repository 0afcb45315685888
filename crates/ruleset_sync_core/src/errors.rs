//! Error types for policy reconciliation.
//!
//! Three layers of errors exist:
//!
//! - [`ValidationError`]: local input problems, detected before any store call.
//! - [`StoreError`]: a failed call to the remote policy store, with a coarse
//!   classification and the store's raw message.
//! - [`SyncError`]: the per-target failure recorded in an outcome. Every store
//!   error is converted into one of these at the reconciliation boundary.

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Validation failures for user-supplied values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: impl Into<String>) -> Self {
        Self::EmptyField {
            field: field.into(),
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Coarse classification of a store failure.
///
/// The reconciler only treats [`StoreErrorKind::Auth`] specially; the other kinds
/// exist so transports can report what they saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The credential is missing, invalid, expired or lacks permission.
    Auth,
    /// The target or policy does not exist (or is invisible to the credential).
    NotFound,
    /// The store throttled the request.
    RateLimited,
    /// Anything else: transport failures, validation errors, malformed responses.
    Other,
}

/// A failed call to the remote policy store.
///
/// `message` is the store's own wording, kept verbatim for diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Auth, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotFound, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Other, message)
    }

    pub fn is_auth(&self) -> bool {
        self.kind == StoreErrorKind::Auth
    }
}

impl From<github_client::Error> for StoreError {
    fn from(e: github_client::Error) -> Self {
        let kind = match &e {
            github_client::Error::AuthError(_) => StoreErrorKind::Auth,
            github_client::Error::NotFound => StoreErrorKind::NotFound,
            github_client::Error::RateLimitExceeded => StoreErrorKind::RateLimited,
            _ => StoreErrorKind::Other,
        };
        Self::new(kind, e.to_string())
    }
}

/// Why reconciling a single target failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The target identifier is malformed. No store call was made.
    #[error("Invalid target: {0}")]
    Validation(#[from] ValidationError),

    /// Listing the existing policies failed.
    #[error("Failed to query existing policies: {message}")]
    StoreQuery { message: String },

    /// Removing a stale policy failed. Recorded, never terminal.
    #[error("Failed to delete policy {id}: {message}")]
    StoreDelete { id: String, message: String },

    /// Creating the policy failed.
    #[error("Failed to create policy: {message}")]
    StoreCreate { message: String },

    /// The store rejected the credential.
    #[error("Authentication failed: {message}")]
    Auth { message: String },
}

impl SyncError {
    pub(crate) fn from_query(e: StoreError) -> Self {
        if e.is_auth() {
            SyncError::Auth { message: e.message }
        } else {
            SyncError::StoreQuery { message: e.message }
        }
    }

    pub(crate) fn from_create(e: StoreError) -> Self {
        if e.is_auth() {
            SyncError::Auth { message: e.message }
        } else {
            SyncError::StoreCreate { message: e.message }
        }
    }
}
