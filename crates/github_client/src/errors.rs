//! Error types for GitHub client operations.
//!
//! This module defines the error types that can occur when talking to the GitHub REST API
//! through the github_client crate. Variants are coarse on purpose: callers mostly need to
//! know whether a failure was an authentication problem, a missing resource, throttling,
//! or anything else, plus the message GitHub returned.

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur during GitHub client operations.
///
/// ## Examples
///
/// ```rust,ignore
/// use github_client::Error;
///
/// match client.list_repository_rulesets("acme", "widget").await {
///     Ok(rulesets) => println!("{} rulesets", rulesets.len()),
///     Err(Error::AuthError(msg)) => eprintln!("Authentication failed: {}", msg),
///     Err(Error::RateLimitExceeded) => eprintln!("Rate limit exceeded, retry later"),
///     Err(err) => eprintln!("Other error: {}", err),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A GitHub API request failed.
    ///
    /// The contained string is the message reported by GitHub (or by the HTTP layer when
    /// no response was received).
    #[error("API request failed: {0}")]
    ApiError(String),

    /// Authentication or GitHub client initialization failure.
    ///
    /// This error occurs when:
    /// - The token is missing, invalid or expired (HTTP 401)
    /// - The token lacks the permissions required for the call (HTTP 403)
    /// - The client could not be built from the supplied credentials
    #[error("Failed to authenticate or initialize GitHub client: {0}")]
    AuthError(String),

    /// Error deserializing the response from GitHub.
    #[error("Failed to deserialize GitHub response: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The GitHub API returned a response in an unexpected format.
    ///
    /// For example a created ruleset that comes back without an ID.
    #[error("Invalid response format")]
    InvalidResponse,

    /// The requested resource was not found.
    ///
    /// GitHub also answers 404 for private resources the credential cannot see.
    #[error("Resource not found")]
    NotFound,

    /// GitHub API rate limit has been exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}
