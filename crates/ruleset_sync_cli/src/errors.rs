use std::io;

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Exit status for configuration and argument errors.
pub const EXIT_USAGE: i32 = 2;

/// Errors that can occur in the ruleset-sync CLI application.
///
/// Every variant aborts the command before or instead of a sync run. Failures
/// of individual targets are never reported through this type; they end up in
/// the run summary.
#[derive(Error, Debug)]
pub enum Error {
    /// Storing or reading a GitHub credential failed, or no client could be built.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The configuration file is missing, unreadable or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid command-line arguments were provided.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Enumerating the accessible repositories failed.
    #[error("Failed to discover repositories: {0}")]
    Discovery(String),

    /// Reading from standard input failed.
    #[error("Failed to read input: {0}")]
    ReadInput(io::Error),

    /// Failed to flush the standard output buffer.
    #[error("Failed to flush the std out buffer.")]
    StdOutFlushFailed,
}

impl Error {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::InvalidArguments(_) => EXIT_USAGE,
            _ => 1,
        }
    }
}
