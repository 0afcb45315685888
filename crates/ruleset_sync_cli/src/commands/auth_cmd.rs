//! Authentication command module for GitHub credentials management.
//!
//! A personal access token is stored in the system keyring. At run time the
//! token is looked up in this order:
//!
//! 1. the environment variable named by `github.token_env_var`, if configured
//! 2. `GITHUB_TOKEN`
//! 3. `GH_TOKEN`
//! 4. the system keyring
//!
//! The `gh` transport does not use this token; it relies on `gh`'s own login.

use std::io::{self, Write};

use clap::Subcommand;
use keyring::Entry;
use tracing::{debug, error, info, instrument};

use crate::{config::AppConfig, errors::Error};

pub const KEY_RING_SERVICE_NAME: &str = "ruleset_sync_cli";
pub const KEY_RING_USER_TOKEN: &str = "github_token";

/// Standard environment variables checked for a token.
pub const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;

/// Authentication subcommands for managing GitHub credentials.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Store a GitHub personal access token in the system keyring.
    #[command(name = "github")]
    GitHub,

    /// Show where the GitHub credential would be read from.
    Status,
}

/// Where a token was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Environment(String),
    Keyring,
}

impl std::fmt::Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::Environment(name) => write!(f, "environment variable {}", name),
            TokenSource::Keyring => write!(f, "system keyring"),
        }
    }
}

/// A token and where it came from.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub token: String,
    pub source: TokenSource,
}

impl std::fmt::Debug for ResolvedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedToken")
            .field("token", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Looks a token up in the configured order.
///
/// `env` reads an environment variable and `keyring` reads the stored token;
/// both are parameters so the lookup order can be tested without touching the
/// process environment. Blank values are ignored.
pub fn lookup_token<E, K>(token_env_var: Option<&str>, env: E, keyring: K) -> Option<ResolvedToken>
where
    E: Fn(&str) -> Option<String>,
    K: FnOnce() -> Option<String>,
{
    let non_blank = |value: String| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    };

    for name in token_env_var.into_iter().chain(TOKEN_ENV_VARS) {
        if let Some(token) = env(name).and_then(non_blank) {
            return Some(ResolvedToken {
                token,
                source: TokenSource::Environment(name.to_string()),
            });
        }
    }

    keyring().and_then(non_blank).map(|token| ResolvedToken {
        token,
        source: TokenSource::Keyring,
    })
}

/// Resolves the token for the current process.
pub fn resolve_token(config: &AppConfig) -> Option<ResolvedToken> {
    lookup_token(
        config.github.token_env_var.as_deref(),
        |name| std::env::var(name).ok(),
        read_keyring_token,
    )
}

fn read_keyring_token() -> Option<String> {
    let entry = match Entry::new(KEY_RING_SERVICE_NAME, KEY_RING_USER_TOKEN) {
        Ok(entry) => entry,
        Err(e) => {
            debug!(error = %e, "Keyring is not available");
            return None;
        }
    };

    match entry.get_password() {
        Ok(token) => Some(token),
        Err(e) => {
            debug!(error = %e, "No token in the keyring");
            None
        }
    }
}

/// Executes the specified authentication command.
#[instrument(skip(config))]
pub async fn execute(cmd: &AuthCommands, config: &AppConfig) -> Result<(), Error> {
    match cmd {
        AuthCommands::GitHub => auth_github(),
        AuthCommands::Status => {
            auth_status(config);
            Ok(())
        }
    }
}

fn auth_github() -> Result<(), Error> {
    info!(message = "GitHub Personal Access Token Authentication");
    println!("GitHub Personal Access Token Authentication");
    println!("------------------------------------------");
    println!("Please provide your GitHub Personal Access Token:");
    io::stdout().flush().map_err(|_| Error::StdOutFlushFailed)?;

    let mut token = String::new();
    io::stdin()
        .read_line(&mut token)
        .map_err(|e| Error::Auth(format!("Failed to read input: {}", e)))?;
    let token = token.trim();
    debug!(message = "Read token from stdin");

    if token.is_empty() {
        let err = Error::Auth("Token cannot be empty".to_string());
        error!(message = "Token cannot be empty", error = ?err);
        return Err(err);
    }

    let keyring = Entry::new(KEY_RING_SERVICE_NAME, KEY_RING_USER_TOKEN)
        .map_err(|e| Error::Auth(format!("Failed to create an entry in the keyring: {}", e)))?;
    keyring
        .set_password(token)
        .map_err(|e| Error::Auth(format!("Failed to save token to keyring: {}", e)))?;
    debug!(message = "Saved token to keyring");

    println!("GitHub token stored in the system keyring.");
    Ok(())
}

fn auth_status(config: &AppConfig) {
    match resolve_token(config) {
        Some(resolved) => println!("GitHub token found in {}.", resolved.source),
        None => println!(
            "No GitHub token found. Set GITHUB_TOKEN or run 'ruleset-sync auth github'."
        ),
    }
}
