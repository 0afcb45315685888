//! # Models
//!
//! Data models for the parts of the GitHub REST API this crate reads outside of
//! rulesets: repository metadata used to resolve default branches and to
//! enumerate the repositories a credential can reach.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// Represents a GitHub repository as returned by `GET /repos/{owner}/{repo}`
/// and the repository listing endpoints.
///
/// Only the fields needed by the sync are modelled; everything else in the
/// response is ignored.
///
/// # Examples
///
/// ```rust
/// use github_client::models::Repository;
///
/// let repo: Repository = serde_json::from_str(
///     r#"{ "full_name": "acme/widget", "default_branch": "develop", "private": true }"#,
/// )
/// .unwrap();
///
/// assert_eq!(repo.full_name(), "acme/widget");
/// assert_eq!(repo.default_branch(), Some("develop"));
/// assert!(!repo.is_archived());
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Repository {
    /// The full name of the repository (owner/name)
    full_name: String,
    /// The default branch, absent for some empty repositories
    #[serde(default)]
    default_branch: Option<String>,
    /// Whether the repository is archived (read-only)
    #[serde(default)]
    archived: bool,
}

impl Repository {
    /// Returns the `owner/name` form of the repository.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Returns the default branch name, if GitHub reported one.
    pub fn default_branch(&self) -> Option<&str> {
        self.default_branch.as_deref()
    }

    /// Returns whether the repository is archived.
    pub fn is_archived(&self) -> bool {
        self.archived
    }
}
