//! Target domain types
//!
//! Types identifying what a policy is applied to: the repository ([`TargetId`])
//! and the branch inside it ([`DefaultRef`]).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;

/// Branch used when a target's default branch cannot be resolved.
pub const FALLBACK_REF: &str = "main";

/// Validated `owner/name` repository identifier.
///
/// # Validation Rules
/// - Must not be empty
/// - Exactly one `/` separator, with a non-empty owner and name on either side
/// - Owner: ASCII alphanumeric characters and hyphens only
/// - Name: ASCII alphanumeric characters, hyphens, underscores and periods, and
///   not `.` or `..`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId {
    owner: String,
    name: String,
}

impl TargetId {
    /// Parse an `owner/name` string.
    ///
    /// Both halves end up as URL path segments, so anything outside the GitHub
    /// name alphabet is rejected here.
    ///
    /// # Errors
    /// Returns `ValidationError` if the value does not have the `owner/name` shape
    /// or either half contains a character GitHub does not allow.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.is_empty() {
            return Err(ValidationError::empty_field("target"));
        }

        let mut parts = raw.split('/');
        let (owner, name) = match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                (owner, name)
            }
            _ => {
                return Err(ValidationError::invalid_format(
                    "target",
                    format!("'{}' must have the form owner/name", raw),
                ))
            }
        };

        if !owner.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ValidationError::invalid_format(
                "target",
                format!(
                    "'{}': owner must contain only alphanumeric characters or hyphens",
                    raw
                ),
            ));
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(ValidationError::invalid_format(
                "target",
                format!(
                    "'{}': name must contain only alphanumeric characters, hyphens, underscores, or periods",
                    raw
                ),
            ));
        }

        if name == "." || name == ".." {
            return Err(ValidationError::invalid_format(
                "target",
                format!("'{}': name must not be '.' or '..'", raw),
            ));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for TargetId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The branch a policy is scoped to.
///
/// Resolved once per reconciliation attempt and never cached across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefaultRef(String);

impl DefaultRef {
    /// Wraps a branch name. Returns `None` for blank input.
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The branch used when discovery yields nothing.
    pub fn fallback() -> Self {
        Self(FALLBACK_REF.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DefaultRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for DefaultRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
