//! Policy store driving the GitHub CLI (`gh`).
//!
//! Every operation is one `gh api` (or `gh repo list`) invocation, so the
//! credential `gh` already holds is reused as-is. A failed invocation is
//! classified from its stderr.

use std::io::Write;
use std::process::Stdio;

use async_trait::async_trait;
use github_client::RepositoryRuleset;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::errors::{StoreError, StoreErrorKind};
use crate::policy::{ExistingPolicy, PolicyId};
use crate::store::{PolicyStore, TargetDiscovery};
use crate::target::TargetId;

#[cfg(test)]
#[path = "gh_cli_store_tests.rs"]
mod tests;

const LIST_RULESETS_JQ: &str = r#".[] | "\(.id)\t\(.name)""#;

/// Upper bound on repositories returned by discovery.
const DISCOVERY_LIMIT: &str = "1000";

/// A [`PolicyStore`] that shells out to `gh`.
#[derive(Debug, Clone)]
pub struct GhCliPolicyStore {
    program: String,
    leading_args: Vec<String>,
}

impl GhCliPolicyStore {
    /// Uses the `gh` found on `PATH`.
    pub fn new() -> Self {
        Self::with_command("gh", Vec::<String>::new())
    }

    /// Uses a custom program, invoked with `leading_args` before the `gh` arguments.
    pub fn with_command<I, A>(program: impl Into<String>, leading_args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            program: program.into(),
            leading_args: leading_args.into_iter().map(Into::into).collect(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, StoreError> {
        debug!(program = %self.program, ?args, "Running gh");

        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| StoreError::other(format!("Failed to run '{}': {}", self.program, e)))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(classify_failure(&String::from_utf8_lossy(&output.stderr)))
        }
    }
}

impl Default for GhCliPolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PolicyStore for GhCliPolicyStore {
    #[instrument(skip(self), fields(repository = %target))]
    async fn resolve_default_ref(&self, target: &TargetId) -> Result<Option<String>, StoreError> {
        let path = format!("repos/{}", target);

        match self.run(&["api", &path, "--jq", ".default_branch"]).await {
            Ok(stdout) => {
                let branch = stdout.trim();
                Ok((!branch.is_empty()).then(|| branch.to_string()))
            }
            Err(e) if e.kind == StoreErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self), fields(repository = %target))]
    async fn list_policies(&self, target: &TargetId) -> Result<Vec<ExistingPolicy>, StoreError> {
        let path = format!("repos/{}/rulesets?includes_parents=false", target);

        let stdout = self
            .run(&["api", "--paginate", &path, "--jq", LIST_RULESETS_JQ])
            .await?;
        Ok(parse_policy_lines(&stdout))
    }

    #[instrument(skip(self), fields(repository = %target, ruleset_id = %id))]
    async fn delete_policy(&self, target: &TargetId, id: &PolicyId) -> Result<(), StoreError> {
        let path = format!("repos/{}/rulesets/{}", target, id);

        self.run(&["api", "-X", "DELETE", &path]).await?;
        Ok(())
    }

    #[instrument(skip(self, payload), fields(repository = %target))]
    async fn create_policy(
        &self,
        target: &TargetId,
        payload: &RepositoryRuleset,
    ) -> Result<PolicyId, StoreError> {
        let path = format!("repos/{}/rulesets", target);

        // Removed when `input` drops, on every return path.
        let input = write_payload_file(payload)?;
        let input_path = input.path().to_string_lossy().into_owned();

        let stdout = self
            .run(&[
                "api",
                "-X",
                "POST",
                &path,
                "--input",
                &input_path,
                "--jq",
                ".id",
            ])
            .await?;

        let id = stdout.trim();
        if id.is_empty() || id == "null" {
            return Err(StoreError::other("gh returned no ruleset ID"));
        }
        Ok(PolicyId::new(id))
    }
}

#[async_trait]
impl TargetDiscovery for GhCliPolicyStore {
    #[instrument(skip(self))]
    async fn discover_targets(&self, owner: Option<&str>) -> Result<Vec<String>, StoreError> {
        let mut args = vec!["repo", "list"];
        if let Some(owner) = owner {
            args.push(owner);
        }
        args.extend([
            "--limit",
            DISCOVERY_LIMIT,
            "--no-archived",
            "--json",
            "nameWithOwner",
            "--jq",
            ".[].nameWithOwner",
        ]);

        let stdout = self.run(&args).await?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Serializes the payload into a temporary file for `gh api --input`.
fn write_payload_file(payload: &RepositoryRuleset) -> Result<NamedTempFile, StoreError> {
    let mut file = NamedTempFile::new()
        .map_err(|e| StoreError::other(format!("Failed to create payload file: {}", e)))?;

    let body = serde_json::to_vec(payload)
        .map_err(|e| StoreError::other(format!("Failed to serialize payload: {}", e)))?;
    file.write_all(&body)
        .and_then(|_| file.flush())
        .map_err(|e| StoreError::other(format!("Failed to write payload file: {}", e)))?;

    Ok(file)
}

/// Parses `id<TAB>name` lines.
fn parse_policy_lines(stdout: &str) -> Vec<ExistingPolicy> {
    stdout
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (id, name) = line.split_once('\t').unwrap_or((line, ""));
            ExistingPolicy {
                id: PolicyId::new(id.trim()),
                name: name.to_string(),
            }
        })
        .collect()
}

/// Maps `gh` stderr to a classified store error.
fn classify_failure(stderr: &str) -> StoreError {
    let message = stderr.trim();
    let message = if message.is_empty() {
        "gh exited with an error"
    } else {
        message
    };

    let kind = if message.contains("HTTP 429")
        || (message.contains("HTTP 403") && message.to_lowercase().contains("rate limit"))
    {
        StoreErrorKind::RateLimited
    } else if message.contains("HTTP 401")
        || message.contains("HTTP 403")
        || message.contains("gh auth login")
    {
        StoreErrorKind::Auth
    } else if message.contains("HTTP 404") {
        StoreErrorKind::NotFound
    } else {
        StoreErrorKind::Other
    };

    StoreError::new(kind, message)
}
