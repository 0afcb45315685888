//! Crate for interacting with the GitHub REST API.
//!
//! This crate provides a thin client over `octocrab` for the handful of calls a
//! ruleset sync needs: reading a repository's default branch, listing, creating and
//! deleting repository rulesets, and enumerating the repositories a token can reach.

use async_trait::async_trait;
use octocrab::{Octocrab, Result as OctocrabResult};
use serde::Serialize;
use tracing::{debug, error, info, instrument};

pub mod errors;
pub use errors::Error;

pub mod models;

pub mod ruleset;
pub use ruleset::{
    BypassActor, BypassActorType, BypassMode, MergeMethod, PullRequestParameters,
    RefNameCondition, RepositoryRuleset, Rule, RulesetConditions, RulesetEnforcement,
    RulesetTarget,
};

// Reference the tests module in the separate file
#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Page size used for every paginated listing.
const PAGE_SIZE: u8 = 100;

/// A client for interacting with the GitHub API.
#[derive(Debug)]
pub struct GitHubClient {
    client: Octocrab,
}

impl GitHubClient {
    /// Creates a new `GitHubClient` from an already configured `Octocrab` instance.
    ///
    /// Use [`create_token_client`] or [`create_anonymous_client`] to build the
    /// underlying instance.
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }

    async fn get_paged<R>(&self, path: &str, query: &PageQuery<'_>) -> Result<Vec<R>, Error>
    where
        R: serde::de::DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut page = 1u32;
        loop {
            let params = PageQuery { page, ..*query };
            let response: OctocrabResult<Vec<R>> = self.client.get(path, Some(&params)).await;
            let batch = response.map_err(|e| map_octocrab_error("Failed to list resources", e))?;

            let count = batch.len();
            items.extend(batch);
            debug!(path = path, page = page, count = count, "Fetched page");

            if count < PAGE_SIZE as usize {
                return Ok(items);
            }
            page += 1;
        }
    }
}

#[async_trait]
impl RulesetClient for GitHubClient {
    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<models::Repository, Error> {
        let path = format!("/repos/{}/{}", owner, repo);
        let response: OctocrabResult<models::Repository> =
            self.client.get(path, None::<&()>).await;
        response.map_err(|e| map_octocrab_error("Failed to get repository", e))
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    async fn list_repository_rulesets(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<RepositoryRuleset>, Error> {
        let path = format!("/repos/{}/{}/rulesets", owner, repo);
        let query = PageQuery {
            includes_parents: Some(false),
            ..PageQuery::default()
        };

        let rulesets: Vec<RepositoryRuleset> = self.get_paged(&path, &query).await?;
        info!(count = rulesets.len(), "Retrieved repository rulesets");
        Ok(rulesets)
    }

    #[instrument(skip(self, ruleset), fields(owner = %owner, repo = %repo, name = %ruleset.name))]
    async fn create_repository_ruleset(
        &self,
        owner: &str,
        repo: &str,
        ruleset: &RepositoryRuleset,
    ) -> Result<RepositoryRuleset, Error> {
        let path = format!("/repos/{}/{}/rulesets", owner, repo);
        let response: OctocrabResult<RepositoryRuleset> =
            self.client.post(path, Some(ruleset)).await;

        let created = response.map_err(|e| map_octocrab_error("Failed to create ruleset", e))?;
        if created.id.is_none() {
            error!("GitHub accepted the ruleset but returned no ID");
            return Err(Error::InvalidResponse);
        }

        info!(id = created.id, "Created repository ruleset");
        Ok(created)
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo, ruleset_id = ruleset_id))]
    async fn delete_repository_ruleset(
        &self,
        owner: &str,
        repo: &str,
        ruleset_id: u64,
    ) -> Result<(), Error> {
        let path = format!("/repos/{}/{}/rulesets/{}", owner, repo, ruleset_id);
        let response = self
            .client
            ._delete(path.as_str(), None::<&()>)
            .await
            .map_err(|e| map_octocrab_error("Failed to delete ruleset", e))?;

        let status = response.status();
        if !status.is_success() {
            error!(status = status.as_u16(), "GitHub refused to delete the ruleset");
            return Err(error_for_status(
                status,
                format!("DELETE {} returned HTTP {}", path, status.as_u16()),
            ));
        }

        info!("Deleted repository ruleset");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_accessible_repositories(
        &self,
        owner: Option<&str>,
    ) -> Result<Vec<models::Repository>, Error> {
        let repositories: Vec<models::Repository> = match owner {
            None => {
                let query = PageQuery {
                    affiliation: Some("owner,collaborator,organization_member"),
                    ..PageQuery::default()
                };
                self.get_paged::<models::Repository>("/user/repos", &query).await?
            }
            Some(owner) => {
                let org_path = format!("/orgs/{}/repos", owner);
                match self
                    .get_paged::<models::Repository>(&org_path, &PageQuery::default())
                    .await
                {
                    Err(Error::NotFound) => {
                        debug!(owner = owner, "Not an organization, listing user repositories");
                        let user_path = format!("/users/{}/repos", owner);
                        self.get_paged::<models::Repository>(&user_path, &PageQuery::default())
                            .await?
                    }
                    other => other?,
                }
            }
        };

        info!(count = repositories.len(), "Listed accessible repositories");
        Ok(repositories)
    }
}

/// Query parameters shared by the paginated listing endpoints.
#[derive(Clone, Copy, Debug, Serialize)]
struct PageQuery<'a> {
    per_page: u8,
    page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    includes_parents: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    affiliation: Option<&'a str>,
}

impl Default for PageQuery<'_> {
    fn default() -> Self {
        Self {
            per_page: PAGE_SIZE,
            page: 1,
            includes_parents: None,
            affiliation: None,
        }
    }
}

/// Trait for the repository and ruleset operations a policy sync performs.
///
/// Implemented by [`GitHubClient`]; callers depend on the trait so they can be
/// exercised without a network.
#[async_trait]
pub trait RulesetClient: Send + Sync {
    /// Fetches metadata for a specific repository.
    ///
    /// # Errors
    /// Returns `Error::NotFound` when the repository does not exist or is not visible
    /// to the credential, `Error::AuthError` for 401/403 responses.
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<models::Repository, Error>;

    /// Lists the rulesets defined directly on a repository.
    ///
    /// Rulesets inherited from the organization are excluded because they cannot be
    /// managed through the repository endpoints. Returns an empty vector, not an
    /// error, when the repository has none.
    async fn list_repository_rulesets(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<RepositoryRuleset>, Error>;

    /// Creates a ruleset on a repository and returns the stored ruleset.
    ///
    /// # Errors
    /// Returns `Error::InvalidResponse` if GitHub answers without a ruleset ID.
    async fn create_repository_ruleset(
        &self,
        owner: &str,
        repo: &str,
        ruleset: &RepositoryRuleset,
    ) -> Result<RepositoryRuleset, Error>;

    /// Deletes a repository ruleset by ID.
    async fn delete_repository_ruleset(
        &self,
        owner: &str,
        repo: &str,
        ruleset_id: u64,
    ) -> Result<(), Error>;

    /// Lists every repository the credential can reach.
    ///
    /// With `owner` set, lists the repositories of that organization (or user, when
    /// no organization with that name exists). Without it, lists the repositories of
    /// the authenticated user including those reached through organization membership.
    async fn list_accessible_repositories(
        &self,
        owner: Option<&str>,
    ) -> Result<Vec<models::Repository>, Error>;
}

/// Creates an `Octocrab` client authenticated with a personal access token.
///
/// # Arguments
///
/// * `token` - A personal access token or fine-grained token.
/// * `api_base_url` - Optional API root, for GitHub Enterprise Server. Defaults to
///   `https://api.github.com`.
///
/// # Errors
///
/// Returns `Error::AuthError` if the base URL is invalid or the client cannot be built.
///
/// # Example
///
/// ```rust,no_run
/// use github_client::{create_token_client, GitHubClient, Error};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Error> {
///     let octocrab = create_token_client("ghp_example", None)?;
///     let client = GitHubClient::new(octocrab);
///     Ok(())
/// }
/// ```
#[instrument(skip(token))]
pub fn create_token_client(token: &str, api_base_url: Option<&str>) -> Result<Octocrab, Error> {
    let builder = Octocrab::builder().personal_token(token.to_string());
    let builder = match api_base_url {
        Some(url) => builder.base_uri(url).map_err(|e| {
            error!(api_base_url = url, error = %e, "Invalid GitHub API base URL");
            Error::AuthError(format!("Invalid GitHub API base URL '{}': {}", url, e))
        })?,
        None => builder,
    };

    builder.build().map_err(|e| {
        error!(error = ?e, "Failed to build Octocrab client with token credentials");
        Error::AuthError(format!("Failed to build GitHub client: {}", e))
    })
}

/// Creates an unauthenticated `Octocrab` client.
///
/// Reads of public data succeed; every write is rejected by GitHub with an
/// authentication error.
#[instrument]
pub fn create_anonymous_client(api_base_url: Option<&str>) -> Result<Octocrab, Error> {
    let builder = Octocrab::builder();
    let builder = match api_base_url {
        Some(url) => builder.base_uri(url).map_err(|e| {
            Error::AuthError(format!("Invalid GitHub API base URL '{}': {}", url, e))
        })?,
        None => builder,
    };

    builder
        .build()
        .map_err(|e| Error::AuthError(format!("Failed to build GitHub client: {}", e)))
}

fn error_for_status(status: http::StatusCode, message: String) -> Error {
    match status.as_u16() {
        // Secondary rate limits are reported as 403.
        403 if message.to_lowercase().contains("rate limit") => Error::RateLimitExceeded,
        401 | 403 => Error::AuthError(message),
        404 => Error::NotFound,
        429 => Error::RateLimitExceeded,
        _ => Error::ApiError(message),
    }
}

fn map_octocrab_error(message: &str, e: octocrab::Error) -> Error {
    match e {
        octocrab::Error::GitHub { source, backtrace } => {
            error!(
                error_message = source.message,
                status = source.status_code.as_u16(),
                backtrace = backtrace.to_string(),
                "{}. Received an error from GitHub",
                message
            );
            error_for_status(source.status_code, source.message.clone())
        }
        octocrab::Error::Serde { source, .. } => {
            error!(
                error_message = source.to_string(),
                "{}. Failed to parse the response.", message
            );
            Error::Deserialization(source)
        }
        octocrab::Error::Json { source, .. } => {
            error!(
                error_message = source.inner().to_string(),
                path = source.path().to_string(),
                "{}. Failed to parse the response.", message
            );
            Error::Deserialization(source.into_inner())
        }
        octocrab::Error::UriParse { source, .. } => {
            error!(
                error_message = source.to_string(),
                "{}. Failed to parse URI.", message
            );
            Error::ApiError(source.to_string())
        }
        octocrab::Error::Uri { source, .. } => {
            error!(
                error_message = source.to_string(),
                "{}, Failed to parse URI.", message
            );
            Error::ApiError(source.to_string())
        }
        _ => {
            let text = without_backtrace(&e.to_string());
            error!(error_message = text, message);
            Error::ApiError(text)
        }
    }
}

/// Drops the "Found at" backtrace octocrab appends to its error messages.
fn without_backtrace(text: &str) -> String {
    text.split("Found at").next().unwrap_or(text).trim_end().to_string()
}
