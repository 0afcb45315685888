//! Policy store backed by the GitHub REST API.

use async_trait::async_trait;
use github_client::{GitHubClient, RepositoryRuleset, RulesetClient};
use tracing::{debug, instrument, warn};

use crate::errors::{StoreError, StoreErrorKind};
use crate::policy::{ExistingPolicy, PolicyId};
use crate::store::{PolicyStore, TargetDiscovery};
use crate::target::TargetId;

#[cfg(test)]
#[path = "github_store_tests.rs"]
mod tests;

/// Adapts a [`RulesetClient`] to the [`PolicyStore`] capability set.
///
/// # Examples
///
/// ```rust,no_run
/// use github_client::{create_token_client, GitHubClient};
/// use ruleset_sync_core::{GitHubPolicyStore, PolicyReconciler, PolicySpec};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GitHubClient::new(create_token_client("ghp_example", None)?);
/// let reconciler = PolicyReconciler::new(
///     GitHubPolicyStore::new(client),
///     PolicySpec::main_branch_ruleset(),
/// );
/// # Ok(())
/// # }
/// ```
pub struct GitHubPolicyStore<C = GitHubClient> {
    client: C,
}

impl<C: RulesetClient> GitHubPolicyStore<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: RulesetClient> PolicyStore for GitHubPolicyStore<C> {
    #[instrument(skip(self), fields(repository = %target))]
    async fn resolve_default_ref(&self, target: &TargetId) -> Result<Option<String>, StoreError> {
        match self
            .client
            .get_repository(target.owner(), target.name())
            .await
        {
            Ok(repo) => Ok(repo.default_branch().map(str::to_string)),
            Err(github_client::Error::NotFound) => {
                debug!("Repository not found while resolving default branch");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self), fields(repository = %target))]
    async fn list_policies(&self, target: &TargetId) -> Result<Vec<ExistingPolicy>, StoreError> {
        let rulesets = self
            .client
            .list_repository_rulesets(target.owner(), target.name())
            .await?;

        let policies = rulesets
            .into_iter()
            .filter_map(|ruleset| match ruleset.id {
                Some(id) => Some(ExistingPolicy {
                    id: PolicyId::from(id),
                    name: ruleset.name,
                }),
                None => {
                    warn!(name = ruleset.name, "Listed ruleset has no ID, ignoring it");
                    None
                }
            })
            .collect();

        Ok(policies)
    }

    #[instrument(skip(self), fields(repository = %target, ruleset_id = %id))]
    async fn delete_policy(&self, target: &TargetId, id: &PolicyId) -> Result<(), StoreError> {
        let ruleset_id: u64 = id.as_str().parse().map_err(|_| {
            StoreError::new(
                StoreErrorKind::Other,
                format!("'{}' is not a GitHub ruleset ID", id),
            )
        })?;

        self.client
            .delete_repository_ruleset(target.owner(), target.name(), ruleset_id)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, payload), fields(repository = %target))]
    async fn create_policy(
        &self,
        target: &TargetId,
        payload: &RepositoryRuleset,
    ) -> Result<PolicyId, StoreError> {
        let created = self
            .client
            .create_repository_ruleset(target.owner(), target.name(), payload)
            .await?;

        created
            .id
            .map(PolicyId::from)
            .ok_or_else(|| StoreError::from(github_client::Error::InvalidResponse))
    }
}

#[async_trait]
impl<C: RulesetClient> TargetDiscovery for GitHubPolicyStore<C> {
    #[instrument(skip(self))]
    async fn discover_targets(&self, owner: Option<&str>) -> Result<Vec<String>, StoreError> {
        let repositories = self.client.list_accessible_repositories(owner).await?;

        Ok(repositories
            .into_iter()
            .filter(|repo| !repo.is_archived())
            .map(|repo| repo.full_name().to_string())
            .collect())
    }
}
