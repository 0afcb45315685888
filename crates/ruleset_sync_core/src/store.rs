//! Remote policy store capabilities.
//!
//! The reconciler talks to the store only through [`PolicyStore`]; the target
//! source uses [`TargetDiscovery`] for "all repositories" runs. Transports
//! implement both.

use async_trait::async_trait;
use github_client::RepositoryRuleset;

use crate::errors::StoreError;
use crate::policy::{ExistingPolicy, PolicyId};
use crate::target::TargetId;

/// Read and write access to the policies held at a target.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Returns the target's default branch, or `None` when the store has none.
    async fn resolve_default_ref(&self, target: &TargetId) -> Result<Option<String>, StoreError>;

    /// Lists the policies present at the target. An empty vector when there are none.
    async fn list_policies(&self, target: &TargetId) -> Result<Vec<ExistingPolicy>, StoreError>;

    /// Removes one policy.
    async fn delete_policy(&self, target: &TargetId, id: &PolicyId) -> Result<(), StoreError>;

    /// Stores a new policy and returns its ID.
    async fn create_policy(
        &self,
        target: &TargetId,
        payload: &RepositoryRuleset,
    ) -> Result<PolicyId, StoreError>;
}

/// Enumeration of every target reachable with the current credential.
#[async_trait]
pub trait TargetDiscovery: Send + Sync {
    /// Returns `owner/name` identifiers, optionally restricted to one owner.
    /// Archived targets are excluded.
    async fn discover_targets(&self, owner: Option<&str>) -> Result<Vec<String>, StoreError>;
}

#[async_trait]
impl<T> PolicyStore for &T
where
    T: PolicyStore + ?Sized,
{
    async fn resolve_default_ref(&self, target: &TargetId) -> Result<Option<String>, StoreError> {
        (**self).resolve_default_ref(target).await
    }

    async fn list_policies(&self, target: &TargetId) -> Result<Vec<ExistingPolicy>, StoreError> {
        (**self).list_policies(target).await
    }

    async fn delete_policy(&self, target: &TargetId, id: &PolicyId) -> Result<(), StoreError> {
        (**self).delete_policy(target, id).await
    }

    async fn create_policy(
        &self,
        target: &TargetId,
        payload: &RepositoryRuleset,
    ) -> Result<PolicyId, StoreError> {
        (**self).create_policy(target, payload).await
    }
}

#[async_trait]
impl<T> TargetDiscovery for &T
where
    T: TargetDiscovery + ?Sized,
{
    async fn discover_targets(&self, owner: Option<&str>) -> Result<Vec<String>, StoreError> {
        (**self).discover_targets(owner).await
    }
}
