//! Per-target policy reconciliation.
//!
//! This module provides the [`PolicyReconciler`] component, which converges a
//! single target towards the desired [`PolicySpec`] and reports what happened
//! as an [`Outcome`].

use tracing::{debug, info, instrument, warn};

use crate::errors::SyncError;
use crate::policy::{ConflictPolicy, PolicyId, PolicySpec};
use crate::store::PolicyStore;
use crate::target::{DefaultRef, TargetId};

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;

/// Reason recorded when a target is skipped because it already has policies.
pub const EXISTING_POLICY_PRESERVED: &str = "existing policy preserved";

/// The result of reconciling one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A new policy was created.
    Applied {
        /// ID assigned by the store to the created policy.
        policy_id: PolicyId,
        /// Branch the policy was scoped to.
        ref_name: String,
        /// Policies that were successfully removed before creation.
        replaced: Vec<PolicyId>,
        /// Delete failures tolerated during cleanup.
        cleanup_errors: Vec<SyncError>,
    },

    /// The target already had policies and was left untouched.
    Skipped {
        reason: String,
        existing_ids: Vec<PolicyId>,
    },

    /// Reconciliation failed for this target only.
    Failed(SyncError),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// Applies a [`PolicySpec`] to targets through a [`PolicyStore`].
///
/// The reconciler holds no per-target state, so a single instance is shared by
/// every reconciliation of a run, concurrent ones included.
///
/// # Examples
///
/// ```rust,no_run
/// use github_client::{create_token_client, GitHubClient};
/// use ruleset_sync_core::{ConflictPolicy, GitHubPolicyStore, PolicyReconciler, PolicySpec};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = GitHubPolicyStore::new(GitHubClient::new(create_token_client("ghp_example", None)?));
/// let reconciler = PolicyReconciler::new(store, PolicySpec::main_branch_ruleset());
///
/// let outcome = reconciler.reconcile("acme/widget", ConflictPolicy::SkipIfExists).await;
/// println!("{:?}", outcome);
/// # Ok(())
/// # }
/// ```
pub struct PolicyReconciler<S> {
    store: S,
    spec: PolicySpec,
}

impl<S: PolicyStore> PolicyReconciler<S> {
    pub fn new(store: S, spec: PolicySpec) -> Self {
        Self { store, spec }
    }

    /// Converges one target towards the desired policy.
    ///
    /// # Behavior
    ///
    /// 1. Validates the target identifier (no store call on failure)
    /// 2. Resolves the default branch, falling back to `main`
    /// 3. Lists existing policies
    /// 4. Skips, or deletes every existing policy, depending on `mode`
    /// 5. Creates the rendered policy
    ///
    /// Every failure is captured in the returned [`Outcome`]; this method never
    /// panics or returns early with an error. Delete failures in
    /// [`ConflictPolicy::Replace`] mode are recorded and creation still runs.
    #[instrument(skip(self, raw_target, mode), fields(repository = raw_target, mode = %mode))]
    pub async fn reconcile(&self, raw_target: &str, mode: ConflictPolicy) -> Outcome {
        let target = match TargetId::parse(raw_target) {
            Ok(target) => target,
            Err(e) => {
                warn!(error = %e, "Rejecting malformed target");
                return Outcome::Failed(e.into());
            }
        };

        let default_ref = self.resolve_default_ref(&target).await;

        let existing = match self.store.list_policies(&target).await {
            Ok(existing) => existing,
            Err(e) => {
                warn!(repository = %target, error = %e, "Failed to list existing policies");
                return Outcome::Failed(SyncError::from_query(e));
            }
        };

        let existing_ids: Vec<PolicyId> = existing.into_iter().map(|p| p.id).collect();

        let mut replaced = Vec::new();
        let mut cleanup_errors = Vec::new();

        if !existing_ids.is_empty() {
            match mode {
                ConflictPolicy::SkipIfExists => {
                    info!(
                        repository = %target,
                        existing = existing_ids.len(),
                        "Target already has policies, skipping"
                    );
                    return Outcome::Skipped {
                        reason: EXISTING_POLICY_PRESERVED.to_string(),
                        existing_ids,
                    };
                }
                ConflictPolicy::Replace => {
                    for id in existing_ids {
                        match self.store.delete_policy(&target, &id).await {
                            Ok(()) => {
                                debug!(
                                    repository = %target,
                                    ruleset_id = %id,
                                    "Deleted existing policy"
                                );
                                replaced.push(id);
                            }
                            Err(e) => {
                                warn!(
                                    repository = %target,
                                    ruleset_id = %id,
                                    error = %e,
                                    "Failed to delete existing policy, continuing"
                                );
                                cleanup_errors.push(SyncError::StoreDelete {
                                    id: id.to_string(),
                                    message: e.message,
                                });
                            }
                        }
                    }
                }
            }
        }

        let payload = self.spec.render(&default_ref);

        match self.store.create_policy(&target, &payload).await {
            Ok(policy_id) => {
                info!(
                    repository = %target,
                    ruleset_id = %policy_id,
                    default_ref = %default_ref,
                    "Policy applied"
                );
                Outcome::Applied {
                    policy_id,
                    ref_name: default_ref.to_string(),
                    replaced,
                    cleanup_errors,
                }
            }
            Err(e) => {
                warn!(repository = %target, error = %e, "Failed to create policy");
                Outcome::Failed(SyncError::from_create(e))
            }
        }
    }

    async fn resolve_default_ref(&self, target: &TargetId) -> DefaultRef {
        let resolved = match self.store.resolve_default_ref(target).await {
            Ok(name) => name.and_then(DefaultRef::new),
            Err(e) => {
                debug!(repository = %target, error = %e, "Default branch lookup failed");
                None
            }
        };

        match resolved {
            Some(default_ref) => default_ref,
            None => {
                info!(
                    repository = %target,
                    default_ref = crate::target::FALLBACK_REF,
                    "Could not resolve default branch, using fallback"
                );
                DefaultRef::fallback()
            }
        }
    }
}
