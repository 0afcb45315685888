//! Declarative branch ruleset synchronisation.
//!
//! This crate applies one fixed [`PolicySpec`] to a sequence of repositories.
//! Each repository is reconciled independently by the [`PolicyReconciler`],
//! which talks to the remote side only through the [`PolicyStore`] trait. The
//! [`run_sync`] driver feeds targets through the reconciler in order, with
//! optional bounded concurrency and cooperative cancellation, and streams the
//! per-target [`Outcome`]s to a [`Reporter`].
//!
//! Two stores are provided: [`GitHubPolicyStore`] over the REST API and
//! [`GhCliPolicyStore`] over the GitHub CLI.

pub mod errors;
pub use errors::{StoreError, StoreErrorKind, SyncError, ValidationError};

pub mod gh_cli_store;
pub use gh_cli_store::GhCliPolicyStore;

pub mod github_store;
pub use github_store::GitHubPolicyStore;

pub mod policy;
pub use policy::{
    ConflictPolicy, ExistingPolicy, PolicyId, PolicySpec, PullRequestClause, RuleClause,
    MAIN_BRANCH_RULESET_NAME,
};

pub mod reconciler;
pub use reconciler::{Outcome, PolicyReconciler, EXISTING_POLICY_PRESERVED};

pub mod report;
pub use report::{Reporter, RunSummary, TargetOutcome};

pub mod runner;
pub use runner::{run_sync, CancellationFlag, SyncOptions};

pub mod store;
pub use store::{PolicyStore, TargetDiscovery};

pub mod target;
pub use target::{DefaultRef, TargetId, FALLBACK_REF};

#[cfg(test)]
mod test_support;
