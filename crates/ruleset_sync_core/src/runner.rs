//! Run driver: feeds targets through the reconciler and streams the results.
//!
//! Targets are started in production order, at most `max_concurrency` at a
//! time, and their outcomes are handed to the [`Reporter`] in that same order
//! whatever order they complete in. Cancellation is cooperative: the flag is
//! checked before each target is started and in-flight targets always finish.

use std::future;
use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{info, instrument};

use crate::policy::ConflictPolicy;
use crate::reconciler::PolicyReconciler;
use crate::report::{Reporter, RunSummary, TargetOutcome};
use crate::store::PolicyStore;

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;

/// Shared flag requesting that no further targets are started.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options for a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub conflict_policy: ConflictPolicy,
    /// Maximum number of targets reconciled at once. Zero is treated as one.
    pub max_concurrency: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::SkipIfExists,
            max_concurrency: 1,
        }
    }
}

/// Reconciles every target and reports the results.
///
/// Never fails: every per-target error ends up in the returned summary.
#[instrument(skip_all, fields(targets = targets.len(), mode = %options.conflict_policy))]
pub async fn run_sync<S, R>(
    reconciler: &PolicyReconciler<S>,
    targets: Vec<String>,
    options: SyncOptions,
    cancel: &CancellationFlag,
    reporter: &mut R,
) -> RunSummary
where
    S: PolicyStore,
    R: Reporter + ?Sized,
{
    let total = targets.len();
    let limit = options.max_concurrency.max(1);
    let mode = options.conflict_policy;

    info!(total, concurrency = limit, "Starting sync run");

    let outcomes = stream::iter(targets.into_iter().enumerate())
        .take_while(|_| future::ready(!cancel.is_cancelled()))
        .map(|(index, target)| async move {
            let outcome = reconciler.reconcile(&target, mode).await;
            TargetOutcome {
                index,
                target,
                outcome,
            }
        })
        .buffered(limit);
    let mut outcomes = pin!(outcomes);

    let mut summary = RunSummary::new();
    while let Some(record) = outcomes.next().await {
        reporter.on_outcome(&record);
        summary.record(record);
    }

    summary.not_attempted = total - summary.attempted();
    summary.cancelled = cancel.is_cancelled();

    if summary.cancelled {
        info!(not_attempted = summary.not_attempted, "Sync run cancelled");
    }
    info!(
        applied = summary.applied,
        skipped = summary.skipped,
        failed = summary.failed,
        "Sync run complete"
    );

    reporter.on_complete(&summary);
    summary
}
