//! Tests for run summaries.

use super::*;
use crate::errors::SyncError;
use crate::policy::PolicyId;

fn applied(index: usize, target: &str) -> TargetOutcome {
    TargetOutcome {
        index,
        target: target.to_string(),
        outcome: Outcome::Applied {
            policy_id: PolicyId::new("1"),
            ref_name: "main".to_string(),
            replaced: Vec::new(),
            cleanup_errors: Vec::new(),
        },
    }
}

fn failed(index: usize, target: &str) -> TargetOutcome {
    TargetOutcome {
        index,
        target: target.to_string(),
        outcome: Outcome::Failed(SyncError::StoreQuery {
            message: "boom".to_string(),
        }),
    }
}

#[test]
fn test_empty_summary_is_success() {
    let summary = RunSummary::new();

    assert!(summary.is_success());
    assert_eq!(summary.attempted(), 0);
    assert!(!summary.cancelled);
}

#[test]
fn test_record_updates_counts_and_keeps_order() {
    let mut summary = RunSummary::new();

    summary.record(applied(0, "acme/a"));
    summary.record(failed(1, "acme/b"));
    summary.record(TargetOutcome {
        index: 2,
        target: "acme/c".to_string(),
        outcome: Outcome::Skipped {
            reason: "existing policy preserved".to_string(),
            existing_ids: vec![PolicyId::new("42")],
        },
    });

    assert_eq!(summary.applied, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.attempted(), 3);
    assert!(!summary.is_success());

    let targets: Vec<&str> = summary.records.iter().map(|r| r.target.as_str()).collect();
    assert_eq!(targets, vec!["acme/a", "acme/b", "acme/c"]);
}
