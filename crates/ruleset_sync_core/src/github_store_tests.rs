//! Tests for the GitHub-backed policy store, against a mocked REST API.

use super::*;
use crate::policy::{ConflictPolicy, PolicySpec};
use crate::reconciler::{Outcome, PolicyReconciler};
use crate::target::DefaultRef;
use github_client::create_token_client;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_store(mock_server: &MockServer) -> GitHubPolicyStore {
    let octocrab = create_token_client("ghp_test_token_value", Some(&mock_server.uri()))
        .expect("Failed to build test client");
    GitHubPolicyStore::new(GitHubClient::new(octocrab))
}

fn target(raw: &str) -> TargetId {
    TargetId::parse(raw).unwrap()
}

async fn mount_repository(mock_server: &MockServer, full_name: &str, default_branch: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{full_name}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": full_name.split('/').nth(1).unwrap(),
            "full_name": full_name,
            "default_branch": default_branch
        })))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_resolve_default_ref() {
    let mock_server = MockServer::start().await;
    mount_repository(&mock_server, "acme/widget", "develop").await;

    let store = create_store(&mock_server);

    let resolved = store
        .resolve_default_ref(&target("acme/widget"))
        .await
        .expect("resolution succeeds");

    assert_eq!(resolved.as_deref(), Some("develop"));
}

#[tokio::test]
async fn test_resolve_default_ref_not_found_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest"
        })))
        .mount(&mock_server)
        .await;

    let store = create_store(&mock_server);

    let resolved = store
        .resolve_default_ref(&target("acme/ghost"))
        .await
        .expect("not found is not an error");

    assert_eq!(resolved, None);
}

#[tokio::test]
async fn test_list_policies_maps_ids_and_names() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/rulesets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 42, "name": "Main Branch Ruleset", "target": "branch", "enforcement": "active" }
        ])))
        .mount(&mock_server)
        .await;

    let store = create_store(&mock_server);

    let policies = store
        .list_policies(&target("acme/widget"))
        .await
        .expect("listing succeeds");

    assert_eq!(
        policies,
        vec![ExistingPolicy {
            id: PolicyId::new("42"),
            name: "Main Branch Ruleset".to_string()
        }]
    );
}

#[tokio::test]
async fn test_list_policies_auth_failure_is_classified() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/rulesets"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Bad credentials",
            "documentation_url": "https://docs.github.com/rest"
        })))
        .mount(&mock_server)
        .await;

    let store = create_store(&mock_server);

    let err = store
        .list_policies(&target("acme/widget"))
        .await
        .expect_err("listing fails");

    assert!(err.is_auth());
}

#[tokio::test]
async fn test_delete_policy_rejects_non_numeric_id() {
    let mock_server = MockServer::start().await;
    let store = create_store(&mock_server);

    let err = store
        .delete_policy(&target("acme/widget"), &PolicyId::new("abc"))
        .await
        .expect_err("non numeric IDs are rejected");

    assert_eq!(err.kind, StoreErrorKind::Other);
    assert!(err.message.contains("abc"));
}

#[tokio::test]
async fn test_create_policy_sends_rendered_payload() {
    let mock_server = MockServer::start().await;
    let payload = PolicySpec::main_branch_ruleset().render(&DefaultRef::new("develop").unwrap());

    let mut created = serde_json::to_value(&payload).unwrap();
    created["id"] = json!(314);

    Mock::given(method("POST"))
        .and(path("/repos/acme/widget/rulesets"))
        .and(body_json(serde_json::to_value(&payload).unwrap()))
        .respond_with(ResponseTemplate::new(201).set_body_json(created))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = create_store(&mock_server);

    let id = store
        .create_policy(&target("acme/widget"), &payload)
        .await
        .expect("creation succeeds");

    assert_eq!(id, PolicyId::new("314"));
}

#[tokio::test]
async fn test_discover_targets_skips_archived() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "widget", "full_name": "acme/widget" },
            { "name": "attic", "full_name": "acme/attic", "archived": true },
            { "name": "legacy", "full_name": "acme/legacy" }
        ])))
        .mount(&mock_server)
        .await;

    let store = create_store(&mock_server);

    let targets = store
        .discover_targets(Some("acme"))
        .await
        .expect("discovery succeeds");

    assert_eq!(targets, vec!["acme/widget", "acme/legacy"]);
}

/// Replace mode against the REST API: both stale rulesets are deleted, then
/// exactly one ruleset is created for the resolved branch.
#[tokio::test]
async fn test_replace_mode_end_to_end() {
    let mock_server = MockServer::start().await;
    mount_repository(&mock_server, "acme/legacy", "master").await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/legacy/rulesets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 7, "name": "old-a", "target": "branch", "enforcement": "active" },
            { "id": 9, "name": "old-b", "target": "branch", "enforcement": "active" }
        ])))
        .mount(&mock_server)
        .await;

    for id in [7, 9] {
        Mock::given(method("DELETE"))
            .and(path(format!("/repos/acme/legacy/rulesets/{id}")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let expected = PolicySpec::main_branch_ruleset().render(&DefaultRef::new("master").unwrap());
    let mut created = serde_json::to_value(&expected).unwrap();
    created["id"] = json!(11);

    Mock::given(method("POST"))
        .and(path("/repos/acme/legacy/rulesets"))
        .and(body_json(serde_json::to_value(&expected).unwrap()))
        .respond_with(ResponseTemplate::new(201).set_body_json(created))
        .expect(1)
        .mount(&mock_server)
        .await;

    let reconciler = PolicyReconciler::new(
        create_store(&mock_server),
        PolicySpec::main_branch_ruleset(),
    );

    let outcome = reconciler
        .reconcile("acme/legacy", ConflictPolicy::Replace)
        .await;

    match outcome {
        Outcome::Applied {
            policy_id,
            ref_name,
            replaced,
            cleanup_errors,
        } => {
            assert_eq!(policy_id, PolicyId::new("11"));
            assert_eq!(ref_name, "master");
            assert_eq!(replaced, vec![PolicyId::new("7"), PolicyId::new("9")]);
            assert!(cleanup_errors.is_empty());
        }
        other => panic!("Expected Applied, got {other:?}"),
    }
}

/// Ids carrying URL metacharacters are rejected before any request is sent,
/// so a fragment can never redirect the calls to another repository.
#[tokio::test]
async fn test_malformed_target_sends_no_requests() {
    let mock_server = MockServer::start().await;
    mount_repository(&mock_server, "acme/widget", "main").await;

    let reconciler = PolicyReconciler::new(
        create_store(&mock_server),
        PolicySpec::main_branch_ruleset(),
    );

    for raw in ["acme/widget#typo", "acme/widget?x=1", "acme/.."] {
        let outcome = reconciler.reconcile(raw, ConflictPolicy::Replace).await;

        match outcome {
            Outcome::Failed(crate::errors::SyncError::Validation(_)) => {}
            other => panic!("Expected validation failure for {raw}, got {other:?}"),
        }
    }

    let received = mock_server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty(), "unexpected requests: {received:?}");
}
