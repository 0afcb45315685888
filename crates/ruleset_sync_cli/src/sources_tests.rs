use super::*;
use async_trait::async_trait;
use ruleset_sync_core::StoreError;
use std::io::Cursor;

struct FixedDiscovery(Result<Vec<String>, StoreError>);

#[async_trait]
impl TargetDiscovery for FixedDiscovery {
    async fn discover_targets(&self, owner: Option<&str>) -> Result<Vec<String>, StoreError> {
        self.0.clone().map(|targets| {
            targets
                .into_iter()
                .filter(|t| owner.map_or(true, |o| t.starts_with(&format!("{}/", o))))
                .collect()
        })
    }
}

#[test]
fn test_normalize_trims_and_drops_empty_entries() {
    let targets = normalize_targets(["  acme/widget ", "", "   ", "acme/legacy"]);

    assert_eq!(targets, vec!["acme/widget", "acme/legacy"]);
}

#[test]
fn test_normalize_dedupes_case_insensitively_keeping_first() {
    let targets = normalize_targets(["Acme/Widget", "acme/legacy", "acme/widget", "ACME/LEGACY"]);

    assert_eq!(targets, vec!["Acme/Widget", "acme/legacy"]);
}

#[test]
fn test_normalize_keeps_malformed_entries() {
    let targets = normalize_targets(["not-a-target", "a/b/c"]);

    assert_eq!(targets, vec!["not-a-target", "a/b/c"]);
}

#[test]
fn test_read_interactive_stops_at_blank_line() {
    let input = Cursor::new("acme/widget\nacme/legacy\n\nacme/ignored\n");
    let mut prompt = Vec::new();

    let targets = read_interactive_targets(input, &mut prompt).expect("input read");

    assert_eq!(targets, vec!["acme/widget", "acme/legacy"]);
    assert!(String::from_utf8(prompt).unwrap().contains("owner/name"));
}

#[test]
fn test_read_interactive_stops_at_eof() {
    let input = Cursor::new("acme/widget\n acme/widget \nacme/legacy");
    let mut prompt = Vec::new();

    let targets = read_interactive_targets(input, &mut prompt).expect("input read");

    assert_eq!(targets, vec!["acme/widget", "acme/legacy"]);
}

#[test]
fn test_read_interactive_empty_input() {
    let mut prompt = Vec::new();

    let targets = read_interactive_targets(Cursor::new(""), &mut prompt).expect("input read");

    assert!(targets.is_empty());
}

#[tokio::test]
async fn test_produce_explicit_targets() {
    let discovery = FixedDiscovery(Ok(Vec::new()));
    let source = TargetSource::Explicit(vec![
        "acme/widget".to_string(),
        "acme/widget".to_string(),
        "acme/legacy".to_string(),
    ]);

    let targets = produce_targets(&source, &discovery).await.unwrap();

    assert_eq!(targets, vec!["acme/widget", "acme/legacy"]);
}

#[tokio::test]
async fn test_produce_explicit_empty_list_is_error() {
    let discovery = FixedDiscovery(Ok(Vec::new()));
    let source = TargetSource::Explicit(vec![" ".to_string()]);

    let result = produce_targets(&source, &discovery).await;

    assert!(matches!(result, Err(Error::InvalidArguments(_))));
}

#[tokio::test]
async fn test_produce_discovered_targets_for_owner() {
    let discovery = FixedDiscovery(Ok(vec![
        "acme/widget".to_string(),
        "other/tool".to_string(),
        "acme/legacy".to_string(),
    ]));
    let source = TargetSource::All {
        owner: Some("acme".to_string()),
    };

    let targets = produce_targets(&source, &discovery).await.unwrap();

    assert_eq!(targets, vec!["acme/widget", "acme/legacy"]);
}

#[tokio::test]
async fn test_produce_discovery_with_no_repositories() {
    let discovery = FixedDiscovery(Ok(Vec::new()));
    let source = TargetSource::All { owner: None };

    let targets = produce_targets(&source, &discovery).await.unwrap();

    assert!(targets.is_empty());
}

#[tokio::test]
async fn test_produce_discovery_failure() {
    let discovery = FixedDiscovery(Err(StoreError::auth("Bad credentials")));
    let source = TargetSource::All { owner: None };

    let result = produce_targets(&source, &discovery).await;

    match result {
        Err(Error::Discovery(message)) => assert_eq!(message, "Bad credentials"),
        other => panic!("Expected discovery error, got {other:?}"),
    }
}
