//! In-memory collaborators shared by the unit tests of this crate.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use github_client::RepositoryRuleset;

use crate::errors::StoreError;
use crate::policy::{ExistingPolicy, PolicyId};
use crate::report::{Reporter, RunSummary, TargetOutcome};
use crate::store::PolicyStore;
use crate::target::TargetId;

/// A call received by [`InMemoryPolicyStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    ResolveDefaultRef(String),
    List(String),
    Delete(String, PolicyId),
    Create(String, RepositoryRuleset),
}

#[derive(Debug, Clone)]
struct StoredPolicy {
    id: PolicyId,
    name: String,
    payload: Option<RepositoryRuleset>,
}

#[derive(Debug, Default)]
struct State {
    default_branches: HashMap<String, String>,
    policies: HashMap<String, Vec<StoredPolicy>>,
    calls: Vec<StoreCall>,
    fail_resolve: HashSet<String>,
    fail_list: HashMap<String, StoreError>,
    fail_delete: HashMap<(String, String), StoreError>,
    fail_create: HashMap<String, StoreError>,
    delays: HashMap<String, Duration>,
}

/// A [`PolicyStore`] keeping everything in memory, with failure injection.
#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
    state: Mutex<State>,
    next_id: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1000),
            ..Default::default()
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn set_default_branch(&self, target: &str, branch: &str) {
        self.state()
            .default_branches
            .insert(target.to_string(), branch.to_string());
    }

    pub fn add_policy(&self, target: &str, id: &str, name: &str) {
        self.state()
            .policies
            .entry(target.to_string())
            .or_default()
            .push(StoredPolicy {
                id: PolicyId::new(id),
                name: name.to_string(),
                payload: None,
            });
    }

    pub fn fail_resolve(&self, target: &str) {
        self.state().fail_resolve.insert(target.to_string());
    }

    pub fn fail_list(&self, target: &str, error: StoreError) {
        self.state().fail_list.insert(target.to_string(), error);
    }

    pub fn fail_delete(&self, target: &str, id: &str, error: StoreError) {
        self.state()
            .fail_delete
            .insert((target.to_string(), id.to_string()), error);
    }

    pub fn fail_create(&self, target: &str, error: StoreError) {
        self.state().fail_create.insert(target.to_string(), error);
    }

    /// Delays the listing call for `target`, holding it in flight.
    pub fn delay(&self, target: &str, delay: Duration) {
        self.state().delays.insert(target.to_string(), delay);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    /// Targets in the order their first store call was received.
    pub fn attempted_targets(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for call in self.state().calls.iter() {
            let target = match call {
                StoreCall::ResolveDefaultRef(t)
                | StoreCall::List(t)
                | StoreCall::Delete(t, _)
                | StoreCall::Create(t, _) => t,
            };
            if !seen.contains(target) {
                seen.push(target.clone());
            }
        }
        seen
    }

    pub fn deleted_ids(&self, target: &str) -> Vec<PolicyId> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                StoreCall::Delete(t, id) if t == target => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn created_payloads(&self, target: &str) -> Vec<RepositoryRuleset> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                StoreCall::Create(t, payload) if t == target => Some(payload.clone()),
                _ => None,
            })
            .collect()
    }

    /// IDs of the policies currently stored at `target`.
    pub fn policy_ids(&self, target: &str) -> Vec<PolicyId> {
        self.state()
            .policies
            .get(target)
            .map(|p| p.iter().map(|p| p.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Payloads of the policies currently stored at `target` that this store created.
    pub fn stored_payloads(&self, target: &str) -> Vec<RepositoryRuleset> {
        self.state()
            .policies
            .get(target)
            .map(|p| p.iter().filter_map(|p| p.payload.clone()).collect())
            .unwrap_or_default()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn resolve_default_ref(&self, target: &TargetId) -> Result<Option<String>, StoreError> {
        let key = target.to_string();
        let mut state = self.state();
        state.calls.push(StoreCall::ResolveDefaultRef(key.clone()));

        if state.fail_resolve.contains(&key) {
            return Err(StoreError::other("connection reset"));
        }
        Ok(state.default_branches.get(&key).cloned())
    }

    async fn list_policies(&self, target: &TargetId) -> Result<Vec<ExistingPolicy>, StoreError> {
        let key = target.to_string();
        let delay = {
            let mut state = self.state();
            state.calls.push(StoreCall::List(key.clone()));
            state.delays.get(&key).copied()
        };

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let state = self.state();
        if let Some(error) = state.fail_list.get(&key) {
            return Err(error.clone());
        }
        Ok(state
            .policies
            .get(&key)
            .map(|policies| {
                policies
                    .iter()
                    .map(|p| ExistingPolicy {
                        id: p.id.clone(),
                        name: p.name.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete_policy(&self, target: &TargetId, id: &PolicyId) -> Result<(), StoreError> {
        let key = target.to_string();
        let mut state = self.state();
        state.calls.push(StoreCall::Delete(key.clone(), id.clone()));

        if let Some(error) = state.fail_delete.get(&(key.clone(), id.to_string())) {
            return Err(error.clone());
        }

        let policies = state.policies.entry(key).or_default();
        let before = policies.len();
        policies.retain(|p| &p.id != id);
        if policies.len() == before {
            return Err(StoreError::not_found(format!("ruleset {} not found", id)));
        }
        Ok(())
    }

    async fn create_policy(
        &self,
        target: &TargetId,
        payload: &RepositoryRuleset,
    ) -> Result<PolicyId, StoreError> {
        let key = target.to_string();
        let mut state = self.state();
        state
            .calls
            .push(StoreCall::Create(key.clone(), payload.clone()));

        if let Some(error) = state.fail_create.get(&key) {
            return Err(error.clone());
        }

        let id = PolicyId::from(self.next_id.fetch_add(1, Ordering::SeqCst));
        state.policies.entry(key).or_default().push(StoredPolicy {
            id: id.clone(),
            name: payload.name.clone(),
            payload: Some(payload.clone()),
        });
        Ok(id)
    }
}

/// A [`Reporter`] that records everything it receives.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub outcomes: Vec<TargetOutcome>,
    pub summary: Option<RunSummary>,
}

impl Reporter for RecordingReporter {
    fn on_outcome(&mut self, outcome: &TargetOutcome) {
        self.outcomes.push(outcome.clone());
    }

    fn on_complete(&mut self, summary: &RunSummary) {
        self.summary = Some(summary.clone());
    }
}
