//! Desired-state policy types.
//!
//! A [`PolicySpec`] is the fixed template applied to every target in a run. It is
//! rendered into a [`RepositoryRuleset`] payload once the target's branch is known.

use github_client::{
    MergeMethod, PullRequestParameters, RefNameCondition, RepositoryRuleset, Rule,
    RulesetConditions, RulesetEnforcement, RulesetTarget,
};
use serde::{Deserialize, Serialize};

use crate::target::DefaultRef;

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;

/// Name of the canonical ruleset.
pub const MAIN_BRANCH_RULESET_NAME: &str = "Main Branch Ruleset";

/// Placeholder substituted with the resolved branch name.
pub const REF_PLACEHOLDER: &str = "{ref}";

/// Behaviour when a target already carries a policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictPolicy {
    /// Remove every existing policy, then create the new one.
    #[serde(rename = "replace")]
    Replace,

    /// Leave existing policies untouched and skip the target.
    #[default]
    #[serde(rename = "skip")]
    SkipIfExists,
}

impl std::fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictPolicy::Replace => write!(f, "replace"),
            ConflictPolicy::SkipIfExists => write!(f, "skip"),
        }
    }
}

/// Opaque identifier of a stored policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyId(String);

impl PolicyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for PolicyId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for PolicyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A policy already present at a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingPolicy {
    pub id: PolicyId,
    pub name: String,
}

/// Parameters of the pull-request-required clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestClause {
    pub required_approvals: u32,
    pub dismiss_stale_reviews: bool,
    pub require_thread_resolution: bool,
    pub allowed_merge_methods: Vec<MergeMethod>,
}

/// A single rule of the desired policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleClause {
    /// Block force pushes to the protected branch.
    NoForcePush,
    /// Changes must land through a pull request.
    PullRequestRequired(PullRequestClause),
}

impl RuleClause {
    fn to_rule(&self) -> Rule {
        match self {
            RuleClause::NoForcePush => Rule::NonFastForward,
            RuleClause::PullRequestRequired(clause) => Rule::PullRequest {
                parameters: PullRequestParameters {
                    dismiss_stale_reviews_on_push: Some(clause.dismiss_stale_reviews),
                    require_code_owner_review: Some(false),
                    require_last_push_approval: Some(false),
                    required_approving_review_count: Some(clause.required_approvals),
                    required_review_thread_resolution: Some(clause.require_thread_resolution),
                    allowed_merge_methods: Some(clause.allowed_merge_methods.clone()),
                },
            },
        }
    }
}

/// The immutable desired-state template shared by every target of a run.
///
/// # Examples
///
/// ```rust
/// use ruleset_sync_core::{DefaultRef, PolicySpec};
///
/// let spec = PolicySpec::main_branch_ruleset();
/// let payload = spec.render(&DefaultRef::new("develop").unwrap());
///
/// let include = &payload.conditions.as_ref().unwrap().ref_name.include;
/// assert_eq!(include, &vec!["refs/heads/develop".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PolicySpec {
    name: String,
    target_kind: RulesetTarget,
    enforcement: RulesetEnforcement,
    ref_include_template: String,
    ref_exclude: Vec<String>,
    rules: Vec<RuleClause>,
}

impl PolicySpec {
    /// The canonical "Main Branch Ruleset": no force pushes, and pull requests
    /// required with zero approvals, stale review dismissal, conversation
    /// resolution and every merge method allowed.
    pub fn main_branch_ruleset() -> Self {
        Self {
            name: MAIN_BRANCH_RULESET_NAME.to_string(),
            target_kind: RulesetTarget::Branch,
            enforcement: RulesetEnforcement::Active,
            ref_include_template: format!("refs/heads/{}", REF_PLACEHOLDER),
            ref_exclude: Vec::new(),
            rules: vec![
                RuleClause::NoForcePush,
                RuleClause::PullRequestRequired(PullRequestClause {
                    required_approvals: 0,
                    dismiss_stale_reviews: true,
                    require_thread_resolution: true,
                    allowed_merge_methods: vec![
                        MergeMethod::Merge,
                        MergeMethod::Squash,
                        MergeMethod::Rebase,
                    ],
                }),
            ],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[RuleClause] {
        &self.rules
    }

    /// The include pattern for a resolved branch, e.g. `refs/heads/develop`.
    pub fn ref_pattern(&self, default_ref: &DefaultRef) -> String {
        self.ref_include_template
            .replace(REF_PLACEHOLDER, default_ref.as_str())
    }

    /// Builds the concrete payload for one target.
    pub fn render(&self, default_ref: &DefaultRef) -> RepositoryRuleset {
        RepositoryRuleset {
            id: None,
            name: self.name.clone(),
            target: self.target_kind.clone(),
            enforcement: self.enforcement.clone(),
            bypass_actors: Vec::new(),
            conditions: Some(RulesetConditions {
                ref_name: RefNameCondition {
                    include: vec![self.ref_pattern(default_ref)],
                    exclude: self.ref_exclude.clone(),
                },
            }),
            rules: self.rules.iter().map(RuleClause::to_rule).collect(),
            source_type: None,
        }
    }
}

impl Default for PolicySpec {
    fn default() -> Self {
        Self::main_branch_ruleset()
    }
}
