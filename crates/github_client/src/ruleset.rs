//! Repository ruleset wire types.
//!
//! This module contains types representing GitHub repository rulesets and their rules,
//! shaped exactly like the JSON accepted and returned by the rulesets endpoints.
//!
//! See: https://docs.github.com/en/rest/repos/rules

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "ruleset_tests.rs"]
mod tests;

/// Represents a repository ruleset.
///
/// The same type is used for the create payload (with `id` unset) and for the
/// responses of the list and create endpoints.
///
/// # Examples
///
/// ```rust
/// use github_client::{RepositoryRuleset, RulesetTarget, RulesetEnforcement};
///
/// let ruleset = RepositoryRuleset {
///     id: None,
///     name: "main-protection".to_string(),
///     target: RulesetTarget::Branch,
///     enforcement: RulesetEnforcement::Active,
///     bypass_actors: vec![],
///     conditions: None,
///     rules: vec![],
///     source_type: None,
/// };
/// assert!(ruleset.id.is_none());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RepositoryRuleset {
    /// Ruleset ID (None for creation)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    /// Ruleset name
    pub name: String,

    /// Target type (branch or tag)
    pub target: RulesetTarget,

    /// Enforcement level
    pub enforcement: RulesetEnforcement,

    /// Actors who can bypass this ruleset
    #[serde(default)]
    pub bypass_actors: Vec<BypassActor>,

    /// Conditions for when this ruleset applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<RulesetConditions>,

    /// Rules in this ruleset
    ///
    /// Note: GitHub's LIST rulesets endpoint does not include rules in the response.
    #[serde(default)]
    pub rules: Vec<Rule>,

    /// Where the ruleset is defined ("Repository" or "Organization").
    /// Returned by GitHub, never sent.
    #[serde(default, skip_serializing)]
    pub source_type: Option<String>,
}

/// Target type for a ruleset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RulesetTarget {
    /// Ruleset applies to branches
    Branch,
    /// Ruleset applies to tags
    Tag,
    /// Ruleset applies to pushes
    Push,
}

/// Enforcement level for a ruleset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RulesetEnforcement {
    /// Ruleset is disabled
    Disabled,
    /// Ruleset is active and enforced
    Active,
    /// Ruleset is in evaluation mode (logs only, doesn't block)
    Evaluate,
}

/// Actor who can bypass a ruleset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BypassActor {
    /// Actor ID. GitHub reports `null` for the organization admin role.
    pub actor_id: Option<u64>,

    /// Actor type
    pub actor_type: BypassActorType,

    /// Bypass mode
    pub bypass_mode: BypassMode,
}

/// Type of actor that can bypass a ruleset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum BypassActorType {
    /// Organization admin role
    OrganizationAdmin,
    /// Repository-level role (admin, maintain, write)
    RepositoryRole,
    /// Team (use team ID as actor_id)
    Team,
    /// Integration (GitHub App)
    Integration,
    /// Deploy key
    DeployKey,
}

/// Mode for bypassing a ruleset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BypassMode {
    /// Always allow bypass
    Always,
    /// Bypass only through a pull request
    PullRequest,
}

/// Conditions for when a ruleset applies.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RulesetConditions {
    /// Reference name patterns
    pub ref_name: RefNameCondition,
}

/// Reference name condition.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefNameCondition {
    /// Patterns to include
    pub include: Vec<String>,

    /// Patterns to exclude
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// A rule within a ruleset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    /// Block force pushes
    NonFastForward,

    /// Pull request requirements
    PullRequest {
        /// Pull request parameters
        parameters: PullRequestParameters,
    },

    /// Any rule type this client does not model. Only produced when reading.
    #[serde(other)]
    Unsupported,
}

/// Parameters for pull request rules.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequestParameters {
    /// Dismiss stale reviews when new commits are pushed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dismiss_stale_reviews_on_push: Option<bool>,

    /// Require code owner review
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_code_owner_review: Option<bool>,

    /// Require last push approval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_last_push_approval: Option<bool>,

    /// Required approving review count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_approving_review_count: Option<u32>,

    /// Required review thread resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_review_thread_resolution: Option<bool>,

    /// Allowed merge methods
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_merge_methods: Option<Vec<MergeMethod>>,
}

/// Allowed merge methods for pull requests.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MergeMethod {
    /// Merge commit
    Merge,
    /// Squash merge
    Squash,
    /// Rebase merge
    Rebase,
}
