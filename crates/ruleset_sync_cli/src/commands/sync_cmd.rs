//! Sync command module.
//!
//! Applies the "Main Branch Ruleset" to the selected repositories. Targets come
//! from `--targets`, from discovery with `--all`, or from standard input. The
//! run never stops on a failing repository; the exit status reflects the
//! aggregate result.

use clap::{Args, ValueEnum};
use github_client::{create_anonymous_client, create_token_client, GitHubClient};
use octocrab::Octocrab;
use ruleset_sync_core::{
    run_sync, CancellationFlag, ConflictPolicy, GhCliPolicyStore, GitHubPolicyStore,
    PolicyReconciler, PolicySpec, PolicyStore, Reporter, RunSummary, SyncOptions,
    TargetDiscovery,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    commands::auth_cmd::resolve_token,
    config::{AppConfig, Transport},
    errors::Error,
    reporter::ConsoleReporter,
    sources::{produce_targets, TargetSource},
};

#[cfg(test)]
#[path = "sync_cmd_tests.rs"]
mod tests;

/// Command-line spelling of the conflict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConflictPolicyArg {
    /// Delete every existing ruleset, then create the new one.
    Replace,
    /// Leave repositories that already have rulesets untouched.
    Skip,
}

impl From<ConflictPolicyArg> for ConflictPolicy {
    fn from(arg: ConflictPolicyArg) -> Self {
        match arg {
            ConflictPolicyArg::Replace => ConflictPolicy::Replace,
            ConflictPolicyArg::Skip => ConflictPolicy::SkipIfExists,
        }
    }
}

/// Arguments of the `sync` command.
#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Comma separated list of repositories (owner/name).
    #[arg(long, value_delimiter = ',', conflicts_with = "all")]
    pub targets: Vec<String>,

    /// Sync every repository accessible with the current credential.
    #[arg(long)]
    pub all: bool,

    /// Restrict `--all` to one user or organization.
    #[arg(long, requires = "all")]
    pub owner: Option<String>,

    /// Maximum number of repositories processed at once.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// How to talk to GitHub.
    #[arg(long, value_enum)]
    pub transport: Option<Transport>,
}

impl SyncArgs {
    /// The target source selected by the flags.
    pub fn target_source(&self) -> TargetSource {
        if self.all {
            TargetSource::All {
                owner: self.owner.clone(),
            }
        } else if !self.targets.is_empty() {
            TargetSource::Explicit(self.targets.clone())
        } else {
            TargetSource::Interactive
        }
    }
}

/// Aggregate result of the command, mapped to the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncExit {
    /// Every target was applied or skipped.
    Success,
    /// At least one target failed.
    Failures,
    /// The run was interrupted.
    Cancelled,
}

impl SyncExit {
    pub fn from_summary(summary: &RunSummary) -> Self {
        if summary.cancelled {
            SyncExit::Cancelled
        } else if summary.is_success() {
            SyncExit::Success
        } else {
            SyncExit::Failures
        }
    }

    pub fn code(self) -> i32 {
        match self {
            SyncExit::Success => 0,
            SyncExit::Failures => 1,
            SyncExit::Cancelled => 130,
        }
    }
}

/// Merges command-line flags over configuration values.
pub fn resolve_options(
    args: &SyncArgs,
    conflict_policy: Option<ConflictPolicyArg>,
    config: &AppConfig,
) -> Result<SyncOptions, Error> {
    let max_concurrency = args.concurrency.unwrap_or(config.sync.max_concurrency);
    if max_concurrency == 0 {
        return Err(Error::InvalidArguments(
            "--concurrency must be at least 1".to_string(),
        ));
    }

    Ok(SyncOptions {
        conflict_policy: conflict_policy
            .map(ConflictPolicy::from)
            .unwrap_or(config.sync.conflict_policy),
        max_concurrency,
    })
}

/// Executes the sync command and returns the exit classification.
#[instrument(skip(args, config))]
pub async fn execute(
    args: &SyncArgs,
    conflict_policy: Option<ConflictPolicyArg>,
    config: &AppConfig,
) -> Result<SyncExit, Error> {
    let options = resolve_options(args, conflict_policy, config)?;
    let source = args.target_source();
    let transport = args.transport.unwrap_or(config.sync.transport);

    debug!(?options, ?source, ?transport, "Resolved sync settings");

    let cancel = CancellationFlag::new();
    let arm_interrupt = || watch_for_interrupt(cancel.clone());

    let mut reporter = ConsoleReporter::stdout();

    let summary = match transport {
        Transport::Api => {
            let client = GitHubClient::new(build_client(config)?);
            run(
                GitHubPolicyStore::new(client),
                &source,
                options,
                &cancel,
                arm_interrupt,
                &mut reporter,
            )
            .await?
        }
        Transport::Gh => {
            run(
                GhCliPolicyStore::new(),
                &source,
                options,
                &cancel,
                arm_interrupt,
                &mut reporter,
            )
            .await?
        }
    };

    Ok(SyncExit::from_summary(&summary))
}

/// Produces the targets from `source` and runs them through a reconciler over `store`.
///
/// `on_targets_ready` is called once the target list is complete, before the
/// first repository is started. Interactive input is read before it runs, so a
/// Ctrl-C at the prompt still terminates the process.
pub async fn run<S, F, R>(
    store: S,
    source: &TargetSource,
    options: SyncOptions,
    cancel: &CancellationFlag,
    on_targets_ready: F,
    reporter: &mut R,
) -> Result<RunSummary, Error>
where
    S: PolicyStore + TargetDiscovery,
    F: FnOnce(),
    R: Reporter,
{
    let targets = produce_targets(source, &store).await?;
    info!(count = targets.len(), "Syncing repositories");
    on_targets_ready();

    let reconciler = PolicyReconciler::new(store, PolicySpec::main_branch_ruleset());
    Ok(run_sync(&reconciler, targets, options, cancel, reporter).await)
}

/// Builds the REST client, anonymously when no token is available.
fn build_client(config: &AppConfig) -> Result<Octocrab, Error> {
    let api_base_url = config.github.api_base_url.as_deref();

    match resolve_token(config) {
        Some(resolved) => {
            debug!(source = %resolved.source, "Using GitHub token");
            create_token_client(&resolved.token, api_base_url)
                .map_err(|e| Error::Auth(e.to_string()))
        }
        None => {
            warn!("No GitHub token found, requests are unauthenticated");
            create_anonymous_client(api_base_url).map_err(|e| Error::Auth(e.to_string()))
        }
    }
}

/// Sets `cancel` on Ctrl-C. In-flight repositories are allowed to finish.
fn watch_for_interrupt(cancel: CancellationFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight repositories");
            eprintln!("Interrupted: no further repositories will be started.");
            cancel.cancel();
        }
    });
}
