//! Target sources for a sync run.
//!
//! Sources only clean up the list they produce: entries are trimmed, empty ones
//! dropped and duplicates removed (case-insensitively, keeping the first
//! spelling). Syntax checking is left to the reconciler so malformed entries
//! show up as failed targets in the report.

use std::collections::HashSet;
use std::io::{self, BufRead, Write};

use ruleset_sync_core::TargetDiscovery;
use tracing::{debug, info, warn};

use crate::errors::Error;

#[cfg(test)]
#[path = "sources_tests.rs"]
mod tests;

/// Where the targets of a run come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSource {
    /// A list given on the command line.
    Explicit(Vec<String>),
    /// Every repository accessible to the credential, optionally for one owner.
    All { owner: Option<String> },
    /// One target per line from standard input, until a blank line or EOF.
    Interactive,
}

/// Trims, drops empty entries and removes duplicates, preserving first-seen order.
pub fn normalize_targets<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut targets = Vec::new();

    for entry in raw {
        let entry = entry.as_ref().trim();
        if entry.is_empty() {
            continue;
        }
        if seen.insert(entry.to_lowercase()) {
            targets.push(entry.to_string());
        } else {
            debug!(target_id = entry, "Dropping duplicate target");
        }
    }

    targets
}

/// Reads target identifiers, one per line, until a blank line or EOF.
///
/// The prompt is written to `prompt`, keeping standard output free for the report.
pub fn read_interactive_targets<R, W>(input: R, prompt: &mut W) -> Result<Vec<String>, Error>
where
    R: BufRead,
    W: Write,
{
    writeln!(
        prompt,
        "Enter repositories as owner/name, one per line. Finish with an empty line:"
    )
    .map_err(|_| Error::StdOutFlushFailed)?;
    prompt.flush().map_err(|_| Error::StdOutFlushFailed)?;

    let mut lines = Vec::new();
    for line in input.lines() {
        let line = line.map_err(Error::ReadInput)?;
        if line.trim().is_empty() {
            break;
        }
        lines.push(line);
    }

    Ok(normalize_targets(lines))
}

/// Produces the ordered target list for a run.
pub async fn produce_targets<D>(source: &TargetSource, discovery: &D) -> Result<Vec<String>, Error>
where
    D: TargetDiscovery + ?Sized,
{
    let targets = match source {
        TargetSource::Explicit(list) => normalize_targets(list),
        TargetSource::All { owner } => {
            let discovered = discovery
                .discover_targets(owner.as_deref())
                .await
                .map_err(|e| Error::Discovery(e.message))?;
            if discovered.is_empty() {
                warn!("No accessible repositories were found");
            } else {
                info!(count = discovered.len(), "Discovered repositories");
            }
            normalize_targets(discovered)
        }
        TargetSource::Interactive => {
            let stdin = io::stdin();
            read_interactive_targets(stdin.lock(), &mut io::stderr())?
        }
    };

    if targets.is_empty() && !matches!(source, TargetSource::All { .. }) {
        return Err(Error::InvalidArguments(
            "No target repositories were provided".to_string(),
        ));
    }

    Ok(targets)
}
