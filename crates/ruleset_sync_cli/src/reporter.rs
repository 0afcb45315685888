//! Console rendering of sync results.

use std::io::{self, Write};

use colored::Colorize;
use ruleset_sync_core::{Outcome, Reporter, RunSummary, TargetOutcome};
use tracing::warn;

#[cfg(test)]
#[path = "reporter_tests.rs"]
mod tests;

/// Writes one status line per target and a closing summary line.
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            warn!(error = %e, "Failed to write report line");
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn on_outcome(&mut self, outcome: &TargetOutcome) {
        let line = format_outcome_line(outcome);
        self.write_line(&line);

        if let Outcome::Applied { cleanup_errors, .. } = &outcome.outcome {
            for error in cleanup_errors {
                let line = format!("    {} {}", "warning:".yellow(), error);
                self.write_line(&line);
            }
        }
    }

    fn on_complete(&mut self, summary: &RunSummary) {
        let line = format_summary_line(summary);
        self.write_line(&line);
    }
}

/// Formats the status line of one target.
pub fn format_outcome_line(record: &TargetOutcome) -> String {
    match &record.outcome {
        Outcome::Applied {
            policy_id,
            ref_name,
            replaced,
            ..
        } => {
            let mut line = format!(
                "{} {}: ruleset {} on branch '{}'",
                "APPLIED".green().bold(),
                record.target,
                policy_id,
                ref_name
            );
            if !replaced.is_empty() {
                let ids: Vec<&str> = replaced.iter().map(|id| id.as_str()).collect();
                line.push_str(&format!(" (replaced {})", ids.join(", ")));
            }
            line
        }
        Outcome::Skipped {
            reason,
            existing_ids,
        } => {
            let ids: Vec<&str> = existing_ids.iter().map(|id| id.as_str()).collect();
            format!(
                "{} {}: {} ({})",
                "SKIPPED".yellow().bold(),
                record.target,
                reason,
                ids.join(", ")
            )
        }
        Outcome::Failed(error) => format!(
            "{} {}: {}",
            "FAILED".red().bold(),
            record.target,
            error
        ),
    }
}

/// Formats the final count line.
pub fn format_summary_line(summary: &RunSummary) -> String {
    let mut line = format!(
        "{} applied, {} skipped, {} failed",
        summary.applied, summary.skipped, summary.failed
    );

    if summary.cancelled {
        line.push_str(&format!(
            "; cancelled ({} not attempted)",
            summary.not_attempted
        ));
    }

    if summary.failed > 0 {
        line.red().to_string()
    } else {
        line
    }
}
