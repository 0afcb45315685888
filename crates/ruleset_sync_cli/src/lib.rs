//! ruleset-sync CLI library exports.
//!
//! The binary is a thin wrapper around these modules; they are public so the
//! command implementations can be exercised without spawning the process.

pub mod commands;
pub mod config;
pub mod errors;
pub mod reporter;
pub mod sources;
