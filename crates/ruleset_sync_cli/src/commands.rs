//! Command modules for the ruleset-sync CLI.
//!
//! - `auth_cmd`: storing and inspecting the GitHub credential
//! - `sync_cmd`: applying the branch ruleset to repositories

pub mod auth_cmd;
pub mod sync_cmd;
