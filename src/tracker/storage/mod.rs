//! Storage is organized through [log_store::JsonLogStore].
//!  The basic idea is:
//!   - There is a single JSON file with every entry ever logged.
//!   - The file holds two append-only lists: priorities and actions.
//!   - Files written by older versions are migrated on load, see [migration].

pub mod entities;
pub mod log_store;
pub mod migration;
