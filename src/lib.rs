//! Small terminal companion that asks every quarter hour what you got done and what's next, and
//! appends the answers to a local JSON log.
//!

pub mod cli;
pub mod fs;
pub mod tracker;
pub mod utils;
