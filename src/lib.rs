//! Release Cascade - forward-ports a change merged into one release branch
//! through every later `release/v*` branch.
//!
//! This library provides the version ordering, chain building, and cascade
//! orchestration, plus an octocrab-backed GitHub collaborator.

pub mod cascade;
pub mod chain;
pub mod effects;
pub mod github;
pub mod status;
pub mod types;
pub mod version;

#[cfg(test)]
pub mod test_utils;
