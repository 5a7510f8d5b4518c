//! Effects-as-data for hosting API operations.
//!
//! This module defines effect types that describe operations without executing them.
//! This enables:
//! - Core logic that is independent of any particular hosting provider
//! - Testability via mock interpreters
//! - Dry runs via a logging interpreter

pub mod github;
pub mod interpreter;

pub use github::{GitHubEffect, GitHubResponse, MergeMethod};
pub use interpreter::GitHubInterpreter;
