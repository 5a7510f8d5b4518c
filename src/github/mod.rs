//! GitHub API client and effect interpreter.
//!
//! This module provides the implementation for executing GitHub effects via the octocrab
//! library. It implements the `GitHubInterpreter` trait defined in the effects module.
//!
//! Key features:
//! - Exponential backoff retry for transient failures on read-only calls
//! - Distinguishes transient, permanent, and merge-rejection errors
//! - A dry-run interpreter that logs mutations instead of executing them

mod client;
mod dry_run;
mod error;
mod interpreter;
mod retry;

pub use client::OctocrabClient;
pub use dry_run::LoggingGitHubInterpreter;
pub use error::{GitHubApiError, GitHubErrorKind};
pub use interpreter::interpret_github_effect;
pub use retry::{RetryConfig, RetryPolicy, RetryResult, retry_with_backoff};
