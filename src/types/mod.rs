//! Core domain types for the release cascade.
//!
//! Identifiers, cascade steps, and step outcomes shared by the chain builder,
//! the step executor, and the orchestrator.

pub mod ids;
pub mod step;

// Re-export commonly used types at the module level
pub use ids::{CommentId, PrNumber, PullRequestRef, RepoId, Sha};
pub use step::{CascadeState, CascadeStep, StepOutcome};
