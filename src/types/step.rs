//! Cascade step and outcome types.
//!
//! These types describe one head→base propagation unit and the possible
//! results of running it, plus the orchestrator's run state.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::PullRequestRef;

/// One step of a cascade: merge `head` into `base`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CascadeStep {
    pub head: String,
    pub base: String,
}

impl CascadeStep {
    pub fn new(head: impl Into<String>, base: impl Into<String>) -> Self {
        CascadeStep {
            head: head.into(),
            base: base.into(),
        }
    }
}

impl fmt::Display for CascadeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.head, self.base)
    }
}

/// Outcome of a cascade step, or of a run with nothing to do.
///
/// Outcomes are reported but never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The trigger branch had no downstream release branches.
    SkippedNoTargets,

    /// A cascade pull request was created and merged.
    Merged { pr: PullRequestRef },

    /// An open pull request for this head/base pair already exists.
    ///
    /// Either a prior run stopped partway or another process is cascading
    /// concurrently. The chain must halt.
    ConflictExists { existing: Vec<PullRequestRef> },

    /// The cascade pull request was created but the merge was rejected.
    MergeFailed { pr: PullRequestRef, reason: String },
}

impl StepOutcome {
    /// Returns true if the chain may continue past this outcome.
    pub fn allows_continue(&self) -> bool {
        matches!(self, StepOutcome::Merged { .. })
    }

    /// Short machine-friendly name, used as a tracing field.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepOutcome::SkippedNoTargets => "skipped_no_targets",
            StepOutcome::Merged { .. } => "merged",
            StepOutcome::ConflictExists { .. } => "conflict_exists",
            StepOutcome::MergeFailed { .. } => "merge_failed",
        }
    }
}

/// State of a cascade run.
///
/// `Idle → Running(i) → {Running(i+1) | HaltedOnConflict | HaltedOnMergeFailure | Completed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CascadeState {
    Idle,
    /// Executing the step at this zero-based index.
    Running { step: usize },
    HaltedOnConflict { step: usize },
    HaltedOnMergeFailure { step: usize },
    Completed,
}

impl CascadeState {
    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CascadeState::HaltedOnConflict { .. }
                | CascadeState::HaltedOnMergeFailure { .. }
                | CascadeState::Completed
        )
    }

    /// Leaves `Idle` for a run of `total` steps. An empty run is complete
    /// before it starts.
    pub fn begin(self, total: usize) -> CascadeState {
        match self {
            CascadeState::Idle if total > 0 => CascadeState::Running { step: 0 },
            CascadeState::Idle => CascadeState::Completed,
            other => other,
        }
    }

    /// Computes the state after step `step` resolves with `outcome`.
    ///
    /// `total` is the number of steps in the run.
    pub fn after_step(step: usize, total: usize, outcome: &StepOutcome) -> CascadeState {
        match outcome {
            StepOutcome::Merged { .. } if step + 1 < total => {
                CascadeState::Running { step: step + 1 }
            }
            StepOutcome::Merged { .. } | StepOutcome::SkippedNoTargets => CascadeState::Completed,
            StepOutcome::ConflictExists { .. } => CascadeState::HaltedOnConflict { step },
            StepOutcome::MergeFailed { .. } => CascadeState::HaltedOnMergeFailure { step },
        }
    }
}

impl fmt::Display for CascadeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CascadeState::Idle => write!(f, "idle"),
            CascadeState::Running { step } => write!(f, "running step {}", step + 1),
            CascadeState::HaltedOnConflict { step } => {
                write!(f, "halted on existing pull request at step {}", step + 1)
            }
            CascadeState::HaltedOnMergeFailure { step } => {
                write!(f, "halted on merge failure at step {}", step + 1)
            }
            CascadeState::Completed => write!(f, "completed"),
        }
    }
}
