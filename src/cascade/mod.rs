//! Release cascade orchestration.
//!
//! A run propagates a change merged into one release branch forward through
//! every later release branch:
//!
//! 1. **Discover** all branches (every page) and build the [`ReleaseChain`]
//! 2. **Plan** the steps `(trigger, t1), (t1, t2), ...`
//! 3. **Execute** each step in order: open a PR, merge it, comment on the
//!    originating request
//! 4. **Halt** at the first step that finds an open PR or fails to merge
//!
//! # Key Invariants
//!
//! 1. **Sequential**: step `i + 1` starts only after step `i` merged.
//! 2. **Idempotency guard**: a step never opens a second PR for a pair that
//!    already has one open, so reruns after a halt do not pile up PRs.
//! 3. **At most one merge attempt** per step; failed merges are reported and
//!    left for a human.
//!
//! [`ReleaseChain`]: crate::chain::ReleaseChain

pub mod config;
pub mod engine;
pub mod step;

pub use config::{CascadeConfig, ConfigError, RunnerConfig};
pub use engine::{CascadeError, CascadeReport, run_cascade, run_chain};
pub use step::{StepContext, StepError, execute_step};
