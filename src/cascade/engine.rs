//! Cascade orchestrator.
//!
//! Discovers the release chain, then runs its steps strictly in order,
//! stopping at the first step that does not merge. The orchestrator holds no
//! state beyond the current run; everything it learns comes from the
//! collaborator.

use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::chain::{ChainError, ReleaseChain, build_chain, discover_branches, plan_cascade};
use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::status::format_cascade_complete;
use crate::types::{CascadeState, CascadeStep, PullRequestRef, StepOutcome};

use super::config::CascadeConfig;
use super::step::{StepContext, StepError, execute_step};

/// Errors that terminate a cascade run.
#[derive(Debug, Error)]
pub enum CascadeError {
    /// Branch listing failed; nothing was mutated.
    #[error("branch discovery failed: {0}")]
    Discovery(#[from] ChainError),

    /// A hosting API call inside a step failed.
    #[error(transparent)]
    Step(#[from] StepError),

    /// A hosting API call outside any step failed.
    #[error("{effect} failed: {source}")]
    GitHub {
        effect: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unexpected response to {effect}: {response:?}")]
    UnexpectedResponse {
        effect: &'static str,
        response: Box<GitHubResponse>,
    },

    /// An open pull request for the pair already exists.
    #[error("open pull request already exists for {head} -> {base}: {}", format_prs(.existing))]
    ConflictExists {
        head: String,
        base: String,
        existing: Vec<PullRequestRef>,
    },

    /// A step finished with an outcome that neither continues nor halts a
    /// run; no completion comment is posted.
    #[error("step {head} -> {base} finished with unexpected outcome {}", .outcome.as_str())]
    UnexpectedOutcome {
        head: String,
        base: String,
        outcome: StepOutcome,
    },

    /// The cascade pull request could not be merged. The failure has already
    /// been reported on the originating request.
    #[error("could not merge {pr} ({head} -> {base}): {reason}")]
    MergeFailed {
        head: String,
        base: String,
        pr: PullRequestRef,
        reason: String,
    },
}

fn format_prs(prs: &[PullRequestRef]) -> String {
    prs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

static SKIPPED: StepOutcome = StepOutcome::SkippedNoTargets;

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeReport {
    pub chain: ReleaseChain,

    /// Executed steps and their outcomes, in order. A run with no targets
    /// records no steps.
    pub steps: Vec<(CascadeStep, StepOutcome)>,

    pub state: CascadeState,
}

impl CascadeReport {
    /// Pull requests merged during the run, in order.
    pub fn merged(&self) -> Vec<&PullRequestRef> {
        self.steps
            .iter()
            .filter_map(|(_, outcome)| match outcome {
                StepOutcome::Merged { pr } => Some(pr),
                _ => None,
            })
            .collect()
    }

    /// Outcome of the run as a whole.
    pub fn outcome(&self) -> &StepOutcome {
        self.steps
            .last()
            .map(|(_, outcome)| outcome)
            .unwrap_or(&SKIPPED)
    }
}

/// Runs a full cascade for the branch in `config`.
///
/// Returns `Ok` when every downstream branch was updated or there was nothing
/// to do. Any step that does not merge halts the run with an `Err`; later
/// steps are not attempted.
#[instrument(skip(github, config), fields(repo = %config.repo, trigger = %config.trigger_branch, origin = %config.origin_pr))]
pub async fn run_cascade<G>(github: &G, config: &CascadeConfig) -> Result<CascadeReport, CascadeError>
where
    G: GitHubInterpreter,
{
    let all_branches = discover_branches(github).await?;
    let chain = build_chain(&all_branches, &config.trigger_branch);
    run_chain(github, config, chain).await
}

/// Runs the steps of an already built chain.
pub async fn run_chain<G>(
    github: &G,
    config: &CascadeConfig,
    chain: ReleaseChain,
) -> Result<CascadeReport, CascadeError>
where
    G: GitHubInterpreter,
{
    let plan = plan_cascade(&chain);
    let total = plan.len();
    let mut state = CascadeState::Idle.begin(total);
    if state.is_terminal() {
        info!(
            trigger = %config.trigger_branch,
            chain_len = chain.len(),
            "No downstream release branches; nothing to cascade"
        );
        return Ok(CascadeReport {
            chain,
            steps: Vec::new(),
            state,
        });
    }

    let ctx = StepContext::new(config.origin_pr);
    let mut steps = Vec::with_capacity(total);

    for (index, step) in plan.iter().enumerate() {
        info!(step = index + 1, total, head = %step.head, base = %step.base, "Running cascade step");

        let outcome = execute_step(github, &ctx, step).await?;
        state = CascadeState::after_step(index, total, &outcome);
        info!(step = index + 1, outcome = outcome.as_str(), state = %state, "Cascade step finished");

        if !outcome.allows_continue() {
            return Err(halt(step, outcome));
        }
        steps.push((step.clone(), outcome));
    }

    post_completion(github, config, &plan).await?;
    info!(merged = steps.len(), "Release cascade complete");

    Ok(CascadeReport {
        chain,
        steps,
        state,
    })
}

/// Turns the outcome of a step that stopped the run into the run's error.
fn halt(step: &CascadeStep, outcome: StepOutcome) -> CascadeError {
    match outcome {
        StepOutcome::ConflictExists { existing } => {
            warn!(
                head = %step.head,
                base = %step.base,
                existing = %format_prs(&existing),
                "Halting cascade: open pull request already exists"
            );
            CascadeError::ConflictExists {
                head: step.head.clone(),
                base: step.base.clone(),
                existing,
            }
        }
        StepOutcome::MergeFailed { pr, reason } => {
            warn!(head = %step.head, base = %step.base, pr = %pr.number, "Halting cascade: merge failed");
            CascadeError::MergeFailed {
                head: step.head.clone(),
                base: step.base.clone(),
                pr,
                reason,
            }
        }
        other => {
            error!(head = %step.head, base = %step.base, outcome = other.as_str(), "Halting cascade: unexpected step outcome");
            CascadeError::UnexpectedOutcome {
                head: step.head.clone(),
                base: step.base.clone(),
                outcome: other,
            }
        }
    }
}

async fn post_completion<G>(
    github: &G,
    config: &CascadeConfig,
    plan: &[CascadeStep],
) -> Result<(), CascadeError>
where
    G: GitHubInterpreter,
{
    let effect = GitHubEffect::PostComment {
        pr: config.origin_pr,
        body: format_cascade_complete(plan),
    };
    let name = effect.name();
    match github.interpret(effect).await {
        Ok(GitHubResponse::CommentPosted { .. }) => Ok(()),
        Ok(other) => Err(CascadeError::UnexpectedResponse {
            effect: name,
            response: Box::new(other),
        }),
        Err(e) => Err(CascadeError::GitHub {
            effect: name,
            source: Box::new(e),
        }),
    }
}
