//! Cascade step execution.
//!
//! A step propagates one release branch into the next:
//! 1. Look for an open PR with the same head and base (idempotency guard)
//! 2. Open a PR from head into base
//! 3. Merge it with a merge commit
//! 4. Report the result on the originating request
//!
//! A step creates at most one PR, performs at most one merge, and posts at
//! most one comment.

use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse, MergeMethod};
use crate::status::{format_pr_body, format_pr_title, format_step_failure, format_step_success};
use crate::types::{CascadeStep, PrNumber, StepOutcome};

/// Context shared by every step of a run.
#[derive(Debug, Clone)]
pub struct StepContext {
    /// The request that triggered the run; receives status comments.
    pub origin_pr: PrNumber,
}

impl StepContext {
    pub fn new(origin_pr: PrNumber) -> Self {
        StepContext { origin_pr }
    }
}

/// Errors that abort a step outright (as opposed to outcomes it reports).
#[derive(Debug, Error)]
pub enum StepError {
    /// A hosting API call other than the merge failed.
    #[error("{effect} failed during {step}: {source}")]
    Api {
        effect: &'static str,
        step: CascadeStep,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The collaborator answered with the wrong response type.
    #[error("unexpected response to {effect} during {step}: {response:?}")]
    UnexpectedResponse {
        effect: &'static str,
        step: CascadeStep,
        response: Box<GitHubResponse>,
    },

    /// The merge failed and the comment reporting it could not be posted.
    #[error("merge of {pr} failed during {step}: {reason}; reporting it also failed: {source}")]
    FailureNotReported {
        step: CascadeStep,
        pr: PrNumber,
        reason: String,
        #[source]
        source: Box<StepError>,
    },
}

/// Executes one cascade step.
///
/// Returns `ConflictExists` without creating anything if an open PR for the
/// pair already exists. A rejected merge is reported on the originating
/// request and returned as `MergeFailed`; it is not retried. Any other API
/// failure is returned as a `StepError`.
#[instrument(skip(github, ctx), fields(head = %step.head, base = %step.base, origin = %ctx.origin_pr))]
pub async fn execute_step<G>(
    github: &G,
    ctx: &StepContext,
    step: &CascadeStep,
) -> Result<StepOutcome, StepError>
where
    G: GitHubInterpreter,
{
    let existing = match call(
        github,
        step,
        GitHubEffect::ListOpenPrs {
            head: step.head.clone(),
            base: step.base.clone(),
        },
    )
    .await?
    {
        GitHubResponse::PrList(prs) => prs,
        other => return Err(unexpected("list_open_prs", step, other)),
    };

    if !existing.is_empty() {
        let numbers: Vec<String> = existing.iter().map(ToString::to_string).collect();
        warn!(
            existing = %numbers.join(", "),
            "Open cascade pull request already exists; refusing to create another"
        );
        return Ok(StepOutcome::ConflictExists { existing });
    }

    let pr = match call(
        github,
        step,
        GitHubEffect::CreatePr {
            head: step.head.clone(),
            base: step.base.clone(),
            title: format_pr_title(step),
            body: format_pr_body(step, ctx.origin_pr),
        },
    )
    .await?
    {
        GitHubResponse::PrCreated(pr) => pr,
        other => return Err(unexpected("create_pr", step, other)),
    };
    info!(pr = %pr.number, "Created cascade pull request");

    let merge = github
        .interpret(GitHubEffect::MergePr {
            pr: pr.number,
            method: MergeMethod::Merge,
        })
        .await;

    match merge {
        Ok(GitHubResponse::Merged { sha }) => {
            info!(pr = %pr.number, sha = %sha.short(), "Merged cascade pull request");
            post_comment(github, ctx, step, format_step_success(step, &pr)).await?;
            Ok(StepOutcome::Merged { pr })
        }
        Ok(other) => Err(unexpected("merge_pr", step, other)),
        Err(e) => {
            let reason = e.to_string();
            error!(pr = %pr.number, error = %reason, "Merge of cascade pull request failed");
            match post_comment(github, ctx, step, format_step_failure(step, &pr, &reason)).await {
                Ok(()) => Ok(StepOutcome::MergeFailed { pr, reason }),
                Err(source) => Err(StepError::FailureNotReported {
                    step: step.clone(),
                    pr: pr.number,
                    reason,
                    source: Box::new(source),
                }),
            }
        }
    }
}

async fn post_comment<G>(
    github: &G,
    ctx: &StepContext,
    step: &CascadeStep,
    body: String,
) -> Result<(), StepError>
where
    G: GitHubInterpreter,
{
    match call(
        github,
        step,
        GitHubEffect::PostComment {
            pr: ctx.origin_pr,
            body,
        },
    )
    .await?
    {
        GitHubResponse::CommentPosted { .. } => Ok(()),
        other => Err(unexpected("post_comment", step, other)),
    }
}

/// Interprets an effect, attributing any failure to the step.
async fn call<G>(
    github: &G,
    step: &CascadeStep,
    effect: GitHubEffect,
) -> Result<GitHubResponse, StepError>
where
    G: GitHubInterpreter,
{
    let name = effect.name();
    github
        .interpret(effect)
        .await
        .map_err(|e| StepError::Api {
            effect: name,
            step: step.clone(),
            source: Box::new(e),
        })
}

fn unexpected(effect: &'static str, step: &CascadeStep, response: GitHubResponse) -> StepError {
    StepError::UnexpectedResponse {
        effect,
        step: step.clone(),
        response: Box::new(response),
    }
}
