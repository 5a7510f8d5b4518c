//! Dry-run interpreter.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::types::{CommentId, PrNumber, PullRequestRef, Sha};

/// A GitHub interpreter that logs mutating effects without executing them.
///
/// Reads (`ListBranches`, `ListOpenPrs`) are delegated to the wrapped
/// interpreter so the computed chain reflects the real repository. Mutations
/// are logged and answered with placeholder responses: created PRs get
/// sequential placeholder numbers starting at 0, and every merge succeeds.
pub struct LoggingGitHubInterpreter<G> {
    inner: G,
    next_placeholder: AtomicU64,
}

impl<G> LoggingGitHubInterpreter<G> {
    pub fn new(inner: G) -> Self {
        LoggingGitHubInterpreter {
            inner,
            next_placeholder: AtomicU64::new(0),
        }
    }

    fn placeholder_response(&self, effect: &GitHubEffect) -> GitHubResponse {
        match effect {
            GitHubEffect::CreatePr { .. } => {
                let n = self.next_placeholder.fetch_add(1, Ordering::SeqCst);
                GitHubResponse::PrCreated(PullRequestRef::new(PrNumber(n), None))
            }
            GitHubEffect::MergePr { .. } => GitHubResponse::Merged {
                sha: Sha::new("0".repeat(40)),
            },
            GitHubEffect::PostComment { .. } => GitHubResponse::CommentPosted { id: CommentId(0) },
            // Reads never reach here.
            GitHubEffect::ListBranches { .. } => GitHubResponse::Branches {
                names: vec![],
                next_page: None,
            },
            GitHubEffect::ListOpenPrs { .. } => GitHubResponse::PrList(vec![]),
        }
    }
}

impl<G> GitHubInterpreter for LoggingGitHubInterpreter<G>
where
    G: GitHubInterpreter + Sync,
{
    type Error = G::Error;

    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send {
        let placeholder = if effect.is_mutation() {
            info!(?effect, "Dry run: effect logged (not executed)");
            Some(self.placeholder_response(&effect))
        } else {
            None
        };

        async move {
            match placeholder {
                Some(response) => Ok(response),
                None => self.inner.interpret(effect).await,
            }
        }
    }
}
