//! GitHub API effect types.
//!
//! These types describe GitHub API operations as data, without executing them.
//! An interpreter executes them against a hosting API (or a mock, or a dry-run
//! logger).

use serde::{Deserialize, Serialize};

use crate::types::{CommentId, PrNumber, PullRequestRef, Sha};

/// Merge strategy passed to the merge endpoint.
///
/// Cascade PRs are only ever merged with a merge commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMethod {
    /// A non-fast-forward merge commit.
    #[default]
    Merge,
}

impl MergeMethod {
    /// Returns the GitHub API string for this method.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            MergeMethod::Merge => "merge",
        }
    }
}

/// A GitHub API effect.
///
/// Effects are repo-scoped: the interpreter is constructed with a `RepoId`,
/// so effects don't include it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitHubEffect {
    // ─── Queries ──────────────────────────────────────────────────────────────
    /// Fetch one page of branch names (1-indexed).
    ListBranches { page: u32 },

    /// List open PRs whose head is `head` and base is `base`.
    ListOpenPrs { head: String, base: String },

    // ─── Mutations ────────────────────────────────────────────────────────────
    /// Open a PR merging `head` into `base`.
    CreatePr {
        head: String,
        base: String,
        title: String,
        body: String,
    },

    /// Merge a PR.
    MergePr { pr: PrNumber, method: MergeMethod },

    /// Post a new comment on a PR (or issue).
    PostComment { pr: PrNumber, body: String },
}

impl GitHubEffect {
    /// Returns true if this effect changes remote state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            GitHubEffect::CreatePr { .. }
                | GitHubEffect::MergePr { .. }
                | GitHubEffect::PostComment { .. }
        )
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            GitHubEffect::ListBranches { .. } => "list_branches",
            GitHubEffect::ListOpenPrs { .. } => "list_open_prs",
            GitHubEffect::CreatePr { .. } => "create_pr",
            GitHubEffect::MergePr { .. } => "merge_pr",
            GitHubEffect::PostComment { .. } => "post_comment",
        }
    }
}

/// Response from a GitHub effect.
///
/// Each variant corresponds to the response from a particular effect type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitHubResponse {
    /// Response to `ListBranches`.
    Branches {
        names: Vec<String>,
        /// The page to request next, or `None` if this was the last page.
        next_page: Option<u32>,
    },

    /// Response to `ListOpenPrs`.
    PrList(Vec<PullRequestRef>),

    /// Response to `CreatePr`.
    PrCreated(PullRequestRef),

    /// Response to `MergePr`.
    Merged {
        /// The SHA of the merge commit on the base branch.
        sha: Sha,
    },

    /// Response to `PostComment`.
    CommentPosted {
        /// The ID of the newly created comment.
        id: CommentId,
    },
}
