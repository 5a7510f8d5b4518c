//! GitHub effect interpreter using octocrab.
//!
//! Executes `GitHubEffect`s against the real GitHub REST API.
//!
//! Key implementation details:
//! - Branch listing returns one page per effect; the caller drains pages
//! - Open PR lookups qualify the head as `owner:branch`, as the API requires
//! - Merges go through the REST merge endpoint with an explicit `merge_method`
//! - Only read-only effects are retried (see `retry`)

use serde::{Deserialize, Serialize};

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse, MergeMethod};
use crate::types::{CommentId, PrNumber, PullRequestRef, Sha};

use super::client::OctocrabClient;
use super::error::GitHubApiError;
use super::retry::{RetryPolicy, retry_with_backoff};

/// Page size for list endpoints (GitHub's maximum).
const PER_PAGE: u8 = 100;

impl GitHubInterpreter for OctocrabClient {
    type Error = GitHubApiError;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        interpret_github_effect(self, effect).await
    }
}

/// Interprets a GitHub effect, executing it against the GitHub API.
///
/// Read-only effects are retried per the client's `RetryConfig`; mutations
/// run exactly once.
#[tracing::instrument(skip(client, effect), fields(repo = %client.repo(), effect = effect.name()))]
pub async fn interpret_github_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    let policy = RetryPolicy::for_effect(&effect);
    retry_with_backoff(client.retry_config(), policy, || {
        execute_effect(client, effect.clone())
    })
    .await
    .into_result()
}

/// Executes a single effect without retry logic.
async fn execute_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    match effect {
        GitHubEffect::ListBranches { page } => list_branches(client, page).await,
        GitHubEffect::ListOpenPrs { head, base } => list_open_prs(client, &head, &base).await,
        GitHubEffect::CreatePr {
            head,
            base,
            title,
            body,
        } => create_pr(client, head, base, title, body).await,
        GitHubEffect::MergePr { pr, method } => merge_pr(client, pr, method).await,
        GitHubEffect::PostComment { pr, body } => post_comment(client, pr, body).await,
    }
}

// ─── Branches ─────────────────────────────────────────────────────────────────

async fn list_branches(
    client: &OctocrabClient,
    page: u32,
) -> Result<GitHubResponse, GitHubApiError> {
    let page_result = client
        .inner()
        .repos(client.owner(), client.repo_name())
        .list_branches()
        .per_page(PER_PAGE)
        .page(page)
        .send()
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    // The Link header is the authority on whether more pages exist.
    let next_page = page_result.next.is_some().then_some(page + 1);
    let names = page_result
        .items
        .into_iter()
        .map(|branch| branch.name)
        .collect();

    Ok(GitHubResponse::Branches { names, next_page })
}

// ─── Pull Requests ────────────────────────────────────────────────────────────

async fn list_open_prs(
    client: &OctocrabClient,
    head: &str,
    base: &str,
) -> Result<GitHubResponse, GitHubApiError> {
    // The head filter must be qualified with the owning user or organization.
    let qualified_head = format!("{}:{}", client.owner(), head);
    let mut page = 1u32;
    let mut all_prs = Vec::new();

    loop {
        let page_result = client
            .inner()
            .pulls(client.owner(), client.repo_name())
            .list()
            .state(octocrab::params::State::Open)
            .head(qualified_head.clone())
            .base(base)
            .per_page(PER_PAGE)
            .page(page)
            .send()
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        let items = page_result.items;
        let is_last_page = items.len() < usize::from(PER_PAGE);

        all_prs.extend(items.into_iter().map(|pull| {
            PullRequestRef::new(PrNumber(pull.number), pull.html_url.map(|u| u.to_string()))
        }));

        if is_last_page {
            break;
        }
        page += 1;
    }

    Ok(GitHubResponse::PrList(all_prs))
}

async fn create_pr(
    client: &OctocrabClient,
    head: String,
    base: String,
    title: String,
    body: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let pull = client
        .inner()
        .pulls(client.owner(), client.repo_name())
        .create(title, head, base)
        .body(body)
        .send()
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::PrCreated(PullRequestRef::new(
        PrNumber(pull.number),
        pull.html_url.map(|u| u.to_string()),
    )))
}

// ─── Merge ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MergeRequest {
    merge_method: &'static str,
}

#[derive(Debug, Deserialize)]
struct MergeResponse {
    #[serde(default)]
    sha: Option<String>,
    merged: bool,
    #[serde(default)]
    message: Option<String>,
}

async fn merge_pr(
    client: &OctocrabClient,
    pr: PrNumber,
    method: MergeMethod,
) -> Result<GitHubResponse, GitHubApiError> {
    // The REST endpoint is used directly so the merge method is explicit in
    // the request body.
    let url = format!(
        "/repos/{}/{}/pulls/{}/merge",
        client.owner(),
        client.repo_name(),
        pr.0
    );

    let request = MergeRequest {
        merge_method: method.as_api_str(),
    };

    let response: MergeResponse = client
        .inner()
        .put(&url, Some(&request))
        .await
        .map_err(GitHubApiError::from_merge_octocrab)?;

    merge_response_to_result(pr, response)
}

/// Maps a merge endpoint body to a response, treating `merged: false` as a rejection.
fn merge_response_to_result(
    pr: PrNumber,
    response: MergeResponse,
) -> Result<GitHubResponse, GitHubApiError> {
    if !response.merged {
        return Err(GitHubApiError::merge_rejected(
            pr,
            response.message.as_deref().unwrap_or("unknown reason"),
        ));
    }

    let sha = response.sha.ok_or_else(|| {
        GitHubApiError::permanent(format!(
            "Merge of PR {} succeeded but no merge commit SHA was returned",
            pr
        ))
    })?;

    Ok(GitHubResponse::Merged { sha: Sha::new(sha) })
}

// ─── Comments ─────────────────────────────────────────────────────────────────

async fn post_comment(
    client: &OctocrabClient,
    pr: PrNumber,
    body: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let comment = client
        .inner()
        .issues(client.owner(), client.repo_name())
        .create_comment(pr.0, body)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::CommentPosted {
        id: CommentId(comment.id.into_inner()),
    })
}
