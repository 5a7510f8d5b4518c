//! Shared test utilities: a scripted GitHub mock and proptest generators.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use proptest::prelude::*;
use thiserror::Error;

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::types::{CommentId, PrNumber, PullRequestRef, Sha};

/// First number handed out to PRs created through the mock.
pub const FIRST_MOCK_PR: u64 = 100;

/// Errors produced by [`MockGitHub`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MockError {
    #[error("merge rejected: {0}")]
    MergeRejected(String),

    #[error("transport failure during {0}")]
    Transport(&'static str),

    #[error("merge of unknown PR {0}")]
    UnknownPr(PrNumber),
}

/// A scripted, recording GitHub interpreter.
///
/// - Branch listings are served from `branch_pages`, one page per request.
/// - Open PR lookups answer from `open_prs`, keyed by `(head, base)`.
/// - Created PRs get sequential numbers from [`FIRST_MOCK_PR`].
/// - Merges into a base listed in `failing_bases` are rejected.
/// - A request for `failing_branch_page` fails in transport.
/// - Every effect is recorded in order.
#[derive(Debug, Default)]
pub struct MockGitHub {
    branch_pages: Vec<Vec<String>>,
    open_prs: HashMap<(String, String), Vec<PullRequestRef>>,
    failing_bases: HashMap<String, String>,
    transport_failure: Option<&'static str>,
    failing_branch_page: Option<u32>,
    state: Mutex<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    effects: Vec<GitHubEffect>,
    created: HashMap<PrNumber, String>,
    next_pr: u64,
}

impl MockGitHub {
    pub fn new() -> Self {
        MockGitHub {
            state: Mutex::new(MockState {
                next_pr: FIRST_MOCK_PR,
                ..MockState::default()
            }),
            ..MockGitHub::default()
        }
    }

    /// Serves these branch names, split into the given pages.
    pub fn with_branches(mut self, pages: Vec<Vec<&str>>) -> Self {
        self.branch_pages = pages
            .into_iter()
            .map(|page| page.into_iter().map(String::from).collect())
            .collect();
        self
    }

    pub fn with_branch_pages(mut self, pages: Vec<Vec<String>>) -> Self {
        self.branch_pages = pages;
        self
    }

    /// Reports an open PR for `head` → `base`.
    pub fn with_open_pr(mut self, head: &str, base: &str, number: u64) -> Self {
        self.open_prs
            .entry((head.to_string(), base.to_string()))
            .or_default()
            .push(PullRequestRef::new(PrNumber(number), None));
        self
    }

    /// Rejects merges into `base`.
    pub fn with_failing_merge(mut self, base: &str, reason: &str) -> Self {
        self.failing_bases
            .insert(base.to_string(), reason.to_string());
        self
    }

    /// Fails every effect with this name (see `GitHubEffect::name`).
    pub fn with_transport_failure(mut self, effect_name: &'static str) -> Self {
        self.transport_failure = Some(effect_name);
        self
    }

    /// Fails only the branch listing request for `page` (1-based).
    pub fn with_failing_branch_page(mut self, page: u32) -> Self {
        self.failing_branch_page = Some(page);
        self
    }

    /// Every effect received so far, in order.
    pub fn effects(&self) -> Vec<GitHubEffect> {
        self.state.lock().unwrap().effects.clone()
    }

    /// Effects with the given name, in order.
    pub fn effects_named(&self, name: &str) -> Vec<GitHubEffect> {
        self.effects()
            .into_iter()
            .filter(|e| e.name() == name)
            .collect()
    }

    /// Bodies of comments posted on `pr`, in order.
    pub fn comments_on(&self, pr: PrNumber) -> Vec<String> {
        self.effects()
            .into_iter()
            .filter_map(|e| match e {
                GitHubEffect::PostComment { pr: p, body } if p == pr => Some(body),
                _ => None,
            })
            .collect()
    }

    /// Number of effects that change remote state.
    pub fn mutation_count(&self) -> usize {
        self.effects().iter().filter(|e| e.is_mutation()).count()
    }

    fn respond(&self, effect: GitHubEffect) -> Result<GitHubResponse, MockError> {
        let mut state = self.state.lock().unwrap();
        state.effects.push(effect.clone());

        if self.transport_failure == Some(effect.name()) {
            return Err(MockError::Transport(effect.name()));
        }

        match effect {
            GitHubEffect::ListBranches { page } if self.failing_branch_page == Some(page) => {
                Err(MockError::Transport("list_branches"))
            }
            GitHubEffect::ListBranches { page } => {
                let index = page.saturating_sub(1) as usize;
                let names = self.branch_pages.get(index).cloned().unwrap_or_default();
                let next_page = (index + 1 < self.branch_pages.len()).then_some(page + 1);
                Ok(GitHubResponse::Branches { names, next_page })
            }
            GitHubEffect::ListOpenPrs { head, base } => Ok(GitHubResponse::PrList(
                self.open_prs.get(&(head, base)).cloned().unwrap_or_default(),
            )),
            GitHubEffect::CreatePr { base, .. } => {
                let number = PrNumber(state.next_pr);
                state.next_pr += 1;
                state.created.insert(number, base);
                Ok(GitHubResponse::PrCreated(PullRequestRef::new(
                    number,
                    Some(format!("https://github.com/o/r/pull/{}", number.0)),
                )))
            }
            GitHubEffect::MergePr { pr, .. } => {
                let base = state.created.get(&pr).ok_or(MockError::UnknownPr(pr))?;
                match self.failing_bases.get(base) {
                    Some(reason) => Err(MockError::MergeRejected(reason.clone())),
                    None => Ok(GitHubResponse::Merged {
                        sha: Sha::new(format!("{:0>40x}", pr.0)),
                    }),
                }
            }
            GitHubEffect::PostComment { .. } => Ok(GitHubResponse::CommentPosted {
                id: CommentId(state.effects.len() as u64),
            }),
        }
    }
}

impl GitHubInterpreter for MockGitHub {
    type Error = MockError;

    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send {
        let result = self.respond(effect);
        async move { result }
    }
}

// ─── Generators ───────────────────────────────────────────────────────────────

/// A well-formed release branch name.
pub fn arb_release_branch() -> impl Strategy<Value = String> {
    (0u64..5, 0u64..12, 0u64..12, prop::option::of(1u64..4)).prop_map(
        |(major, minor, patch, counter)| match counter {
            Some(c) => format!("release/v{major}.{minor}.{patch}-p{c}"),
            None => format!("release/v{major}.{minor}.{patch}"),
        },
    )
}

/// Any branch name: release, malformed release, or unrelated.
pub fn arb_branch_name() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => arb_release_branch(),
        1 => "release/v[a-zA-Z.]{0,6}".prop_map(String::from),
        2 => "(main|develop|feature/[a-z]{1,8}|fix/[a-z0-9]{1,8})".prop_map(String::from),
    ]
}

/// A set of distinct branch names, as a hosting API would return them.
pub fn arb_branch_set() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set(arb_branch_name(), 0..40)
        .prop_map(|set| set.into_iter().collect())
}

/// Splits `names` into consecutive pages of the given sizes (cycled).
pub fn paginate(names: &[String], page_sizes: &[usize]) -> Vec<Vec<String>> {
    let mut pages = Vec::new();
    let mut rest = names;
    let mut sizes = page_sizes.iter().cycle();
    while !rest.is_empty() {
        let size = (*sizes.next().unwrap_or(&1)).clamp(1, rest.len());
        let (page, tail) = rest.split_at(size);
        pages.push(page.to_vec());
        rest = tail;
    }
    pages
}
