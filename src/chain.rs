//! Release chain discovery and ordering.
//!
//! The chain is every `release/v*` branch sorted ascending by [`VersionKey`].
//! The branch that triggered the run is located by exact name; everything
//! after it is a cascade target. A trigger that is not in the chain (or an
//! empty chain) means there is nothing to do, which is not an error.

use thiserror::Error;
use tracing::{debug, info};

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::types::CascadeStep;
use crate::version::{VersionKey, is_release_branch};

/// Upper bound on branch pages, guarding against a collaborator that never
/// reports a last page. At 100 branches per page this is 100k branches.
pub const MAX_BRANCH_PAGES: u32 = 1000;

/// Errors that can occur while discovering branches.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The hosting API call failed.
    #[error("failed to list branches (page {page}): {source}")]
    Api {
        page: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The collaborator answered with the wrong response type.
    #[error("unexpected response to branch listing: {0:?}")]
    UnexpectedResponse(Box<GitHubResponse>),

    /// The collaborator pointed at a page that does not advance.
    #[error("branch pagination did not advance (page {page} pointed to {next})")]
    PaginationStalled { page: u32, next: u32 },

    #[error("branch listing exceeded {0} pages")]
    TooManyPages(u32),
}

/// Fetches every branch name, following pages until the last one.
///
/// A partially read listing would silently truncate the chain, so any failure
/// on any page fails the whole discovery.
pub async fn discover_branches<G>(github: &G) -> Result<Vec<String>, ChainError>
where
    G: GitHubInterpreter,
{
    let mut page = 1u32;
    let mut all = Vec::new();

    loop {
        let response = github
            .interpret(GitHubEffect::ListBranches { page })
            .await
            .map_err(|e| ChainError::Api {
                page,
                source: Box::new(e),
            })?;

        let (names, next_page) = match response {
            GitHubResponse::Branches { names, next_page } => (names, next_page),
            other => return Err(ChainError::UnexpectedResponse(Box::new(other))),
        };

        debug!(page, count = names.len(), "Fetched branch page");
        all.extend(names);

        match next_page {
            None => break,
            Some(next) if next <= page => {
                return Err(ChainError::PaginationStalled { page, next });
            }
            Some(_) if page >= MAX_BRANCH_PAGES => {
                return Err(ChainError::TooManyPages(MAX_BRANCH_PAGES));
            }
            Some(next) => page = next,
        }
    }

    Ok(all)
}

/// Release branches in version order, plus the trigger's position.
///
/// Built once per run; immutable afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseChain {
    branches: Vec<String>,
    trigger: String,
    position: Option<usize>,
}

impl ReleaseChain {
    /// All release branches, oldest version first.
    pub fn branches(&self) -> &[String] {
        &self.branches
    }

    /// The branch that triggered the run.
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// Index of the trigger within the chain, if present.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Branches strictly after the trigger, in chain order.
    ///
    /// Empty if the trigger is not a release branch in the chain.
    pub fn targets(&self) -> &[String] {
        match self.position {
            Some(i) => &self.branches[i + 1..],
            None => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }
}

/// Filters, orders, and locates the trigger.
///
/// The sort is stable, so branches with equal keys (for example several
/// malformed names, all at the zero key) keep their discovery order.
pub fn build_chain<S: AsRef<str>>(all_branches: &[S], current_branch: &str) -> ReleaseChain {
    let mut keyed: Vec<(VersionKey, String)> = all_branches
        .iter()
        .map(|name| AsRef::<str>::as_ref(name))
        .filter(|name| is_release_branch(name))
        .map(|name| (VersionKey::parse(name), name.to_string()))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    let branches: Vec<String> = keyed.into_iter().map(|(_, name)| name).collect();
    let position = branches.iter().position(|b| b == current_branch);

    match position {
        Some(i) => info!(
            trigger = current_branch,
            position = i,
            chain_len = branches.len(),
            targets = branches.len() - i - 1,
            "Built release chain"
        ),
        None => info!(
            trigger = current_branch,
            chain_len = branches.len(),
            "Trigger branch is not in the release chain"
        ),
    }

    ReleaseChain {
        branches,
        trigger: current_branch.to_string(),
        position,
    }
}

/// The step sequence for a chain: `(trigger, t1), (t1, t2), ...`.
///
/// Each step's head is the previous step's base.
pub fn plan_cascade(chain: &ReleaseChain) -> Vec<CascadeStep> {
    let mut head = chain.trigger();
    let mut steps = Vec::with_capacity(chain.targets().len());
    for base in chain.targets() {
        steps.push(CascadeStep::new(head, base.as_str()));
        head = base.as_str();
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockGitHub, arb_branch_set, arb_release_branch, paginate};
    use proptest::prelude::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    // ─── Building ─────────────────────────────────────────────────────────────

    #[test]
    fn filters_and_sorts_numerically() {
        let all = [
            "main",
            "release/v1.10.0",
            "feature/x",
            "release/v1.2.0",
            "release/v1.2.0-p1",
            "release/v0.9.9",
        ];
        let chain = build_chain(&all, "release/v1.2.0");
        assert_eq!(
            chain.branches(),
            names(&[
                "release/v0.9.9",
                "release/v1.2.0",
                "release/v1.2.0-p1",
                "release/v1.10.0"
            ])
        );
        assert_eq!(chain.position(), Some(1));
        assert_eq!(
            chain.targets(),
            names(&["release/v1.2.0-p1", "release/v1.10.0"])
        );
    }

    #[test]
    fn malformed_release_branch_sorts_first() {
        let chain = build_chain(&["release/v1.0.0", "release/vX"], "release/vX");
        assert_eq!(chain.branches(), names(&["release/vX", "release/v1.0.0"]));
        assert_eq!(chain.targets(), names(&["release/v1.0.0"]));
    }

    #[test]
    fn absent_trigger_has_no_targets() {
        let chain = build_chain(&["release/v1.0.0", "release/v1.1.0"], "main");
        assert_eq!(chain.position(), None);
        assert!(chain.targets().is_empty());
        assert!(plan_cascade(&chain).is_empty());
    }

    #[test]
    fn latest_trigger_has_no_targets() {
        let chain = build_chain(&["release/v1.0.0", "release/v1.1.0"], "release/v1.1.0");
        assert_eq!(chain.position(), Some(1));
        assert!(chain.targets().is_empty());
    }

    #[test]
    fn empty_chain() {
        let chain = build_chain::<&str>(&[], "release/v1.0.0");
        assert!(chain.is_empty());
        assert!(chain.targets().is_empty());
    }

    #[test]
    fn trigger_matches_exactly() {
        let chain = build_chain(&["release/v1.0.0", "release/v1.1.0"], "release/v1.0");
        assert_eq!(chain.position(), None);
    }

    #[test]
    fn plan_links_heads_to_previous_bases() {
        let chain = build_chain(
            &["release/v1.2.0", "release/v1.0.0", "release/v1.1.0"],
            "release/v1.0.0",
        );
        assert_eq!(
            plan_cascade(&chain),
            vec![
                CascadeStep::new("release/v1.0.0", "release/v1.1.0"),
                CascadeStep::new("release/v1.1.0", "release/v1.2.0"),
            ]
        );
    }

    // ─── Discovery ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn discovery_drains_all_pages() {
        let mock = MockGitHub::new().with_branches(vec![
            vec!["main", "release/v1.0.0"],
            vec!["release/v1.1.0"],
            vec!["release/v1.2.0", "dev"],
        ]);

        let all = discover_branches(&mock).await.unwrap();

        assert_eq!(
            all,
            names(&["main", "release/v1.0.0", "release/v1.1.0", "release/v1.2.0", "dev"])
        );
        assert_eq!(
            mock.effects(),
            vec![
                GitHubEffect::ListBranches { page: 1 },
                GitHubEffect::ListBranches { page: 2 },
                GitHubEffect::ListBranches { page: 3 },
            ]
        );
    }

    #[tokio::test]
    async fn discovery_failure_on_first_page() {
        let mock = MockGitHub::new()
            .with_branches(vec![vec!["release/v1.0.0"], vec!["release/v1.1.0"]])
            .with_transport_failure("list_branches");

        let err = discover_branches(&mock).await.unwrap_err();
        assert!(matches!(err, ChainError::Api { page: 1, .. }));
    }

    #[tokio::test]
    async fn discovery_failure_on_later_page_fails_whole_listing() {
        let mock = MockGitHub::new()
            .with_branches(vec![
                vec!["release/v1.0.0"],
                vec!["release/v1.1.0"],
                vec!["release/v1.2.0"],
            ])
            .with_failing_branch_page(2);

        let err = discover_branches(&mock).await.unwrap_err();
        assert!(matches!(err, ChainError::Api { page: 2, .. }));
        assert_eq!(
            mock.effects(),
            vec![
                GitHubEffect::ListBranches { page: 1 },
                GitHubEffect::ListBranches { page: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn discovery_with_no_branches() {
        let mock = MockGitHub::new();
        assert!(discover_branches(&mock).await.unwrap().is_empty());
    }

    // ─── Property Tests ───────────────────────────────────────────────────────

    proptest! {
        /// Property: paginated discovery yields the same chain as the full set
        #[test]
        fn prop_pagination_matches_unpaginated(
            all in arb_branch_set(),
            sizes in prop::collection::vec(1usize..7, 1..4),
            trigger in arb_release_branch(),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let mock = MockGitHub::new().with_branch_pages(paginate(&all, &sizes));
            let discovered = rt.block_on(discover_branches(&mock)).unwrap();

            prop_assert_eq!(
                build_chain(&discovered, &trigger),
                build_chain(&all, &trigger)
            );
        }

        /// Property: building twice from the same input gives the same targets
        #[test]
        fn prop_build_is_idempotent(all in arb_branch_set(), trigger in arb_release_branch()) {
            let first = build_chain(&all, &trigger);
            let second = build_chain(&all, &trigger);
            prop_assert_eq!(first.targets(), second.targets());
        }

        /// Property: the chain is sorted and holds exactly the release branches
        #[test]
        fn prop_chain_sorted_and_complete(all in arb_branch_set()) {
            let chain = build_chain(&all, "main");
            for pair in chain.branches().windows(2) {
                prop_assert!(VersionKey::parse(&pair[0]) <= VersionKey::parse(&pair[1]));
            }
            let expected = all.iter().filter(|b| is_release_branch(b)).count();
            prop_assert_eq!(chain.len(), expected);
        }

        /// Property: every target sorts at or after the trigger
        #[test]
        fn prop_targets_follow_trigger(all in arb_branch_set()) {
            if let Some(trigger) = all.iter().find(|b| is_release_branch(b)) {
                let chain = build_chain(&all, trigger);
                let key = VersionKey::parse(trigger);
                for target in chain.targets() {
                    prop_assert!(VersionKey::parse(target) >= key);
                }
                let steps = plan_cascade(&chain);
                prop_assert_eq!(steps.len(), chain.targets().len());
                if let Some(first) = steps.first() {
                    prop_assert_eq!(&first.head, trigger);
                }
            }
        }
    }
}
