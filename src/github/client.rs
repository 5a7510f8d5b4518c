//! The octocrab handle plus the repository it works on.

use octocrab::Octocrab;

use crate::types::RepoId;

use super::retry::RetryConfig;

/// A GitHub client bound to one repository.
///
/// `GitHubEffect`s name branches and PR numbers but not the repository, so
/// the client supplies owner and name for every request it makes.
#[derive(Clone)]
pub struct OctocrabClient {
    octocrab: Octocrab,
    repo: RepoId,
    read_retry: RetryConfig,
}

impl OctocrabClient {
    pub fn new(octocrab: Octocrab, repo: RepoId) -> Self {
        OctocrabClient {
            octocrab,
            repo,
            read_retry: RetryConfig::DEFAULT,
        }
    }

    /// Authenticates with a token, such as the `GITHUB_TOKEN` an Actions
    /// runner provides.
    pub fn from_token(token: impl Into<String>, repo: RepoId) -> Result<Self, octocrab::Error> {
        let octocrab = Octocrab::builder().personal_token(token.into()).build()?;
        Ok(Self::new(octocrab, repo))
    }

    pub fn inner(&self) -> &Octocrab {
        &self.octocrab
    }

    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    pub fn owner(&self) -> &str {
        &self.repo.owner
    }

    pub fn repo_name(&self) -> &str {
        &self.repo.repo
    }

    pub fn retry_config(&self) -> RetryConfig {
        self.read_retry
    }
}

impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Octocrab holds the credential; only show what we are pointed at.
        f.debug_struct("OctocrabClient")
            .field("repo", &self.repo)
            .field("read_retry", &self.read_retry)
            .finish_non_exhaustive()
    }
}
