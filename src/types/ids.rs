//! Identifiers for things that live on the hosting service.
//!
//! Each one is a newtype so a comment ID can never be passed where a PR
//! number is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A pull request number within a repository.
///
/// Pull requests share the issue number space, so the same number is used when
/// posting comments on the originating request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrNumber(pub u64);

impl fmt::Display for PrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for PrNumber {
    fn from(n: u64) -> Self {
        PrNumber(n)
    }
}

/// A git commit SHA as reported by the hosting API.
///
/// Only used for logging merge results, so the format is not validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sha(pub String);

impl Sha {
    pub fn new(s: impl Into<String>) -> Self {
        Sha(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First seven characters, for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..7).unwrap_or(&self.0)
    }
}

impl fmt::Display for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `owner/repo`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        RepoId {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parses `owner/repo`, accepting an optional `https://github.com/` prefix.
    ///
    /// Returns `None` if either component is empty or the string has no slash.
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s
            .trim()
            .strip_prefix("https://github.com/")
            .or_else(|| s.trim().strip_prefix("http://github.com/"))
            .or_else(|| s.trim().strip_prefix("github.com/"))
            .unwrap_or(s.trim())
            .trim_end_matches('/');

        let (owner, repo) = trimmed.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(RepoId::new(owner, repo))
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A GitHub comment ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub u64);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CommentId {
    fn from(n: u64) -> Self {
        CommentId(n)
    }
}

/// A reference to a pull request on the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub number: PrNumber,
    /// Browser URL, if the API returned one.
    pub url: Option<String>,
}

impl PullRequestRef {
    pub fn new(number: PrNumber, url: Option<String>) -> Self {
        PullRequestRef { number, url }
    }
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.url {
            Some(url) => write!(f, "{} ({})", self.number, url),
            None => write!(f, "{}", self.number),
        }
    }
}
