//! Categorized GitHub API errors.
//!
//! Every failure coming out of octocrab is sorted into one of three kinds.
//! The kind decides what the collaborator does next: only `Transient` errors
//! are candidates for a retry, and only on read-only effects.

use std::fmt;

use thiserror::Error;

use crate::types::PrNumber;

/// Message fragments GitHub uses for primary and secondary rate limits.
const RATE_LIMIT_HINTS: &[&str] = &["rate limit", "abuse detection"];

/// Message fragments from transport-level failures (no HTTP status).
const NETWORK_HINTS: &[&str] = &["timeout", "timed out", "connection", "network", "dns"];

/// Message fragments the merge endpoint uses when it refuses to merge.
const MERGE_REFUSAL_HINTS: &[&str] = &[
    "not mergeable",
    "merge conflict",
    "required status check",
    "review required",
    "base branch was modified",
];

/// What went wrong, as far as the caller needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    /// 5xx, 429, rate-limited 403, or a network failure.
    Transient,

    /// Any other failure: bad credentials, missing branch, validation errors.
    Permanent,

    /// The merge endpoint refused the merge (405 not mergeable, 409 conflict,
    /// 422 unmet requirements, or `merged: false`).
    MergeRejected,
}

impl GitHubErrorKind {
    pub fn is_retriable(&self) -> bool {
        matches!(self, GitHubErrorKind::Transient)
    }

    /// Classifies a failure from its HTTP status (if any) and message.
    pub fn classify(status_code: Option<u16>, message: &str) -> Self {
        match status_code {
            Some(429) | Some(500..=599) => GitHubErrorKind::Transient,
            Some(403) if mentions_any(message, RATE_LIMIT_HINTS) => GitHubErrorKind::Transient,
            Some(_) => GitHubErrorKind::Permanent,
            None if mentions_any(message, NETWORK_HINTS) => GitHubErrorKind::Transient,
            None => GitHubErrorKind::Permanent,
        }
    }

    /// Classifies a failure returned by the merge endpoint.
    pub fn classify_merge(status_code: Option<u16>, message: &str) -> Self {
        match status_code {
            Some(405 | 409 | 422) => GitHubErrorKind::MergeRejected,
            _ if mentions_any(message, MERGE_REFUSAL_HINTS) => GitHubErrorKind::MergeRejected,
            _ => Self::classify(status_code, message),
        }
    }
}

impl fmt::Display for GitHubErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GitHubErrorKind::Transient => "transient",
            GitHubErrorKind::Permanent => "permanent",
            GitHubErrorKind::MergeRejected => "merge rejected",
        })
    }
}

/// A failed GitHub call.
#[derive(Debug, Error)]
#[error("GitHub API error{} ({kind}): {message}", http_label(.status_code))]
pub struct GitHubApiError {
    pub kind: GitHubErrorKind,
    pub status_code: Option<u16>,

    /// GitHub's own message when it sent one, otherwise octocrab's.
    pub message: String,

    #[source]
    pub source: Option<octocrab::Error>,
}

fn http_label(status_code: &Option<u16>) -> String {
    status_code
        .map(|code| format!(" HTTP {}", code))
        .unwrap_or_default()
}

impl GitHubApiError {
    pub fn new(kind: GitHubErrorKind, message: impl Into<String>) -> Self {
        GitHubApiError {
            kind,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::new(GitHubErrorKind::Permanent, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(GitHubErrorKind::Transient, message)
    }

    /// The merge endpoint answered but reported `merged: false`.
    pub fn merge_rejected(pr: PrNumber, reason: impl Into<String>) -> Self {
        Self::new(
            GitHubErrorKind::MergeRejected,
            format!("merge of PR {} rejected: {}", pr, reason.into()),
        )
    }

    pub fn from_octocrab(err: octocrab::Error) -> Self {
        Self::wrap(err, GitHubErrorKind::classify)
    }

    /// Like [`from_octocrab`](Self::from_octocrab), for errors from the merge
    /// endpoint.
    pub fn from_merge_octocrab(err: octocrab::Error) -> Self {
        Self::wrap(err, GitHubErrorKind::classify_merge)
    }

    fn wrap(err: octocrab::Error, classify: fn(Option<u16>, &str) -> GitHubErrorKind) -> Self {
        let (status_code, message) = match &err {
            octocrab::Error::GitHub { source, .. } => {
                (Some(source.status_code.as_u16()), source.message.clone())
            }
            other => (None, other.to_string()),
        };

        GitHubApiError {
            kind: classify(status_code, &message),
            status_code,
            message,
            source: Some(err),
        }
    }
}

fn mentions_any(message: &str, hints: &[&str]) -> bool {
    let message = message.to_lowercase();
    hints.iter().any(|hint| message.contains(hint))
}
