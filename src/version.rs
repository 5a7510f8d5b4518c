//! Release branch version keys.
//!
//! A release branch is named `release/v<MAJOR>.<MINOR>.<PATCH>`, optionally
//! suffixed with `-p<N>` for a post-release patch counter. Parsing is total:
//! a release branch whose body does not have that shape gets the zero key, so
//! it sorts before every well-formed version instead of failing the run.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix shared by every release branch.
pub const RELEASE_PREFIX: &str = "release/v";

/// Ordering key for a release branch.
///
/// Field order matters: the derived `Ord` compares `major`, then `minor`,
/// then `patch`, then `patch_counter`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct VersionKey {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub patch_counter: u64,
}

impl VersionKey {
    /// The key given to malformed release branch names.
    pub const ZERO: VersionKey = VersionKey {
        major: 0,
        minor: 0,
        patch: 0,
        patch_counter: 0,
    };

    pub fn new(major: u64, minor: u64, patch: u64, patch_counter: u64) -> Self {
        VersionKey {
            major,
            minor,
            patch,
            patch_counter,
        }
    }

    /// Parses a branch name into a key. Never fails.
    ///
    /// The `release/v` prefix is optional here; callers filter on it
    /// separately via [`is_release_branch`].
    pub fn parse(branch: &str) -> VersionKey {
        let body = branch.strip_prefix(RELEASE_PREFIX).unwrap_or(branch);
        parse_body(body).unwrap_or(VersionKey::ZERO)
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.patch_counter > 0 {
            write!(f, "-p{}", self.patch_counter)?;
        }
        Ok(())
    }
}

/// Returns true if `branch` takes part in release ordering.
pub fn is_release_branch(branch: &str) -> bool {
    branch.starts_with(RELEASE_PREFIX)
}

/// Compares two branch names by their version keys.
pub fn compare(a: &str, b: &str) -> Ordering {
    VersionKey::parse(a).cmp(&VersionKey::parse(b))
}

/// Parses `<digits>.<digits>.<digits>[-p<digits>]`.
fn parse_body(body: &str) -> Option<VersionKey> {
    let (triplet, counter) = match body.split_once("-p") {
        Some((triplet, counter)) => (triplet, Some(counter)),
        None => (body, None),
    };

    let mut parts = triplet.split('.');
    let major = parse_number(parts.next()?)?;
    let minor = parse_number(parts.next()?)?;
    let patch = parse_number(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }

    let patch_counter = match counter {
        Some(c) => parse_number(c)?,
        None => 0,
    };

    Some(VersionKey::new(major, minor, patch, patch_counter))
}

/// Parses a non-empty run of ASCII digits. Rejects signs and overflow.
fn parse_number(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
