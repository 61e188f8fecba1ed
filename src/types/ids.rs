//! Newtype wrappers for repository and commit identifiers.
//!
//! These keep a commit reference from being confused with a repository key
//! and make the persistence key derivation explicit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of characters kept when a commit SHA is shown in the grid.
pub const SHORT_SHA_LEN: usize = 7;

/// A git commit SHA as reported by the checks API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sha(pub String);

impl Sha {
    /// Creates a new Sha from a string.
    ///
    /// Note: This does not validate the format. Full SHAs are 40 hex characters.
    pub fn new(s: impl Into<String>) -> Self {
        Sha(s.into())
    }

    /// Returns the SHA as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a short (7-character) version of the SHA for display.
    ///
    /// Inputs of 7 characters or fewer are returned unchanged.
    pub fn short(&self) -> &str {
        // get() instead of slicing: a non-ASCII value from a bad payload must not panic.
        self.0.get(..SHORT_SHA_LEN).unwrap_or(&self.0)
    }
}

impl fmt::Display for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Sha {
    fn from(s: String) -> Self {
        Sha(s)
    }
}

impl From<&str> for Sha {
    fn from(s: &str) -> Self {
        Sha(s.to_string())
    }
}

/// A repository identifier (owner/repo format).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
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

    /// Returns the canonical web link of the repository.
    ///
    /// This is the stable identity of a tracked repository: it keys the
    /// persisted history and is what the grid links to.
    pub fn identity(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A repository the grid tracks, as named in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedRepo {
    pub repo: RepoId,
    /// Branch whose head commit is polled for checks.
    pub default_branch: String,
}

impl TrackedRepo {
    pub fn new(repo: RepoId, default_branch: impl Into<String>) -> Self {
        TrackedRepo {
            repo,
            default_branch: default_branch.into(),
        }
    }
}
