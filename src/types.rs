//! Core types for push-pilot

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A push notification as seen by the workflow runner
///
/// Built by the webhook layer from a verified delivery. Immutable; one per
/// delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEvent {
    /// Full reference that was pushed (e.g. `refs/heads/main`)
    pub git_ref: String,
    /// Whether the push deleted the reference
    pub deleted: bool,
    /// Repository owner login
    pub repository_owner: String,
    /// Repository name
    pub repository_name: String,
    /// Pull request number, if the payload carried one
    ///
    /// Push payloads normally don't. Kept for log context only; the merge
    /// step never reads it.
    pub pull_request_number: Option<u64>,
    /// GitHub App installation the delivery came from
    pub installation_id: Option<u64>,
    /// `X-GitHub-Delivery` header value
    pub delivery_id: Option<String>,
}

impl PushEvent {
    /// Repository coordinates for calls made on behalf of this event
    pub fn target(&self) -> RepoTarget {
        RepoTarget {
            owner: self.repository_owner.clone(),
            repo: self.repository_name.clone(),
            installation_id: self.installation_id,
        }
    }
}

/// Where a repository call goes, and under which installation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoTarget {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// App installation id (resolved on demand when absent)
    pub installation_id: Option<u64>,
}

impl std::fmt::Display for RepoTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Web URL for the PR
    pub html_url: String,
    /// Head branch name
    pub head_ref: String,
    /// Base branch name
    pub base_ref: String,
    /// PR title
    pub title: String,
}

/// Result of a merge operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// Whether the merge was successful
    pub merged: bool,
    /// The SHA of the merge commit (if successful)
    pub sha: Option<String>,
    /// Message from the merge operation (especially on failure)
    pub message: Option<String>,
}

/// Merge strategy/method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMethod {
    /// Squash all commits into one
    #[default]
    Squash,
    /// Create a merge commit
    Merge,
    /// Rebase commits onto base branch
    Rebase,
}

impl MergeMethod {
    /// Value GitHub expects in the `merge_method` field
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Squash => "squash",
            Self::Merge => "merge",
            Self::Rebase => "rebase",
        }
    }
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "squash" => Ok(Self::Squash),
            "merge" => Ok(Self::Merge),
            "rebase" => Ok(Self::Rebase),
            other => Err(format!(
                "unknown merge method '{other}' (expected squash, merge or rebase)"
            )),
        }
    }
}
