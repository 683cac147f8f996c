//! Repository services
//!
//! The workflow runner only talks to a [`RepositoryService`]. The GitHub
//! implementation lives in [`github`]; tests supply their own.

mod github;

pub use github::GitHubAppService;

use crate::error::Result;
use crate::types::{MergeMethod, MergeResult, PullRequest, RepoTarget};
use async_trait::async_trait;

/// Repository operations consumed by the workflow runner
///
/// Every call takes a [`RepoTarget`] so one service instance can act on
/// behalf of any installation that delivers events.
#[async_trait]
pub trait RepositoryService: Send + Sync {
    /// Find an open PR from `head` into `base`
    async fn find_open_pull_request(
        &self,
        target: &RepoTarget,
        head: &str,
        base: &str,
    ) -> Result<Option<PullRequest>>;

    /// Create a new PR from `head` into `base`
    async fn create_pull_request(
        &self,
        target: &RepoTarget,
        head: &str,
        base: &str,
        title: &str,
    ) -> Result<PullRequest>;

    /// Merge a PR with the specified method
    ///
    /// `commit_title` becomes the title of the merge (or squash) commit.
    async fn merge_pull_request(
        &self,
        target: &RepoTarget,
        number: u64,
        method: MergeMethod,
        commit_title: &str,
    ) -> Result<MergeResult>;

    /// Delete a git reference, given without the `refs/` prefix
    /// (e.g. `heads/feature`)
    async fn delete_ref(&self, target: &RepoTarget, git_ref: &str) -> Result<()>;
}
