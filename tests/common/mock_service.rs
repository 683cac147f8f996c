//! Mock repository service for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use push_pilot::error::{Error, Result};
use push_pilot::platform::RepositoryService;
use push_pilot::types::{MergeMethod, MergeResult, PullRequest, RepoTarget};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// One recorded call, in the order the service saw them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    /// `find_open_pull_request`
    FindOpen {
        owner: String,
        repo: String,
        head: String,
        base: String,
    },
    /// `create_pull_request`
    Create {
        owner: String,
        repo: String,
        head: String,
        base: String,
        title: String,
    },
    /// `merge_pull_request`
    Merge {
        number: u64,
        method: MergeMethod,
        commit_title: String,
    },
    /// `delete_ref`
    DeleteRef { git_ref: String },
}

impl ServiceCall {
    /// Short name used in order assertions
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FindOpen { .. } => "find",
            Self::Create { .. } => "create",
            Self::Merge { .. } => "merge",
            Self::DeleteRef { .. } => "delete",
        }
    }
}

/// Error to return from a call: `Some(status)` is a remote API error,
/// `None` an unknown one
#[derive(Debug, Clone)]
struct InjectedError {
    status: Option<u16>,
    message: String,
}

impl InjectedError {
    fn to_error(&self) -> Error {
        match self.status {
            Some(status) => Error::RemoteApi {
                status,
                message: self.message.clone(),
            },
            None => Error::Unknown(self.message.clone()),
        }
    }
}

/// Simple mock repository service for testing
///
/// Features:
/// - Configurable PR number for created PRs
/// - Ordered call log for verification
/// - Optional pre-existing open PR
/// - Error injection per operation
pub struct MockRepositoryService {
    next_pr_number: AtomicU64,
    existing_pr: Mutex<Option<PullRequest>>,
    calls: Mutex<Vec<ServiceCall>>,
    not_merged_message: Mutex<Option<String>>,
    find_delay: Mutex<Option<Duration>>,
    error_on_find: Mutex<Option<InjectedError>>,
    error_on_create: Mutex<Option<InjectedError>>,
    error_on_merge: Mutex<Option<InjectedError>>,
    error_on_delete: Mutex<Option<InjectedError>>,
}

impl Default for MockRepositoryService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRepositoryService {
    /// Create a mock whose first created PR is #1
    pub fn new() -> Self {
        Self {
            next_pr_number: AtomicU64::new(1),
            existing_pr: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            not_merged_message: Mutex::new(None),
            find_delay: Mutex::new(None),
            error_on_find: Mutex::new(None),
            error_on_create: Mutex::new(None),
            error_on_merge: Mutex::new(None),
            error_on_delete: Mutex::new(None),
        }
    }

    /// Number the next created PR gets
    pub fn set_next_pr_number(&self, number: u64) {
        self.next_pr_number.store(number, Ordering::SeqCst);
    }

    /// Make `find_open_pull_request` return this PR
    pub fn set_existing_pr(&self, pr: PullRequest) {
        *self.existing_pr.lock().unwrap() = Some(pr);
    }

    /// Make `find_open_pull_request` take this long, simulating a slow API
    pub fn set_find_delay(&self, delay: Duration) {
        *self.find_delay.lock().unwrap() = Some(delay);
    }

    // === Error injection methods ===

    /// Make `find_open_pull_request` fail with an API error
    pub fn fail_find(&self, status: u16, msg: &str) {
        *self.error_on_find.lock().unwrap() = Some(InjectedError {
            status: Some(status),
            message: msg.to_string(),
        });
    }

    /// Make `create_pull_request` fail with an API error
    pub fn fail_create(&self, status: u16, msg: &str) {
        *self.error_on_create.lock().unwrap() = Some(InjectedError {
            status: Some(status),
            message: msg.to_string(),
        });
    }

    /// Make `create_pull_request` fail with a non-API error
    pub fn fail_create_unknown(&self, msg: &str) {
        *self.error_on_create.lock().unwrap() = Some(InjectedError {
            status: None,
            message: msg.to_string(),
        });
    }

    /// Make `merge_pull_request` fail with an API error
    pub fn fail_merge(&self, status: u16, msg: &str) {
        *self.error_on_merge.lock().unwrap() = Some(InjectedError {
            status: Some(status),
            message: msg.to_string(),
        });
    }

    /// Make `merge_pull_request` answer `merged: false`
    pub fn refuse_merge(&self, msg: &str) {
        *self.not_merged_message.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `delete_ref` fail with an API error
    pub fn fail_delete(&self, status: u16, msg: &str) {
        *self.error_on_delete.lock().unwrap() = Some(InjectedError {
            status: Some(status),
            message: msg.to_string(),
        });
    }

    // === Call verification methods ===

    /// All calls, in order
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Names of all calls, in order
    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls().iter().map(ServiceCall::name).collect()
    }

    /// Calls that mutate the repository (everything except lookups)
    pub fn mutating_calls(&self) -> Vec<ServiceCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, ServiceCall::FindOpen { .. }))
            .collect()
    }

    /// Number of times `create_pull_request` was called
    pub fn create_count(&self) -> usize {
        self.count(|c| matches!(c, ServiceCall::Create { .. }))
    }

    /// Number of times `merge_pull_request` was called
    pub fn merge_count(&self) -> usize {
        self.count(|c| matches!(c, ServiceCall::Merge { .. }))
    }

    /// Number of times `delete_ref` was called
    pub fn delete_count(&self) -> usize {
        self.count(|c| matches!(c, ServiceCall::DeleteRef { .. }))
    }

    fn count(&self, pred: impl Fn(&ServiceCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    /// Assert that `merge_pull_request` was called for a specific PR
    pub fn assert_merge_called(&self, number: u64, method: MergeMethod) {
        let calls = self.calls();
        assert!(
            calls.iter().any(|c| matches!(
                c,
                ServiceCall::Merge { number: n, method: m, .. } if *n == number && *m == method
            )),
            "Expected merge_pull_request({number}, {method}) but got: {calls:?}"
        );
    }

    fn record(&self, call: ServiceCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RepositoryService for MockRepositoryService {
    async fn find_open_pull_request(
        &self,
        target: &RepoTarget,
        head: &str,
        base: &str,
    ) -> Result<Option<PullRequest>> {
        self.record(ServiceCall::FindOpen {
            owner: target.owner.clone(),
            repo: target.repo.clone(),
            head: head.to_string(),
            base: base.to_string(),
        });

        let delay = *self.find_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.error_on_find.lock().unwrap().as_ref() {
            return Err(err.to_error());
        }
        Ok(self.existing_pr.lock().unwrap().clone())
    }

    async fn create_pull_request(
        &self,
        target: &RepoTarget,
        head: &str,
        base: &str,
        title: &str,
    ) -> Result<PullRequest> {
        self.record(ServiceCall::Create {
            owner: target.owner.clone(),
            repo: target.repo.clone(),
            head: head.to_string(),
            base: base.to_string(),
            title: title.to_string(),
        });

        if let Some(err) = self.error_on_create.lock().unwrap().as_ref() {
            return Err(err.to_error());
        }

        let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
        Ok(PullRequest {
            number,
            html_url: format!(
                "https://github.com/{}/{}/pull/{number}",
                target.owner, target.repo
            ),
            head_ref: head.to_string(),
            base_ref: base.to_string(),
            title: title.to_string(),
        })
    }

    async fn merge_pull_request(
        &self,
        _target: &RepoTarget,
        number: u64,
        method: MergeMethod,
        commit_title: &str,
    ) -> Result<MergeResult> {
        self.record(ServiceCall::Merge {
            number,
            method,
            commit_title: commit_title.to_string(),
        });

        if let Some(err) = self.error_on_merge.lock().unwrap().as_ref() {
            return Err(err.to_error());
        }
        if let Some(msg) = self.not_merged_message.lock().unwrap().as_ref() {
            return Ok(MergeResult {
                merged: false,
                sha: None,
                message: Some(msg.clone()),
            });
        }

        Ok(MergeResult {
            merged: true,
            sha: Some(format!("merged_sha_{number}")),
            message: Some("Pull Request successfully merged".to_string()),
        })
    }

    async fn delete_ref(&self, _target: &RepoTarget, git_ref: &str) -> Result<()> {
        self.record(ServiceCall::DeleteRef {
            git_ref: git_ref.to_string(),
        });

        if let Some(err) = self.error_on_delete.lock().unwrap().as_ref() {
            return Err(err.to_error());
        }
        Ok(())
    }
}
