//! Plan execution - effectful operations
//!
//! Takes an `ActionPlan` and runs its actions against a
//! `RepositoryService`, one at a time, stopping at the first failure.
//! Errors never escape: each one is classified, logged and recorded.

use crate::error::Error;
use crate::platform::RepositoryService;
use crate::types::RepoTarget;
use crate::workflow::plan::{ActionPlan, PlannedAction};
use tracing::{error, info, warn};

/// Which remote operation an action performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Open a pull request
    CreatePullRequest,
    /// Merge a pull request
    MergePullRequest,
    /// Delete a ref
    DeleteRef,
}

impl From<&PlannedAction> for ActionKind {
    fn from(action: &PlannedAction) -> Self {
        match action {
            PlannedAction::CreatePullRequest { .. } => Self::CreatePullRequest,
            PlannedAction::MergePullRequest { .. } => Self::MergePullRequest,
            PlannedAction::DeleteRef { .. } => Self::DeleteRef,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreatePullRequest => write!(f, "create-pull-request"),
            Self::MergePullRequest => write!(f, "merge-pull-request"),
            Self::DeleteRef => write!(f, "delete-ref"),
        }
    }
}

/// What a successful action produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutput {
    /// A pull request is open for the branch
    PullRequest {
        /// PR number
        number: u64,
        /// True when an already-open PR was reused instead of creating one
        reused: bool,
    },
    /// The pull request was merged
    Merged {
        /// Merge commit SHA, if GitHub returned one
        sha: Option<String>,
    },
    /// The ref was deleted
    RefDeleted {
        /// The deleted ref
        git_ref: String,
    },
}

/// Classification of a failed action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The repository API answered with an error status
    RemoteApi {
        /// HTTP status code
        status: u16,
    },
    /// Anything else: network faults, unexpected responses
    Unknown,
}

/// Outcome of one action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action completed
    Succeeded(ActionOutput),
    /// The action failed; the plan stopped here
    Failed {
        /// Error classification
        kind: FailureKind,
        /// Human-readable failure message
        message: String,
    },
}

impl ActionOutcome {
    fn from_error(err: &Error) -> Self {
        match err {
            Error::RemoteApi { status, message } => Self::Failed {
                kind: FailureKind::RemoteApi { status: *status },
                message: message.clone(),
            },
            other => Self::Failed {
                kind: FailureKind::Unknown,
                message: other.to_string(),
            },
        }
    }

    /// Check if the action succeeded
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

/// One executed action and its outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    /// Action that ran
    pub action: ActionKind,
    /// What happened
    pub outcome: ActionOutcome,
}

/// Result of plan execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanExecutionResult {
    /// Executed actions in order. Actions after a failure are absent.
    pub records: Vec<ActionRecord>,
}

impl PlanExecutionResult {
    /// Check if every executed action succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.records.iter().all(|r| r.outcome.is_success())
    }

    /// The action that stopped the plan, if any
    #[must_use]
    pub fn failure(&self) -> Option<&ActionRecord> {
        self.records.iter().find(|r| !r.outcome.is_success())
    }

    /// Pull request number the plan worked on, if it got that far
    #[must_use]
    pub fn pull_request_number(&self) -> Option<u64> {
        self.records.iter().find_map(|r| match r.outcome {
            ActionOutcome::Succeeded(ActionOutput::PullRequest { number, .. }) => Some(number),
            _ => None,
        })
    }
}

/// Execute the action plan (EFFECTFUL)
///
/// Runs actions strictly in order and stops at the first failure. Earlier
/// actions are not rolled back: a failed merge leaves its PR open.
pub async fn execute_plan(
    plan: &ActionPlan,
    service: &dyn RepositoryService,
) -> PlanExecutionResult {
    let mut result = PlanExecutionResult::default();
    let mut pr_number: Option<u64> = None;

    for action in &plan.actions {
        let kind = ActionKind::from(action);
        let outcome = run_action(action, &plan.target, pr_number, service).await;

        match &outcome {
            ActionOutcome::Succeeded(output) => {
                if let ActionOutput::PullRequest { number, .. } = output {
                    pr_number = Some(*number);
                }
                info!(action = %kind, target = %plan.target, ?output, "action succeeded");
            }
            ActionOutcome::Failed {
                kind: FailureKind::RemoteApi { status },
                message,
            } => {
                error!(action = %kind, target = %plan.target, status, %message, "Error! Status: {status}. Message: {message}");
            }
            ActionOutcome::Failed {
                kind: FailureKind::Unknown,
                message,
            } => {
                error!(action = %kind, target = %plan.target, %message, "action failed");
            }
        }

        let failed = !outcome.is_success();
        result.records.push(ActionRecord {
            action: kind,
            outcome,
        });
        if failed {
            break;
        }
    }

    result
}

async fn run_action(
    action: &PlannedAction,
    target: &RepoTarget,
    pr_number: Option<u64>,
    service: &dyn RepositoryService,
) -> ActionOutcome {
    match action {
        PlannedAction::CreatePullRequest { head, base, title } => {
            open_pull_request(target, head, base, title, service).await
        }
        PlannedAction::MergePullRequest {
            method,
            commit_title,
        } => {
            let Some(number) = pr_number else {
                return ActionOutcome::Failed {
                    kind: FailureKind::Unknown,
                    message: "no pull request from an earlier step to merge".to_string(),
                };
            };

            match service
                .merge_pull_request(target, number, *method, commit_title)
                .await
            {
                Ok(merge) if merge.merged => {
                    ActionOutcome::Succeeded(ActionOutput::Merged { sha: merge.sha })
                }
                // Merge API returned but didn't merge
                Ok(merge) => ActionOutcome::Failed {
                    kind: FailureKind::Unknown,
                    message: merge
                        .message
                        .unwrap_or_else(|| format!("PR #{number} was not merged")),
                },
                Err(e) => ActionOutcome::from_error(&e),
            }
        }
        PlannedAction::DeleteRef { git_ref } => match service.delete_ref(target, git_ref).await {
            Ok(()) => ActionOutcome::Succeeded(ActionOutput::RefDeleted {
                git_ref: git_ref.clone(),
            }),
            Err(e) => ActionOutcome::from_error(&e),
        },
    }
}

/// Reuse an open PR for head/base if one exists, otherwise create it
///
/// Redelivered or concurrent pushes then converge on one PR.
async fn open_pull_request(
    target: &RepoTarget,
    head: &str,
    base: &str,
    title: &str,
    service: &dyn RepositoryService,
) -> ActionOutcome {
    match service.find_open_pull_request(target, head, base).await {
        Ok(Some(existing)) => {
            warn!(
                pr_number = existing.number,
                head, base, "open PR already exists, reusing it"
            );
            return ActionOutcome::Succeeded(ActionOutput::PullRequest {
                number: existing.number,
                reused: true,
            });
        }
        Ok(None) => {}
        Err(e) => return ActionOutcome::from_error(&e),
    }

    match service.create_pull_request(target, head, base, title).await {
        Ok(pr) => ActionOutcome::Succeeded(ActionOutput::PullRequest {
            number: pr.number,
            reused: false,
        }),
        Err(e) => ActionOutcome::from_error(&e),
    }
}
