//! Action planning - pure functions for deciding what a push should do
//!
//! No I/O happens here. The plan is data; `execute_plan()` turns it into
//! remote calls.

use crate::types::{MergeMethod, PushEvent, RepoTarget};

/// Workflow configuration shared by every delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    /// Branch whose pushes trigger the workflow (without `refs/heads/`)
    pub target_branch: String,
    /// Branch the pull request merges into
    pub base_branch: String,
    /// Pull request title, also used as the merge commit title
    pub pr_title: String,
    /// How the pull request gets merged
    pub merge_method: MergeMethod,
    /// Delete the target branch after a successful merge
    pub delete_branch: bool,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            target_branch: "mass-bump-versions".to_string(),
            base_branch: "master".to_string(),
            pr_title: "[skip ci] chore: Mass bump versions".to_string(),
            merge_method: MergeMethod::Squash,
            delete_branch: true,
        }
    }
}

impl WorkflowSettings {
    /// Full ref a trigger push must match, e.g. `refs/heads/mass-bump-versions`
    pub fn trigger_ref(&self) -> String {
        format!("refs/heads/{}", self.target_branch)
    }

    /// Ref deleted during cleanup, e.g. `heads/mass-bump-versions`
    pub fn cleanup_ref(&self) -> String {
        format!("heads/{}", self.target_branch)
    }
}

/// A single remote operation in the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    /// Open (or reuse) a pull request from `head` into `base`
    CreatePullRequest {
        /// Head branch
        head: String,
        /// Base branch
        base: String,
        /// PR title
        title: String,
    },
    /// Merge the pull request produced by the `CreatePullRequest` step
    MergePullRequest {
        /// Merge method to use
        method: MergeMethod,
        /// Title for the merge commit
        commit_title: String,
    },
    /// Delete a ref (without `refs/` prefix)
    DeleteRef {
        /// Ref to delete, e.g. `heads/feature`
        git_ref: String,
    },
}

impl std::fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreatePullRequest { head, base, .. } => {
                write!(f, "create PR {head} -> {base}")
            }
            Self::MergePullRequest { method, .. } => write!(f, "merge PR ({method})"),
            Self::DeleteRef { git_ref } => write!(f, "delete ref {git_ref}"),
        }
    }
}

/// Ordered actions to run for one push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPlan {
    /// Repository the actions apply to
    pub target: RepoTarget,
    /// Actions in execution order
    pub actions: Vec<PlannedAction>,
}

impl ActionPlan {
    /// Number of actions in the plan
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the plan has no actions
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Whether a push should trigger the workflow
///
/// Matches a push to exactly `refs/heads/<target_branch>` that did not
/// delete the branch.
pub fn matches_trigger(event: &PushEvent, settings: &WorkflowSettings) -> bool {
    !event.deleted && event.git_ref == settings.trigger_ref()
}

/// Create an action plan (PURE - no I/O, easily testable)
///
/// Returns `None` when the event doesn't match the trigger.
#[must_use]
pub fn create_action_plan(event: &PushEvent, settings: &WorkflowSettings) -> Option<ActionPlan> {
    if !matches_trigger(event, settings) {
        return None;
    }

    let mut actions = vec![
        PlannedAction::CreatePullRequest {
            head: settings.target_branch.clone(),
            base: settings.base_branch.clone(),
            title: settings.pr_title.clone(),
        },
        PlannedAction::MergePullRequest {
            method: settings.merge_method,
            commit_title: settings.pr_title.clone(),
        },
    ];
    if settings.delete_branch {
        actions.push(PlannedAction::DeleteRef {
            git_ref: settings.cleanup_ref(),
        });
    }

    Some(ActionPlan {
        target: event.target(),
        actions,
    })
}
