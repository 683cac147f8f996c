//! Workflow runner - the per-delivery entry point

use crate::platform::RepositoryService;
use crate::types::PushEvent;
use crate::workflow::execute::{PlanExecutionResult, execute_plan};
use crate::workflow::plan::{WorkflowSettings, create_action_plan};
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span, warn};

/// What handling one event amounted to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    /// The event didn't match the trigger; nothing was called
    NotTriggered,
    /// The plan ran (fully or up to its first failure)
    Executed(PlanExecutionResult),
}

impl PlanOutcome {
    /// Whether handling the event succeeded. Non-matching events count as success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            Self::NotTriggered => true,
            Self::Executed(result) => result.is_success(),
        }
    }
}

/// Decides whether a push triggers the workflow and runs it
///
/// Holds no per-event state, so one runner serves every concurrent delivery.
#[derive(Clone)]
pub struct WorkflowRunner {
    service: Arc<dyn RepositoryService>,
    settings: WorkflowSettings,
}

impl WorkflowRunner {
    /// Create a runner over the given repository service
    pub fn new(service: Arc<dyn RepositoryService>, settings: WorkflowSettings) -> Self {
        Self { service, settings }
    }

    /// The workflow settings in use
    pub const fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Handle one push event
    ///
    /// Never fails: remote errors end up in the returned outcome and the log.
    pub async fn handle(&self, event: &PushEvent) -> PlanOutcome {
        let span = info_span!(
            "push",
            delivery = event.delivery_id.as_deref().unwrap_or("-"),
            repo = %event.target(),
            git_ref = %event.git_ref,
        );

        async {
            let Some(plan) = create_action_plan(event, &self.settings) else {
                debug!(deleted = event.deleted, "push does not match trigger, ignoring");
                return PlanOutcome::NotTriggered;
            };

            info!(
                branch = %self.settings.target_branch,
                pr_number = ?event.pull_request_number,
                actions = plan.len(),
                "push to {} branch, running workflow",
                self.settings.target_branch
            );

            let result = execute_plan(&plan, self.service.as_ref()).await;
            if let Some(failed) = result.failure() {
                warn!(
                    failed_action = %failed.action,
                    completed = result.records.len() - 1,
                    "workflow stopped"
                );
            } else {
                info!(pr_number = ?result.pull_request_number(), "workflow complete");
            }
            PlanOutcome::Executed(result)
        }
        .instrument(span)
        .await
    }
}
