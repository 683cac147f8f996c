//! Push-triggered pull request workflow
//!
//! Same shape as a classic gather/plan/execute pipeline:
//! 1. Plan - match the push against the trigger, build an `ActionPlan` (pure)
//! 2. Execute - run the actions in order against the repository (effectful)
//!
//! `WorkflowRunner` ties the two together for the webhook layer.

mod execute;
mod plan;
mod runner;

pub use execute::{
    ActionKind, ActionOutcome, ActionOutput, ActionRecord, FailureKind, PlanExecutionResult,
    execute_plan,
};
pub use plan::{ActionPlan, PlannedAction, WorkflowSettings, create_action_plan, matches_trigger};
pub use runner::{PlanOutcome, WorkflowRunner};
