//! Task orchestrator: obtain a plan, then drive each step in order.
//!
//! Steps share one [`TaskState`]; each step's final text is threaded into the
//! next step's opening context. Any step failure aborts the whole task
//! immediately, discarding accumulated results.

use std::fmt;

use anyhow::Result;
use tracing::{info, instrument};

use crate::core::state::TaskState;
use crate::io::gateway::ChatGateway;
use crate::io::tools::ToolRegistry;
use crate::planner::Planner;
use crate::step::{StepConfig, StepFailure, run_step};

/// Summary of a completed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub plan: Vec<String>,
    pub step_results: Vec<String>,
    /// The last step's final text, which is the task result.
    pub final_result: String,
}

/// Progress report passed to the `on_step` callback after each step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Zero-based index into the plan.
    pub index: usize,
    pub total: usize,
    pub step: String,
    pub result: String,
}

/// The planner returned no steps. Callers downcast this to distinguish
/// planning failure from step failure.
#[derive(Debug)]
pub struct PlanningFailedError;

impl fmt::Display for PlanningFailedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("planner returned no steps")
    }
}

impl std::error::Error for PlanningFailedError {}

/// A step reached a terminal failure and the task was aborted.
#[derive(Debug)]
pub struct StepFailedError {
    /// Zero-based index of the failed step.
    pub step_index: usize,
    pub step: String,
    pub failure: StepFailure,
}

impl fmt::Display for StepFailedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {} ({:?}) failed: {}",
            self.step_index + 1,
            self.step,
            self.failure
        )
    }
}

impl std::error::Error for StepFailedError {}

/// Plan `task` and execute every step in order.
///
/// `on_plan` is invoked once with the accepted plan before execution starts;
/// `on_step` after each successful step. Returns [`PlanningFailedError`] when
/// the planner yields no steps and [`StepFailedError`] when a step terminates
/// in failure (both wrapped in `anyhow::Error`).
#[instrument(skip_all)]
pub fn run_task<G, P, FPlan, FStep>(
    gateway: &G,
    planner: &P,
    registry: &ToolRegistry,
    task: &str,
    project_structure: &str,
    config: &StepConfig,
    on_plan: FPlan,
    mut on_step: FStep,
) -> Result<TaskOutcome>
where
    G: ChatGateway,
    P: Planner,
    FPlan: FnOnce(&[String]),
    FStep: FnMut(&StepReport),
{
    let plan = planner.plan(task, project_structure)?;
    if plan.is_empty() {
        return Err(anyhow::Error::new(PlanningFailedError));
    }
    on_plan(&plan);

    let mut state = TaskState::new();
    let total = plan.len();
    for (index, step) in plan.iter().enumerate() {
        info!(step = index + 1, total, "executing step");
        match run_step(gateway, registry, &mut state, step, config) {
            Ok(result) => {
                state.complete_step(result.clone());
                on_step(&StepReport {
                    index,
                    total,
                    step: step.clone(),
                    result,
                });
            }
            Err(failure) => {
                return Err(anyhow::Error::new(StepFailedError {
                    step_index: index,
                    step: step.clone(),
                    failure,
                }));
            }
        }
    }

    let final_result = state.last_stdout.clone();
    Ok(TaskOutcome {
        plan,
        step_results: state.step_results,
        final_result,
    })
}
