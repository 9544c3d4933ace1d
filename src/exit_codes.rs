//! Stable exit codes for taskloop CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed due to invalid config, transport failure, or other errors.
pub const INVALID: i32 = 1;
/// The planner returned no steps for the task.
pub const PLAN_FAILED: i32 = 2;
/// A step reached a terminal failure and the task was aborted.
pub const STEP_FAILED: i32 = 3;
