//! Autonomous task-execution loop against a local chat model.
//!
//! Given a natural-language task, the loop asks the model for an ordered plan,
//! then drives each plan step through a bounded conversation until the model
//! emits a valid final answer. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (reply validation, safety policy,
//!   task state). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting collaborators (model gateway, tool execution,
//!   filesystem discovery, configuration). Isolated to enable fakes in tests.
//!
//! Orchestration modules ([`step`], [`task`], [`planner`]) coordinate core
//! logic with I/O to implement the CLI commands.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod planner;
pub mod prompt;
pub mod step;
pub mod task;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
