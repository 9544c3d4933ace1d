//! End-to-end loop tests: plan, step conversations, and real tools against a
//! temporary workspace.

use std::fs;
use std::time::Duration;

use taskloop::core::policy::PolicyViolation;
use taskloop::io::tools::ToolRegistry;
use taskloop::step::{StepConfig, StepFailure};
use taskloop::task::{StepFailedError, run_task};
use taskloop::test_support::{FixedPlanner, ScriptedGateway};

fn registry(root: &std::path::Path) -> ToolRegistry {
    ToolRegistry::builtin(root, Duration::from_secs(5), 100_000)
}

#[test]
fn task_reads_then_rewrites_a_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("notes.txt"), "draft\n").expect("write");
    let registry = registry(temp.path());

    let planner = FixedPlanner::new(["read notes.txt", "replace its content with final text"]);
    let gateway = ScriptedGateway::new([
        // step 1: read, then finalize with what was read
        r#"{"action":"read_file","input":"notes.txt"}"#,
        r#"{"final":"notes.txt contains: draft"}"#,
        // step 2: write is allowed because step 1 read the path
        r#"{"action":"write_file","input":"{\"path\":\"notes.txt\",\"content\":\"final text\"}"}"#,
        r#"{"final":"notes.txt rewritten"}"#,
    ]);

    let mut reports = Vec::new();
    let outcome = run_task(
        &gateway,
        &planner,
        &registry,
        "rewrite my notes",
        "Directory: .\n  [FILE] notes.txt",
        &StepConfig::default(),
        |_| {},
        |report| reports.push((report.index, report.result.clone())),
    )
    .expect("task");

    assert_eq!(outcome.final_result, "notes.txt rewritten");
    assert_eq!(
        outcome.step_results,
        vec!["notes.txt contains: draft", "notes.txt rewritten"]
    );
    assert_eq!(reports.len(), 2);

    let content = fs::read_to_string(temp.path().join("notes.txt")).expect("read");
    assert_eq!(content, "final text");
}

#[test]
fn write_without_prior_read_aborts_the_task() {
    let temp = tempfile::tempdir().expect("tempdir");
    let registry = registry(temp.path());

    let planner = FixedPlanner::new(["write config.txt", "never reached"]);
    let gateway = ScriptedGateway::new([
        r#"{"action":"write_file","input":"{\"path\":\"config.txt\",\"content\":\"x\"}"}"#,
    ]);

    let err = run_task(
        &gateway,
        &planner,
        &registry,
        "write a config",
        "Directory: .",
        &StepConfig::default(),
        |_| {},
        |_| {},
    )
    .expect_err("task must abort");

    let failed = err.downcast_ref::<StepFailedError>().expect("step error");
    assert_eq!(failed.step_index, 0);
    assert_eq!(
        failed.failure,
        StepFailure::Policy(PolicyViolation::WriteBeforeRead("config.txt".to_string()))
    );
    assert!(!temp.path().join("config.txt").exists());
    // The second step never queried the model.
    assert_eq!(gateway.calls(), 1);
}

#[test]
fn shell_failures_are_retried_with_corrective_context_until_success() {
    let temp = tempfile::tempdir().expect("tempdir");
    let registry = registry(temp.path());

    let planner = FixedPlanner::new(["count lines in data.txt"]);
    let gateway = ScriptedGateway::new([
        // data.txt does not exist yet, so the first command fails
        r#"{"action":"shell","input":"wc -l < data.txt"}"#,
        // the model recovers by creating it first
        r#"{"action":"shell","input":"printf 'a\nb\n' > data.txt; wc -l < data.txt"}"#,
        r#"{"final":"2 lines"}"#,
    ]);

    let outcome = run_task(
        &gateway,
        &planner,
        &registry,
        "count lines",
        "Directory: .",
        &StepConfig::default(),
        |_| {},
        |_| {},
    )
    .expect("task");

    assert_eq!(outcome.final_result, "2 lines");

    // The retry query carried the failure context from the first command.
    let transcript = gateway.transcript();
    let retry_opening = transcript[1].last().expect("message");
    assert!(retry_opening.content.contains("Tool execution failed"));
}
