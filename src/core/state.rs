//! Mutable task state threaded through every step of one task.

use std::collections::BTreeMap;

/// State shared across all steps of one task.
///
/// An explicit record with defined defaults: `files_read` always exists, even
/// before the first successful read, so callers never probe for a
/// conditionally-present key. Created once per task, never shared across
/// tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskState {
    /// Final text of each completed step, in order.
    pub step_results: Vec<String>,
    /// Final text of the most recently completed step, embedded in the next
    /// step's opening user message.
    pub last_stdout: String,
    /// File contents recorded by successful `read_file` invocations, keyed by
    /// the exact path string the model passed. Gates `write_file`.
    files_read: BTreeMap<String, String>,
}

impl TaskState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful read so later writes to the same path are allowed.
    pub fn record_read(&mut self, path: &str, content: &str) {
        self.files_read.insert(path.to_string(), content.to_string());
    }

    /// Whether `path` was successfully read earlier in this task.
    pub fn has_read(&self, path: &str) -> bool {
        self.files_read.contains_key(path)
    }

    /// Content recorded by the last successful read of `path`, if any.
    pub fn read_content(&self, path: &str) -> Option<&str> {
        self.files_read.get(path).map(String::as_str)
    }

    /// Record a completed step's final text.
    pub fn complete_step(&mut self, result: String) {
        self.last_stdout = result.clone();
        self.step_results.push(result);
    }
}
