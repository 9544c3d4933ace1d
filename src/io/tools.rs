//! Built-in tools and the registry the step executor dispatches through.
//!
//! Tools never raise past the [`Tool::run`] boundary: every failure is
//! encoded in the returned [`ToolResult`]. The step executor applies the
//! strict success rule (clean exit AND empty stderr) and the safety policy;
//! tools themselves stay mechanism-only.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::core::policy::WritePayload;
use crate::io::process::run_command_with_timeout;

/// Exit code reported for a timed-out shell command, mirroring the
/// conventional `timeout(1)` exit status.
const TIMEOUT_EXIT_CODE: i32 = 124;

/// Outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ToolResult {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: 1,
        }
    }

    /// Success rule used by the step executor: clean exit AND silent stderr.
    /// Stricter than process semantics: non-fatal warnings on stderr count
    /// as failure.
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0 && self.stderr.is_empty()
    }
}

/// Classification driving policy application in the step executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// Subject to the shell denylists.
    Shell,
    /// Successful runs are recorded into `files_read`.
    Read,
    /// Subject to the read-before-write invariant.
    Write,
    /// No policy checks.
    Other,
}

/// A capability the model may invoke with a string input.
pub trait Tool {
    fn name(&self) -> &'static str;
    fn kind(&self) -> ToolKind {
        ToolKind::Other
    }
    fn run(&self, input: &str) -> ToolResult;
}

/// Fixed mapping from tool name to capability.
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Registry with the four built-in tools rooted at `workdir`.
    pub fn builtin(workdir: &Path, shell_timeout: Duration, output_limit_bytes: usize) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ShellTool {
            workdir: workdir.to_path_buf(),
            timeout: shell_timeout,
            output_limit_bytes,
        }));
        registry.register(Box::new(ReadFileTool {
            workdir: workdir.to_path_buf(),
        }));
        registry.register(Box::new(WriteFileTool {
            workdir: workdir.to_path_buf(),
        }));
        registry.register(Box::new(ListDirTool {
            workdir: workdir.to_path_buf(),
        }));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve(workdir: &Path, input: &str) -> PathBuf {
    let path = Path::new(input);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workdir.join(path)
    }
}

/// Executes the input as a `/bin/sh` command line.
pub struct ShellTool {
    workdir: PathBuf,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl Tool for ShellTool {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Shell
    }

    #[instrument(skip_all, fields(timeout_secs = self.timeout.as_secs()))]
    fn run(&self, input: &str) -> ToolResult {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(input).current_dir(&self.workdir);

        let output = match run_command_with_timeout(cmd, self.timeout, self.output_limit_bytes) {
            Ok(output) => output,
            Err(err) => return ToolResult::failed(format!("{err:#}")),
        };
        if output.timed_out {
            return ToolResult {
                stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
                stderr: format!("command timed out after {}s", self.timeout.as_secs()),
                exit_code: TIMEOUT_EXIT_CODE,
            };
        }
        debug!(exit_code = ?output.status.code(), "shell command finished");
        ToolResult {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        }
    }
}

/// Reads a file and returns its trimmed content.
pub struct ReadFileTool {
    workdir: PathBuf,
}

impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Read
    }

    fn run(&self, input: &str) -> ToolResult {
        let path = resolve(&self.workdir, input);
        if !path.exists() {
            return ToolResult::failed("file not found");
        }
        match fs::read_to_string(&path) {
            Ok(content) => ToolResult::ok(content.trim()),
            Err(err) => ToolResult::failed(format!("read {}: {err}", path.display())),
        }
    }
}

/// Overwrites a file from a JSON `{path, content}` payload.
///
/// The read-before-write invariant is enforced by the safety policy before
/// dispatch, not here.
pub struct WriteFileTool {
    workdir: PathBuf,
}

impl Tool for WriteFileTool {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Write
    }

    fn run(&self, input: &str) -> ToolResult {
        let payload: WritePayload = match serde_json::from_str(input) {
            Ok(payload) => payload,
            Err(err) => return ToolResult::failed(format!("invalid write_file payload: {err}")),
        };
        let path = resolve(&self.workdir, &payload.path);
        match fs::write(&path, &payload.content) {
            Ok(()) => ToolResult::ok("file written"),
            Err(err) => ToolResult::failed(format!("write {}: {err}", path.display())),
        }
    }
}

/// Lists directory entries non-recursively, sorted, directories first.
pub struct ListDirTool {
    workdir: PathBuf,
}

impl Tool for ListDirTool {
    fn name(&self) -> &'static str {
        "list_dir"
    }

    fn run(&self, input: &str) -> ToolResult {
        let path = resolve(&self.workdir, input);
        let entries = match fs::read_dir(&path) {
            Ok(entries) => entries,
            Err(err) => return ToolResult::failed(format!("list {}: {err}", path.display())),
        };

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => return ToolResult::failed(format!("list {}: {err}", path.display())),
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            match entry.file_type() {
                Ok(file_type) if file_type.is_dir() => dirs.push(name),
                Ok(_) => files.push(name),
                Err(err) => return ToolResult::failed(format!("stat {name}: {err}")),
            }
        }
        dirs.sort();
        files.sort();

        let mut lines = Vec::with_capacity(dirs.len() + files.len());
        for dir in &dirs {
            lines.push(format!("[DIR] {dir}"));
        }
        for file in &files {
            lines.push(format!("[FILE] {file}"));
        }
        ToolResult::ok(lines.join("\n"))
    }
}
