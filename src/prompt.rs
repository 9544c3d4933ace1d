//! Fixed prompt text and conversation message builders.
//!
//! The prompt wording is part of the protocol contract with the model: the
//! step system prompt demands exactly one JSON object per reply in one of the
//! two accepted shapes, and the planner prompt demands a `{"plan": [...]}`
//! object. Keep changes here in sync with `core::reply`.

/// System prompt seeding every step conversation.
pub const STEP_SYSTEM_PROMPT: &str = "\
You are an autonomous AI agent.

Available tools:
- shell: Execute safe shell commands
- read_file: Read file contents
- write_file: Overwrite file contents (input is a JSON string {\"path\", \"content\"})
- list_dir: List directory entries

You MUST respond in valid JSON only.

Rules:
- Output must be a single JSON object.
- Do not wrap JSON in markdown.
- Do not add any explanation.
- Do not add extra keys.

If using a tool, respond EXACTLY like:

{
  \"action\": \"tool_name\",
  \"input\": \"tool_input\"
}

If task is complete, respond EXACTLY like:

{
  \"final\": \"your final answer as a STRING\"
}

You may ONLY execute shell commands that directly accomplish the current step.
Do NOT install packages.
Do NOT create virtual environments.
Do NOT modify global environment.
Only operate within the project directory.

IMPORTANT:
- The value of \"final\" MUST be a string.
- Even if returning multiple items, format them as a single string.
- You may only return ONE JSON object per response.
- If multiple steps are required, perform them one at a time.
- Do not output multiple JSON objects.
";

/// System prompt for the planning call.
pub const PLANNER_SYSTEM_PROMPT: &str = "\
You are a task planning AI for an autonomous agent.

The agent has ONLY the following tools:
- shell (execute shell commands)
- read_file (read file contents)
- write_file (overwrite file contents)
- list_dir (list directory entries)

Break the user's task into an ordered list of executable steps
that can be completed using ONLY these tools.

Rules:
- Do NOT include human steps like \"open editor\".
- Do NOT include explanations.
- Each step must be achievable using the tools above.
- Steps must be concrete and executable.
- Return valid JSON only.
- Do NOT use echo -e.
- Use printf for newline formatting.
- Output format:

{
  \"plan\": [
    \"step 1\",
    \"step 2\",
    \"step 3\"
  ]
}

Environment constraints:
- Shell is /bin/sh (not bash).
- 'bc' is NOT installed.
- Process substitution (<(...)) is NOT supported.
- Use only standard POSIX-compatible commands.
- awk is available.
- seq may or may not be available.
";

/// Corrective message for a final answer offered before any successful
/// execution in the step.
pub const PREMATURE_FINAL_MESSAGE: &str =
    "You must successfully execute a tool before finalizing this step.";

/// Opening user message for a step conversation.
pub fn step_user_message(last_stdout: &str, step: &str) -> String {
    format!(
        "Current task state:\n\
         Last step output:\n\
         {last_stdout}\n\
         \n\
         Execute this step:\n\
         {step}"
    )
}

/// User message for the planning call.
pub fn planner_user_message(task: &str, project_structure: &str) -> String {
    format!("Project structure:\n{project_structure}\n\nTask:\n{task}")
}

/// Corrective message quoting a failed tool execution.
pub fn tool_failure_message(exit_code: i32, stderr: &str) -> String {
    format!(
        "Tool execution failed.\n\
         \n\
         Return code: {exit_code}\n\
         Stderr: {stderr}\n\
         \n\
         Fix the command and try again."
    )
}

/// Follow-up message quoting a successful tool execution.
pub fn tool_success_message(stdout: &str) -> String {
    format!("Tool executed successfully.\n\nStdout:\n{stdout}")
}
