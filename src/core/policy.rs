//! Syntactic safety guards applied before tool dispatch.
//!
//! These are substring denylists and a read-before-write check, not semantic
//! command parsing. They accept false positives over false negatives, and a
//! violation is terminal for the step: the tool is never invoked and no
//! corrective retry is attempted.

use std::fmt;

use serde::Deserialize;

use crate::core::state::TaskState;

/// Substrings indicating destructive shell commands (recursive delete,
/// shutdown/reboot, filesystem format, raw disk writes).
const DESTRUCTIVE: &[&str] = &["rm ", "shutdown", "reboot", "mkfs", "dd "];

/// Substrings indicating environment mutation (package installs, virtual
/// environments, system package managers).
const ENV_MUTATION: &[&str] = &["pip", "venv", "apt", "yum", "brew", "install"];

/// Why a tool call was rejected before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    /// Shell input matched a destructive-command substring.
    DestructiveCommand(String),
    /// Shell input matched an environment-mutation substring.
    EnvironmentMutation(String),
    /// The write payload did not decode to `{path, content}`.
    MalformedWritePayload(String),
    /// The target path has no prior successful read in this task.
    WriteBeforeRead(String),
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DestructiveCommand(matched) => {
                write!(f, "destructive shell command (matched {matched:?})")
            }
            Self::EnvironmentMutation(matched) => {
                write!(f, "environment-mutating shell command (matched {matched:?})")
            }
            Self::MalformedWritePayload(err) => {
                write!(f, "invalid write_file payload: {err}")
            }
            Self::WriteBeforeRead(path) => {
                write!(f, "cannot write {path:?} before reading it")
            }
        }
    }
}

/// Payload accepted by the write tool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WritePayload {
    pub path: String,
    pub content: String,
}

/// Reject shell input containing a denylisted substring.
pub fn check_shell(input: &str) -> Result<(), PolicyViolation> {
    for needle in DESTRUCTIVE {
        if input.contains(needle) {
            return Err(PolicyViolation::DestructiveCommand(needle.to_string()));
        }
    }
    for needle in ENV_MUTATION {
        if input.contains(needle) {
            return Err(PolicyViolation::EnvironmentMutation(needle.to_string()));
        }
    }
    Ok(())
}

/// Decode a write payload and enforce read-before-write against task state.
///
/// The path must match a prior successful read exactly; there is no path
/// normalization.
pub fn check_write(input: &str, state: &TaskState) -> Result<WritePayload, PolicyViolation> {
    let payload: WritePayload = serde_json::from_str(input)
        .map_err(|err| PolicyViolation::MalformedWritePayload(err.to_string()))?;
    if !state.has_read(&payload.path) {
        return Err(PolicyViolation::WriteBeforeRead(payload.path));
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_plain_commands() {
        assert_eq!(check_shell("ls -la"), Ok(()));
        assert_eq!(check_shell("cat a.txt | wc -l"), Ok(()));
    }

    #[test]
    fn rejects_destructive_substrings() {
        assert_eq!(
            check_shell("rm -rf /tmp/x"),
            Err(PolicyViolation::DestructiveCommand("rm ".to_string()))
        );
        assert!(matches!(
            check_shell("sudo reboot"),
            Err(PolicyViolation::DestructiveCommand(_))
        ));
        assert!(matches!(
            check_shell("mkfs.ext4 /dev/sda1"),
            Err(PolicyViolation::DestructiveCommand(_))
        ));
        assert!(matches!(
            check_shell("dd if=/dev/zero of=/dev/sda"),
            Err(PolicyViolation::DestructiveCommand(_))
        ));
    }

    #[test]
    fn rejects_environment_mutation() {
        assert!(matches!(
            check_shell("pip freeze"),
            Err(PolicyViolation::EnvironmentMutation(_))
        ));
        assert!(matches!(
            check_shell("apt-get update"),
            Err(PolicyViolation::EnvironmentMutation(_))
        ));
        assert!(matches!(
            check_shell("cargo install ripgrep"),
            Err(PolicyViolation::EnvironmentMutation(_))
        ));
    }

    #[test]
    fn write_requires_prior_read() {
        let state = TaskState::new();
        let input = r#"{"path":"b.txt","content":"x"}"#;
        assert_eq!(
            check_write(input, &state),
            Err(PolicyViolation::WriteBeforeRead("b.txt".to_string()))
        );
    }

    #[test]
    fn write_allowed_after_read() {
        let mut state = TaskState::new();
        state.record_read("a.txt", "old");
        let input = r#"{"path":"a.txt","content":"x"}"#;
        let payload = check_write(input, &state).expect("allowed");
        assert_eq!(payload.path, "a.txt");
        assert_eq!(payload.content, "x");
    }

    #[test]
    fn write_rejects_malformed_payload() {
        let state = TaskState::new();
        assert!(matches!(
            check_write("not json", &state),
            Err(PolicyViolation::MalformedWritePayload(_))
        ));
        assert!(matches!(
            check_write(r#"{"path":"a.txt"}"#, &state),
            Err(PolicyViolation::MalformedWritePayload(_))
        ));
        assert!(matches!(
            check_write(r#"{"path":"a.txt","content":7}"#, &state),
            Err(PolicyViolation::MalformedWritePayload(_))
        ));
    }
}
