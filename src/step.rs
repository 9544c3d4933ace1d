//! Step executor: a bounded conversation driving one plan step to a final
//! answer.
//!
//! Each reply from the model moves the machine through
//! `AwaitingReply -> Validating -> (Dispatching | Finalizing)` and back to
//! `AwaitingReply`, until a final answer is accepted, the retry budget runs
//! out, or an unrecoverable failure occurs. Only execution failures and
//! premature finalization are retried with corrective context; malformed
//! replies, unknown tools, and policy violations fail the step immediately.

use std::fmt;

use tracing::{debug, info, instrument, warn};

use crate::core::conversation::{ChatMessage, Conversation};
use crate::core::policy::{self, PolicyViolation};
use crate::core::reply::{ParsedReply, ValidationError, validate};
use crate::core::state::TaskState;
use crate::io::gateway::ChatGateway;
use crate::io::tools::{ToolKind, ToolRegistry};
use crate::prompt;

/// Configuration for one step execution.
#[derive(Debug, Clone)]
pub struct StepConfig {
    /// Maximum corrective round-trips before the step fails.
    pub max_retries: u32,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self { max_retries: 5 }
    }
}

/// Terminal failure of one step. Any variant aborts the whole task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepFailure {
    /// The gateway could not produce a completion.
    Transport(String),
    /// The reply violated the JSON protocol. Not coached, fails closed.
    MalformedReply(ValidationError),
    /// The model requested a tool that is not registered.
    UnknownTool(String),
    /// The safety policy rejected the call before dispatch.
    Policy(PolicyViolation),
    /// The corrective-retry budget ran out.
    RetryBudgetExhausted { max_retries: u32 },
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "model gateway failed: {err}"),
            Self::MalformedReply(err) => write!(f, "malformed model reply: {err}"),
            Self::UnknownTool(name) => write!(f, "unknown tool {name:?}"),
            Self::Policy(violation) => write!(f, "policy violation: {violation}"),
            Self::RetryBudgetExhausted { max_retries } => {
                write!(f, "step exceeded retry limit ({max_retries})")
            }
        }
    }
}

impl std::error::Error for StepFailure {}

/// Per-reply state of the step machine.
enum State {
    AwaitingReply,
    Validating(String),
    Dispatching {
        raw: String,
        action: String,
        input: String,
    },
    Finalizing {
        raw: String,
        text: String,
    },
}

/// Drive one plan step to completion.
///
/// Seeds a fresh conversation from the step description and the previous
/// step's output, then loops on model replies. Returns the accepted final
/// answer text; the conversation is discarded either way. `state` is updated
/// when a read tool succeeds.
#[instrument(skip_all, fields(max_retries = config.max_retries))]
pub fn run_step<G: ChatGateway>(
    gateway: &G,
    registry: &ToolRegistry,
    state: &mut TaskState,
    step: &str,
    config: &StepConfig,
) -> Result<String, StepFailure> {
    let mut conversation = Conversation::seeded(
        prompt::STEP_SYSTEM_PROMPT,
        prompt::step_user_message(&state.last_stdout, step),
    );
    let mut retry_count = 0u32;
    let mut last_execution_successful = false;
    let mut machine = State::AwaitingReply;

    loop {
        machine = match machine {
            State::AwaitingReply => {
                if retry_count >= config.max_retries {
                    warn!(retry_count, "retry budget exhausted");
                    return Err(StepFailure::RetryBudgetExhausted {
                        max_retries: config.max_retries,
                    });
                }
                let raw = gateway
                    .complete(conversation.messages())
                    .map_err(|err| StepFailure::Transport(format!("{err:#}")))?;
                debug!(bytes = raw.len(), "received model reply");
                State::Validating(raw)
            }

            State::Validating(raw) => match validate(&raw) {
                Ok(ParsedReply::ToolCall { action, input }) => {
                    State::Dispatching { raw, action, input }
                }
                Ok(ParsedReply::FinalAnswer { text }) => State::Finalizing { raw, text },
                Err(err) => {
                    warn!(%err, "rejecting malformed reply");
                    return Err(StepFailure::MalformedReply(err));
                }
            },

            State::Finalizing { raw, text } => {
                if last_execution_successful {
                    info!("step complete");
                    return Ok(text);
                }
                debug!("rejecting final answer before successful execution");
                conversation.push(ChatMessage::assistant(raw));
                conversation.push(ChatMessage::user(prompt::PREMATURE_FINAL_MESSAGE));
                retry_count += 1;
                State::AwaitingReply
            }

            State::Dispatching { raw, action, input } => {
                let Some(tool) = registry.get(&action) else {
                    warn!(%action, "unknown tool requested");
                    return Err(StepFailure::UnknownTool(action));
                };
                match tool.kind() {
                    ToolKind::Shell => {
                        policy::check_shell(&input).map_err(StepFailure::Policy)?;
                    }
                    ToolKind::Write => {
                        policy::check_write(&input, state).map_err(StepFailure::Policy)?;
                    }
                    ToolKind::Read | ToolKind::Other => {}
                }

                debug!(%action, "running tool");
                let result = tool.run(&input);
                debug!(exit_code = result.exit_code, "tool finished");

                if tool.kind() == ToolKind::Read && result.exit_code == 0 {
                    state.record_read(&input, &result.stdout);
                }

                conversation.push(ChatMessage::assistant(raw));
                if result.succeeded() {
                    last_execution_successful = true;
                    conversation.push(ChatMessage::user(prompt::tool_success_message(
                        &result.stdout,
                    )));
                } else {
                    last_execution_successful = false;
                    conversation.push(ChatMessage::user(prompt::tool_failure_message(
                        result.exit_code,
                        &result.stderr,
                    )));
                }
                retry_count += 1;
                State::AwaitingReply
            }
        };
    }
}
