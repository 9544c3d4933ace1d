//! Test-only fakes for driving the loop without a live model.

use std::cell::RefCell;
use std::collections::VecDeque;

use anyhow::{Result, anyhow};

use crate::core::conversation::ChatMessage;
use crate::io::gateway::ChatGateway;
use crate::planner::Planner;

/// Gateway returning a scripted sequence of raw replies, recording every
/// conversation it was sent.
pub struct ScriptedGateway {
    replies: RefCell<VecDeque<String>>,
    transcript: RefCell<Vec<Vec<ChatMessage>>>,
}

impl ScriptedGateway {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            replies: RefCell::new(replies.into_iter().map(Into::into).collect()),
            transcript: RefCell::new(Vec::new()),
        }
    }

    /// Number of completions requested so far.
    pub fn calls(&self) -> usize {
        self.transcript.borrow().len()
    }

    /// Every conversation observed, in call order.
    pub fn transcript(&self) -> Vec<Vec<ChatMessage>> {
        self.transcript.borrow().clone()
    }
}

impl ChatGateway for ScriptedGateway {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.transcript.borrow_mut().push(messages.to_vec());
        self.replies
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("scripted gateway ran out of replies"))
    }
}

/// Gateway that always fails, for transport-error paths.
pub struct FailingGateway;

impl ChatGateway for FailingGateway {
    fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        Err(anyhow!("gateway unreachable"))
    }
}

/// Planner returning a fixed list of steps regardless of input.
pub struct FixedPlanner {
    steps: Vec<String>,
}

impl FixedPlanner {
    pub fn new<I>(steps: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            steps: steps.into_iter().map(Into::into).collect(),
        }
    }
}

impl Planner for FixedPlanner {
    fn plan(&self, _task: &str, _project_structure: &str) -> Result<Vec<String>> {
        Ok(self.steps.clone())
    }
}
