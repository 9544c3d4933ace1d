//! Plan generation: turn a task description into ordered step descriptions.
//!
//! The [`Planner`] trait decouples the orchestrator from how plans are
//! produced. An empty plan signals planning failure; transport errors
//! propagate as errors.

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::core::conversation::ChatMessage;
use crate::io::gateway::ChatGateway;
use crate::prompt;

pub trait Planner {
    /// Return the ordered step descriptions for `task`, or an empty list when
    /// no usable plan could be produced.
    fn plan(&self, task: &str, project_structure: &str) -> Result<Vec<String>>;
}

/// Planner that asks the chat model for a `{"plan": [...]}` object.
pub struct LlmPlanner<'a, G: ChatGateway> {
    gateway: &'a G,
}

#[derive(Debug, Deserialize)]
struct PlanReply {
    #[serde(default)]
    plan: Vec<String>,
}

impl<'a, G: ChatGateway> LlmPlanner<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }
}

impl<G: ChatGateway> Planner for LlmPlanner<'_, G> {
    #[instrument(skip_all)]
    fn plan(&self, task: &str, project_structure: &str) -> Result<Vec<String>> {
        let messages = [
            ChatMessage::system(prompt::PLANNER_SYSTEM_PROMPT),
            ChatMessage::user(prompt::planner_user_message(task, project_structure)),
        ];
        let raw = self.gateway.complete(&messages)?;
        match serde_json::from_str::<PlanReply>(&raw) {
            Ok(reply) => {
                debug!(steps = reply.plan.len(), "planner produced plan");
                Ok(reply.plan)
            }
            Err(err) => {
                warn!(%err, "planner returned malformed plan, treating as planning failure");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::Role;
    use crate::test_support::ScriptedGateway;

    #[test]
    fn parses_ordered_plan() {
        let gateway = ScriptedGateway::new([r#"{"plan":["step 1","step 2"]}"#]);
        let planner = LlmPlanner::new(&gateway);
        let plan = planner.plan("do things", "Directory: .").expect("plan");
        assert_eq!(plan, vec!["step 1", "step 2"]);
    }

    #[test]
    fn sends_task_and_structure_in_user_message() {
        let gateway = ScriptedGateway::new([r#"{"plan":[]}"#]);
        let planner = LlmPlanner::new(&gateway);
        planner
            .plan("count files", "Directory: .\n  [FILE] a.txt")
            .expect("plan");

        let transcript = gateway.transcript();
        assert_eq!(transcript.len(), 1);
        let messages = &transcript[0];
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.contains("count files"));
        assert!(messages[1].content.contains("[FILE] a.txt"));
    }

    #[test]
    fn malformed_reply_yields_empty_plan() {
        let gateway = ScriptedGateway::new(["not json"]);
        let planner = LlmPlanner::new(&gateway);
        let plan = planner.plan("task", "").expect("plan");
        assert!(plan.is_empty());
    }

    #[test]
    fn missing_plan_key_yields_empty_plan() {
        let gateway = ScriptedGateway::new([r#"{"steps":["a"]}"#]);
        let planner = LlmPlanner::new(&gateway);
        let plan = planner.plan("task", "").expect("plan");
        assert!(plan.is_empty());
    }

    #[test]
    fn transport_error_propagates() {
        let gateway = crate::test_support::FailingGateway;
        let planner = LlmPlanner::new(&gateway);
        assert!(planner.plan("task", "").is_err());
    }
}
