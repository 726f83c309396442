use std::sync::Arc;

use serde_json::Value;

use crate::error::{DeskbotError, Result};
use crate::llm::LanguageModel;
use crate::memory::Transcript;
use crate::message::Message;
use crate::tool::{ToolDescription, ToolRegistry};

/// One tool call made during a run, kept for observability.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub output: Value,
}

/// Outcome of a completed agent run: the final text, the identity of
/// whichever agent produced it, and the tool invocations made on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentRun {
    pub final_output: String,
    pub agent: String,
    pub invocations: Vec<ToolInvocation>,
}

/// A support agent that alternates between the model and its tools, and can
/// hand a whole turn off to another agent.
pub struct Agent<M: LanguageModel> {
    name: String,
    instructions: String,
    model: Arc<M>,
    tools: ToolRegistry,
    handoffs: Vec<Arc<Agent<M>>>,
    max_steps: usize,
}

impl<M: LanguageModel> Agent<M> {
    pub fn new(name: impl Into<String>, model: Arc<M>) -> Self {
        Self {
            name: name.into(),
            instructions: "You are a helpful agent.".to_string(),
            model,
            tools: ToolRegistry::new(),
            handoffs: Vec::new(),
            max_steps: 6,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_handoff(mut self, target: Arc<Agent<M>>) -> Self {
        self.handoffs.push(target);
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn handoff_descriptions(&self) -> Vec<ToolDescription> {
        self.handoffs
            .iter()
            .map(|target| ToolDescription {
                name: handoff_tool_name(&target.name),
                description: format!("Hand the conversation off to {}.", target.name),
                parameters: None,
            })
            .collect()
    }

    fn handoff_target(&self, tool_name: &str) -> Option<&Arc<Agent<M>>> {
        self.handoffs
            .iter()
            .find(|target| handoff_tool_name(&target.name) == tool_name)
    }

    /// Process one query to a final reply. Every run starts from a fresh
    /// transcript; the query doubles as the gating context for the
    /// capability table, so the visible tool list is fixed for the turn
    /// before the model is consulted.
    pub async fn run(&self, query: &str) -> Result<AgentRun> {
        let mut transcript = Transcript::default();
        transcript.push(Message::system(&self.instructions));
        transcript.push(Message::user(query));

        let mut descriptions = self.tools.describe_for(query);
        descriptions.extend(self.handoff_descriptions());

        let mut invocations: Vec<ToolInvocation> = Vec::new();

        for _ in 0..self.max_steps {
            let completion = self
                .model
                .complete_chat(transcript.messages(), &descriptions)
                .await?;

            if completion.tool_calls.is_empty() {
                let content = completion.content.ok_or_else(|| {
                    DeskbotError::Protocol(
                        "model returned neither content nor tool calls".into(),
                    )
                })?;
                return Ok(AgentRun {
                    final_output: content,
                    agent: self.name.clone(),
                    invocations,
                });
            }

            for call in completion.tool_calls {
                if let Some(target) = self.handoff_target(&call.name) {
                    tracing::info!(from = %self.name, to = %target.name, "handing off turn");
                    let mut run = Box::pin(target.run(query)).await?;
                    let mut all = std::mem::take(&mut invocations);
                    all.extend(run.invocations);
                    run.invocations = all;
                    return Ok(run);
                }

                let output = self
                    .tools
                    .call(&call.name, call.arguments.clone(), query)
                    .await?;
                tracing::debug!(agent = %self.name, tool = %call.name, "tool invoked");
                invocations.push(ToolInvocation {
                    name: call.name.clone(),
                    output: output.clone(),
                });

                let call_id = call.id.clone();
                let tool_name = call.name.clone();
                transcript.push(Message::tool_request(call));
                transcript.push(Message::tool(tool_name, output, call_id));
            }
        }

        Err(DeskbotError::Protocol(
            "agent reached the step limit without returning a response".into(),
        ))
    }
}

fn handoff_tool_name(agent_name: &str) -> String {
    let slug: String = agent_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("transfer_to_{slug}")
}
