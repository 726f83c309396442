use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DeskbotError, Result};

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    /// Optionally return a JSON Schema-like object describing the expected arguments.
    fn parameters(&self) -> Option<Value> {
        None
    }

    async fn call(&self, input: Value) -> Result<Value>;

    /// Convert a failure at this tool's boundary into a user-facing message
    /// the agent can relay. Returning `None` lets the error propagate.
    fn failure_message(&self, _error: &DeskbotError) -> Option<String> {
        None
    }
}

/// Static description of a tool that can be handed to the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDescription {
    pub name: String,
    pub description: String,
    pub parameters: Option<Value>,
}

/// Per-turn visibility predicate. Must be a pure function of the query text
/// so that exposing or hiding a tool is deterministic and side-effect-free.
pub type ToolPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

#[derive(Clone)]
struct ToolEntry {
    tool: Arc<dyn Tool>,
    enabled: Option<ToolPredicate>,
}

impl ToolEntry {
    fn enabled_for(&self, query: &str) -> bool {
        self.enabled.as_ref().map_or(true, |pred| pred(query))
    }
}

/// Capability table: tools plus the predicates that decide their per-turn
/// visibility. Visibility is computed by filtering the table, never by
/// mutating the tool definitions.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolEntry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(
            tool.name().to_string(),
            ToolEntry {
                tool: Arc::new(tool),
                enabled: None,
            },
        );
    }

    /// Register a tool that is only visible on turns whose query satisfies
    /// the predicate.
    pub fn register_gated<T: Tool + 'static>(&mut self, tool: T, predicate: ToolPredicate) {
        self.tools.insert(
            tool.name().to_string(),
            ToolEntry {
                tool: Arc::new(tool),
                enabled: Some(predicate),
            },
        );
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|entry| Arc::clone(&entry.tool))
    }

    pub fn is_enabled(&self, name: &str, query: &str) -> bool {
        self.tools
            .get(name)
            .map_or(false, |entry| entry.enabled_for(query))
    }

    /// Describe the tools visible for this turn, in stable order.
    pub fn describe_for(&self, query: &str) -> Vec<ToolDescription> {
        let mut descriptions: Vec<ToolDescription> = self
            .tools
            .values()
            .filter(|entry| entry.enabled_for(query))
            .map(|entry| ToolDescription {
                name: entry.tool.name().to_string(),
                description: entry.tool.description().to_string(),
                parameters: entry.tool.parameters(),
            })
            .collect();

        descriptions.sort_by(|a, b| a.name.cmp(&b.name));
        descriptions
    }

    /// Dispatch a call made during a turn with the given query as context.
    /// Gated-off tools are refused even if the model names them. A failing
    /// tool that provides a `failure_message` degrades to that string
    /// instead of an error.
    pub async fn call(&self, name: &str, input: Value, query: &str) -> Result<Value> {
        let entry = self
            .tools
            .get(name)
            .ok_or_else(|| DeskbotError::ToolNotFound(name.to_string()))?;
        if !entry.enabled_for(query) {
            return Err(DeskbotError::Protocol(format!(
                "tool `{name}` is not available for this request"
            )));
        }
        match entry.tool.call(input).await {
            Ok(output) => Ok(output),
            Err(err) => match entry.tool.failure_message(&err) {
                Some(message) => {
                    tracing::warn!(tool = name, error = %err, "tool failure converted to message");
                    Ok(Value::String(message))
                }
                None => Err(DeskbotError::ToolInvocation {
                    name: name.to_string(),
                    source: Box::new(err),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the provided JSON payload back to the caller."
        }

        async fn call(&self, input: Value) -> Result<Value> {
            Ok(json!({ "echo": input }))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "Always fails."
        }

        async fn call(&self, _input: Value) -> Result<Value> {
            Err(DeskbotError::Protocol("boom".into()))
        }

        fn failure_message(&self, error: &DeskbotError) -> Option<String> {
            Some(format!("Something went wrong. ({error})"))
        }
    }

    #[tokio::test]
    async fn gated_tool_is_hidden_and_not_callable() {
        let mut registry = ToolRegistry::new();
        registry.register_gated(EchoTool, Arc::new(|query: &str| query.contains("magic")));

        assert!(registry.describe_for("plain query").is_empty());
        assert_eq!(registry.describe_for("the magic word").len(), 1);

        let err = registry
            .call("echo", json!({"text": "hi"}), "plain query")
            .await
            .unwrap_err();
        assert!(matches!(err, DeskbotError::Protocol(_)));

        let ok = registry
            .call("echo", json!({"text": "hi"}), "the magic word")
            .await
            .unwrap();
        assert_eq!(ok["echo"]["text"], "hi");
    }

    #[tokio::test]
    async fn failure_message_degrades_to_string() {
        let mut registry = ToolRegistry::new();
        registry.register(FailingTool);

        let output = registry.call("broken", json!({}), "any").await.unwrap();
        let text = output.as_str().unwrap();
        assert!(text.starts_with("Something went wrong."));
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let registry = ToolRegistry::new();
        let err = registry.call("nope", json!({}), "any").await.unwrap_err();
        assert!(matches!(err, DeskbotError::ToolNotFound(_)));
    }
}
