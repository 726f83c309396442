use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{DeskbotError, Result};
use crate::tool::Tool;

/// Add two integers. Pure and total.
pub struct AddTool;

#[async_trait]
impl Tool for AddTool {
    fn name(&self) -> &str {
        "add"
    }

    fn description(&self) -> &str {
        "Add two integers and return the result."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "a": {"type": "integer"},
                "b": {"type": "integer"}
            },
            "required": ["a", "b"]
        }))
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let a = get_integer(&input, "a")?;
        let b = get_integer(&input, "b")?;
        Ok(json!(a + b))
    }
}

fn get_integer(input: &Value, field: &str) -> Result<i64> {
    input
        .get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| DeskbotError::Protocol(format!("missing `{field}` for add")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn adds_two_integers() {
        let tool = AddTool;
        let result = tool.call(json!({"a": 2, "b": 3})).await.unwrap();
        assert_eq!(result, json!(5));
    }

    #[tokio::test]
    async fn is_idempotent() {
        let tool = AddTool;
        let first = tool.call(json!({"a": -4, "b": 10})).await.unwrap();
        let second = tool.call(json!({"a": -4, "b": 10})).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_operand_is_an_error() {
        let tool = AddTool;
        assert!(tool.call(json!({"a": 2})).await.is_err());
    }
}
