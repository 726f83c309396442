//! Order lookup toolkit.
//!
//! The order store is an in-memory fact base loaded at process start and
//! never mutated during a run.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{DeskbotError, Result};
use crate::tool::Tool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderStatus {
    Shipped,
    Processing,
    Delivered,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Processing => "Processing",
            OrderStatus::Delivered => "Delivered",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub status: OrderStatus,
}

/// Read-only mapping from order identifier to status.
#[derive(Debug, Default, Clone)]
pub struct OrderStore {
    orders: HashMap<String, OrderStatus>,
}

impl OrderStore {
    pub fn from_entries(entries: impl IntoIterator<Item = (String, OrderStatus)>) -> Self {
        Self {
            orders: entries.into_iter().collect(),
        }
    }

    /// The fixture data the demo ships with.
    pub fn demo() -> Self {
        Self::from_entries([
            ("123".to_string(), OrderStatus::Shipped),
            ("456".to_string(), OrderStatus::Processing),
            ("789".to_string(), OrderStatus::Delivered),
        ])
    }

    pub fn lookup(&self, order_id: &str) -> Result<OrderRecord> {
        self.orders
            .get(order_id)
            .map(|status| OrderRecord {
                order_id: order_id.to_string(),
                status: *status,
            })
            .ok_or_else(|| DeskbotError::OrderNotFound(order_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Fetch a customer's order status from the store.
pub struct OrderStatusTool {
    store: Arc<OrderStore>,
}

impl OrderStatusTool {
    pub fn new(store: Arc<OrderStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for OrderStatusTool {
    fn name(&self) -> &str {
        "get_order_status"
    }

    fn description(&self) -> &str {
        "Fetch a customer's order status by order_id from the order database."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "order_id": {"type": "string", "description": "The customer's order identifier"}
            },
            "required": ["order_id"]
        }))
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let order_id = input
            .get("order_id")
            .and_then(Value::as_str)
            .ok_or_else(|| DeskbotError::Protocol("missing `order_id` for get_order_status".into()))?;

        let record = self.store.lookup(order_id)?;
        Ok(serde_json::to_value(record)?)
    }

    fn failure_message(&self, error: &DeskbotError) -> Option<String> {
        Some(format!(
            "I couldn't find that order. Please check your order ID and try again. ({error})"
        ))
    }
}
