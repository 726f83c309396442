//! Tools module - the callable capabilities the support bot exposes.
//!
//! - Orders: gated order-status lookup over the in-memory store
//! - Company: fixed FAQ blob
//! - Weather: current conditions via weatherapi.com
//! - Calculator: integer addition

use std::sync::Arc;

use crate::config::WeatherConfig;
use crate::error::Result;
use crate::policy::OrderToolGate;
use crate::tool::ToolRegistry;

pub mod calculator;
pub mod company;
pub mod orders;
pub mod weather;

pub use calculator::AddTool;
pub use company::CompanyInfoTool;
pub use orders::{OrderRecord, OrderStatus, OrderStatusTool, OrderStore};
pub use weather::{WeatherReport, WeatherTool};

/// Build the support bot's capability table. The order tool is registered
/// behind the order gate; everything else is visible on every turn.
pub fn support_toolkit(store: Arc<OrderStore>, weather: WeatherConfig) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register_gated(
        OrderStatusTool::new(store),
        OrderToolGate::new().into_predicate(),
    );
    registry.register(CompanyInfoTool);
    registry.register(WeatherTool::new(weather)?);
    registry.register(AddTool);
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_tool_visibility_follows_the_gate() {
        let registry =
            support_toolkit(Arc::new(OrderStore::demo()), WeatherConfig::default()).unwrap();

        let visible = registry.describe_for("What is your return policy?");
        assert!(visible.iter().all(|tool| tool.name != "get_order_status"));
        assert!(visible.iter().any(|tool| tool.name == "get_company_info"));

        let visible = registry.describe_for("Where is order 123?");
        assert!(visible.iter().any(|tool| tool.name == "get_order_status"));
    }
}
