use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::tool::Tool;

const COMPANY_INFO: &str = "\
Company Info:
  Our company specializes in high-quality electronics, including laptops, smartphones, and accessories. All products meet industry standards and come with manufacturer warranties.

Support Info:
  Our support team is available 24/7. You can return products within 30 days, track shipments, and request assistance with warranties or technical issues. Customer satisfaction is our top priority.

Terms & Policies:
  Our terms and conditions ensure fair use of our services. We respect user privacy, provide transparent pricing, and adhere to all legal regulations. Please review policies before making a purchase.";

/// Fixed company FAQ blob: product info, support policy, terms. No inputs,
/// no failure modes.
pub struct CompanyInfoTool;

#[async_trait]
impl Tool for CompanyInfoTool {
    fn name(&self) -> &str {
        "get_company_info"
    }

    fn description(&self) -> &str {
        "Answer simple FAQs about the company's products, support policy, and terms."
    }

    async fn call(&self, _input: Value) -> Result<Value> {
        Ok(Value::String(COMPANY_INFO.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn returns_all_three_sections_and_is_idempotent() {
        let tool = CompanyInfoTool;

        let first = tool.call(json!({})).await.unwrap();
        let second = tool.call(json!({})).await.unwrap();
        assert_eq!(first, second);

        let text = first.as_str().unwrap();
        assert!(text.contains("Company Info:"));
        assert!(text.contains("Support Info:"));
        assert!(text.contains("Terms & Policies:"));
    }
}
