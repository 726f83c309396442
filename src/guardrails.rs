//! Input guardrails.
//!
//! The sentiment guard delegates to a secondary model invocation whose sole
//! instruction is to classify offensiveness/negativity and explain why. It
//! runs before the primary agent begins normal processing; the escalation
//! policy turns its verdict into a routing decision.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{DeskbotError, Result};
use crate::llm::LanguageModel;
use crate::message::Message;

/// Classification of one incoming query. Computed at most once per turn;
/// the reasoning is surfaced to logs, never silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentVerdict {
    pub is_negative: bool,
    pub reasoning: String,
}

#[async_trait]
pub trait Guardrail: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self, input: &str) -> Result<SentimentVerdict>;
}

const SENTIMENT_INSTRUCTIONS: &str = "Check if the user input is offensive, rude, or overly negative. \
Reply with a JSON object of the form {\"is_negative\": <boolean>, \"reasoning\": \"<one sentence>\"} \
and nothing else.";

/// Sentiment classifier backed by a dedicated model invocation.
pub struct SentimentGuardrail<M> {
    model: Arc<M>,
}

impl<M> SentimentGuardrail<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<M: LanguageModel> Guardrail for SentimentGuardrail<M> {
    fn name(&self) -> &str {
        "sentiment"
    }

    async fn check(&self, input: &str) -> Result<SentimentVerdict> {
        let messages = vec![Message::system(SENTIMENT_INSTRUCTIONS), Message::user(input)];
        let completion = self.model.complete_chat(&messages, &[]).await?;
        let raw = completion.content.ok_or_else(|| {
            DeskbotError::Protocol("sentiment guard returned no content".into())
        })?;
        parse_verdict(&raw)
    }
}

fn parse_verdict(raw: &str) -> Result<SentimentVerdict> {
    serde_json::from_str(strip_code_fence(raw)).map_err(|err| {
        DeskbotError::Protocol(format!("sentiment verdict was not valid JSON `{raw}`: {err}"))
    })
}

// Models occasionally wrap JSON replies in a markdown fence.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::StubModel;

    #[test]
    fn parses_plain_and_fenced_verdicts() {
        let verdict = parse_verdict(r#"{"is_negative": true, "reasoning": "hostile"}"#).unwrap();
        assert!(verdict.is_negative);

        let fenced = "```json\n{\"is_negative\": false, \"reasoning\": \"fine\"}\n```";
        let verdict = parse_verdict(fenced).unwrap();
        assert!(!verdict.is_negative);
        assert_eq!(verdict.reasoning, "fine");
    }

    #[test]
    fn rejects_non_json_verdicts() {
        let err = parse_verdict("definitely negative").unwrap_err();
        assert!(matches!(err, DeskbotError::Protocol(_)));
    }

    #[tokio::test]
    async fn classifies_via_the_model() {
        let model = StubModel::new(vec![
            r#"{"is_negative": true, "reasoning": "insults the company"}"#.into(),
        ]);
        let guard = SentimentGuardrail::new(model);

        let verdict = guard
            .check("Your company sucks, I want a refund!")
            .await
            .unwrap();
        assert!(verdict.is_negative);
        assert_eq!(verdict.reasoning, "insults the company");
    }
}
