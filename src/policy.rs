//! Turn policies: tool gating and escalation.
//!
//! Both are deliberately dumb, deterministic checks. They run before the
//! model gets a say, so a gated tool is never visible and an escalated turn
//! never reaches the primary bot's tool budget.

use std::sync::Arc;

use regex::Regex;

use crate::guardrails::SentimentVerdict;
use crate::tool::ToolPredicate;

/// Decides whether the order-lookup tool is exposed for a turn: the query
/// must contain a whole-word `order` (any case) and a standalone
/// three-digit token. Both conditions are required.
pub struct OrderToolGate {
    order_word: Regex,
    three_digits: Regex,
}

impl OrderToolGate {
    pub fn new() -> Self {
        Self {
            order_word: Regex::new(r"(?i)\border\b").unwrap(),
            three_digits: Regex::new(r"\b\d{3}\b").unwrap(),
        }
    }

    pub fn matches(&self, query: &str) -> bool {
        self.order_word.is_match(query) && self.three_digits.is_match(query)
    }

    /// Package the gate as a capability-table predicate.
    pub fn into_predicate(self) -> ToolPredicate {
        Arc::new(move |query: &str| self.matches(query))
    }
}

impl Default for OrderToolGate {
    fn default() -> Self {
        Self::new()
    }
}

/// What pushed a turn onto the escalation path.
#[derive(Debug, Clone, PartialEq)]
pub enum EscalationTrigger {
    Sentiment(SentimentVerdict),
    Keyword(String),
}

/// Per-turn escalation state. `Escalated` is terminal for the turn: the
/// query goes to the human stand-in and no gated tool processing happens.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnState {
    Normal,
    Escalated(EscalationTrigger),
}

/// Routes a turn away from the primary bot when the sentiment guard trips
/// or the query names a deployer-configured trigger phrase. The two
/// conditions compose as an OR; sentiment is checked first.
#[derive(Debug, Clone)]
pub struct EscalationPolicy {
    trigger_phrases: Vec<String>,
}

impl EscalationPolicy {
    pub fn new(trigger_phrases: Vec<String>) -> Self {
        Self { trigger_phrases }
    }

    pub fn check(&self, query: &str, verdict: &SentimentVerdict) -> TurnState {
        if verdict.is_negative {
            return TurnState::Escalated(EscalationTrigger::Sentiment(verdict.clone()));
        }
        let lowered = query.to_lowercase();
        if let Some(phrase) = self
            .trigger_phrases
            .iter()
            .find(|phrase| lowered.contains(&phrase.to_lowercase()))
        {
            return TurnState::Escalated(EscalationTrigger::Keyword(phrase.clone()));
        }
        TurnState::Normal
    }
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self::new(crate::config::EscalationConfig::default().trigger_phrases)
    }
}
