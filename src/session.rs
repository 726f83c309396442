//! Session driver: guard, escalate, run.
//!
//! One query is fully processed before the next begins. Each turn is an
//! independent unit of work over the read-only order store; nothing mutable
//! is shared across turns.

use std::sync::Arc;

use crate::agent::{Agent, AgentRun};
use crate::error::Result;
use crate::guardrails::Guardrail;
use crate::llm::LanguageModel;
use crate::policy::{EscalationPolicy, EscalationTrigger, TurnState};

/// How a turn ended. Callers must handle both branches; there is no
/// tripwire exception to catch.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Completed(AgentRun),
    Escalated {
        trigger: EscalationTrigger,
        run: AgentRun,
    },
}

pub struct Session<M: LanguageModel> {
    guardrail: Arc<dyn Guardrail>,
    policy: EscalationPolicy,
    bot: Arc<Agent<M>>,
    human: Arc<Agent<M>>,
}

impl<M: LanguageModel> Session<M> {
    pub fn new(
        guardrail: Arc<dyn Guardrail>,
        policy: EscalationPolicy,
        bot: Arc<Agent<M>>,
        human: Arc<Agent<M>>,
    ) -> Self {
        Self {
            guardrail,
            policy,
            bot,
            human,
        }
    }

    /// Process one query: sentiment guard first, then the escalation
    /// decision, then exactly one agent run. The verdict is computed once
    /// per turn.
    pub async fn handle_turn(&self, query: &str) -> Result<TurnOutcome> {
        let verdict = self.guardrail.check(query).await?;
        tracing::info!(
            guardrail = self.guardrail.name(),
            is_negative = verdict.is_negative,
            reasoning = %verdict.reasoning,
            "input guardrail verdict"
        );

        match self.policy.check(query, &verdict) {
            TurnState::Escalated(trigger) => {
                match &trigger {
                    EscalationTrigger::Sentiment(v) => {
                        tracing::warn!(reasoning = %v.reasoning, "sentiment tripwire, escalating to human agent");
                    }
                    EscalationTrigger::Keyword(phrase) => {
                        tracing::warn!(phrase = %phrase, "escalation phrase matched, escalating to human agent");
                    }
                }
                let run = self.human.run(query).await?;
                Ok(TurnOutcome::Escalated { trigger, run })
            }
            TurnState::Normal => Ok(TurnOutcome::Completed(self.bot.run(query).await?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guardrails::SentimentGuardrail;
    use crate::llm::StubModel;

    fn session(
        guard_script: &str,
        bot_script: Vec<String>,
        human_script: Vec<String>,
    ) -> Session<StubModel> {
        let guard = SentimentGuardrail::new(StubModel::new(vec![guard_script.to_string()]));
        let bot = Arc::new(
            Agent::new("Support Bot", StubModel::new(bot_script))
                .with_instructions("You are a helpful customer support bot."),
        );
        let human = Arc::new(
            Agent::new("Human Agent", StubModel::new(human_script))
                .with_instructions("You are a human support agent."),
        );
        Session::new(Arc::new(guard), EscalationPolicy::default(), bot, human)
    }

    #[tokio::test]
    async fn neutral_query_takes_the_primary_path() {
        let session = session(
            r#"{"is_negative": false, "reasoning": "neutral question"}"#,
            vec![r#"{"action":"respond","content":"You can return products within 30 days."}"#.into()],
            vec![],
        );

        let outcome = session
            .handle_turn("What is your return policy?")
            .await
            .unwrap();
        match outcome {
            TurnOutcome::Completed(run) => {
                assert_eq!(run.agent, "Support Bot");
                assert!(run.final_output.contains("30 days"));
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn hostile_query_escalates_to_the_human_agent() {
        let session = session(
            r#"{"is_negative": true, "reasoning": "insults the company"}"#,
            vec![],
            vec![r#"{"action":"respond","content":"I'm sorry to hear that. Let me help."}"#.into()],
        );

        let outcome = session
            .handle_turn("Your company sucks, I want a refund!")
            .await
            .unwrap();
        match outcome {
            TurnOutcome::Escalated { trigger, run } => {
                assert!(matches!(trigger, EscalationTrigger::Sentiment(_)));
                assert_eq!(run.agent, "Human Agent");
            }
            other => panic!("expected escalation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn trigger_phrase_escalates_without_a_negative_verdict() {
        let session = session(
            r#"{"is_negative": false, "reasoning": "calm request"}"#,
            vec![],
            vec![r#"{"action":"respond","content":"I'll walk you through the reset."}"#.into()],
        );

        let outcome = session
            .handle_turn("I need help with a password reset")
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            TurnOutcome::Escalated {
                trigger: EscalationTrigger::Keyword(_),
                ..
            }
        ));
    }
}
