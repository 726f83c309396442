//! Building blocks for a customer-support bot demo.
//!
//! The crate provides a minimal runtime with:
//! - A language model abstraction (`LanguageModel`) and a Gemini-backed chat client.
//! - A gated tool interface (`Tool` and `ToolRegistry`): per-turn tool
//!   visibility is a pure function of the query text.
//! - An `Agent` that loops between the model and tools and can hand a turn
//!   off to another agent.
//! - An input sentiment guardrail and an escalation policy that route risky
//!   turns to a human stand-in.

mod agent;
mod config;
mod error;
mod guardrails;
mod llm;
mod memory;
mod message;
mod policy;
mod session;
mod tool;
pub mod tools;

pub use agent::{Agent, AgentRun, ToolInvocation};
pub use config::{AppConfig, EscalationConfig, ModelConfig, WeatherConfig};
pub use error::{DeskbotError, Result};
pub use guardrails::{Guardrail, SentimentGuardrail, SentimentVerdict};
pub use llm::{GeminiClient, LanguageModel, ModelCompletion, StubModel};
pub use memory::Transcript;
pub use message::{Message, Role, ToolCall, ToolResult};
pub use policy::{EscalationPolicy, EscalationTrigger, OrderToolGate, TurnState};
pub use session::{Session, TurnOutcome};
pub use tool::{Tool, ToolDescription, ToolPredicate, ToolRegistry};
