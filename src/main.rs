use std::env;
use std::io::{self, Write};
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use deskbot::tools::{support_toolkit, OrderStore};
use deskbot::{
    Agent, AppConfig, EscalationPolicy, GeminiClient, Result, SentimentGuardrail, Session,
    TurnOutcome,
};

const BOT_INSTRUCTIONS: &str = "\
You are a helpful customer support bot.
- Answer simple FAQs about products with the get_company_info tool.
- Use the get_order_status tool for order queries.
- Use the get_weather and add tools for weather and arithmetic questions.
- If the request is complex, unclear, or sensitive, hand the conversation off to the Human Agent.";

const HUMAN_INSTRUCTIONS: &str =
    "You are a human support agent. Handle complex or sensitive queries with empathy.";

const EXAMPLE_QUERIES: &[&str] = &[
    "What's the status of order 123?",
    "What is your return policy?",
    "What's the weather like in Karachi?",
    "What is 19 + 23?",
    "I have a question about my billing statement",
    "Your company sucks, I want a refund!",
];

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match env::var("DESKBOT_CONFIG") {
        Ok(path) => AppConfig::from_env_or_file(path)?,
        Err(_) => AppConfig::from_env()?,
    };

    let model = Arc::new(GeminiClient::from_config(&config.model)?);
    let store = Arc::new(OrderStore::demo());
    let tools = support_toolkit(Arc::clone(&store), config.weather.clone())?;

    let human = Arc::new(
        Agent::new("Human Agent", Arc::clone(&model)).with_instructions(HUMAN_INSTRUCTIONS),
    );
    let bot = Arc::new(
        Agent::new("Customer Support Bot", Arc::clone(&model))
            .with_instructions(BOT_INSTRUCTIONS)
            .with_tools(tools)
            .with_handoff(Arc::clone(&human)),
    );
    let guardrail = Arc::new(SentimentGuardrail::new(Arc::clone(&model)));
    let policy = EscalationPolicy::new(config.escalation.trigger_phrases.clone());
    let session = Session::new(guardrail, policy, bot, human);

    if env::args().any(|arg| arg == "--batch") {
        run_batch(&session).await;
    } else {
        run_interactive(&session).await?;
    }

    Ok(())
}

async fn run_batch(session: &Session<GeminiClient>) {
    for query in EXAMPLE_QUERIES {
        println!();
        println!("USER: {query}");
        process_query(session, query).await;
    }
}

async fn run_interactive(session: &Session<GeminiClient>) -> Result<()> {
    let stdin = io::stdin();
    loop {
        print!("Enter your query (or `exit`): ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() || query.eq_ignore_ascii_case("exit") {
            break;
        }
        process_query(session, query).await;
    }
    Ok(())
}

/// Each query is an independent unit of work; a failed turn is logged and
/// the driver moves on.
async fn process_query(session: &Session<GeminiClient>, query: &str) {
    match session.handle_turn(query).await {
        Ok(outcome) => print_outcome(&outcome),
        Err(err) => tracing::error!(error = %err, "turn failed"),
    }
}

fn print_outcome(outcome: &TurnOutcome) {
    let run = match outcome {
        TurnOutcome::Completed(run) => run,
        TurnOutcome::Escalated { run, .. } => {
            println!("Escalating to a human agent...");
            run
        }
    };
    for invocation in &run.invocations {
        println!("[tool] {}: {}", invocation.name, invocation.output);
    }
    println!("BOT: {}", run.final_output);
    println!("(answered by {})", run.agent);
}
