//! Supervisor demo: route queries to a maths agent or a research agent
//!
//! Run with: cargo run -p pdf-agent --bin pdf-agent-supervisor -- "What is 2 plus 3?"

use clap::Parser;
use std::sync::Arc;

use pdf_agent::{
    config::AgentConfig,
    providers::{GeminiChat, GeminiClient},
    supervisor::build_math_search_workflow,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_QUERIES: [&str; 2] = [
    "What is 17 multiplied by 4?",
    "Where is the HQ of FNN company in 2024?",
];

#[derive(Parser, Debug)]
#[command(name = "pdf-agent-supervisor", about = "Route queries between a maths agent and a research agent")]
struct Args {
    /// Queries to run (defaults to the two built-in examples)
    queries: Vec<String>,

    /// Chat model for the supervisor and both agents
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_agent=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = AgentConfig::load()?;

    let model = args.model.unwrap_or_else(|| config.supervisor.model.clone());
    let client = Arc::new(GeminiClient::new(
        &config.llm,
        config.credentials.google_api_key.clone(),
    )?);
    let llm = Arc::new(GeminiChat::new(client, &config.llm).with_model(model));

    let workflow = build_math_search_workflow(llm, config.agent.max_iterations);

    let queries: Vec<String> = if args.queries.is_empty() {
        DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect()
    } else {
        args.queries
    };

    for query in &queries {
        let response = workflow.invoke(query).await?;
        tracing::info!(agent = %response.agent, "Query handled");
        println!("Response: {}", response.message);
    }

    Ok(())
}
