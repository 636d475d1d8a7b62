//! PDF agent server binary
//!
//! Run with: cargo run -p pdf-agent --bin pdf-agent-server

use pdf_agent::{
    config::AgentConfig,
    server::{state::AppState, PdfAgentServer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_agent=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AgentConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!("  - Vector store: {:?} ({})", config.vector_store.backend, config.vector_store.index_name);
    tracing::info!("  - Chunk size: {} (overlap {})", config.chunking.chunk_size, config.chunking.chunk_overlap);
    tracing::info!("  - Upload dir: {}", config.server.upload_dir.display());

    let state = AppState::from_config(config)?;

    // Best effort: keep serving without a retriever if the index is unreachable
    if let Err(e) = state.initialize_retriever().await {
        tracing::error!("Error initializing retriever: {}", e);
        tracing::warn!("/ask will be rejected until POST /retriever/initialize succeeds");
    }

    let server = PdfAgentServer::new(state);

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /upload-pdf            - Upload and index a PDF");
    println!("  POST /ask                   - Ask a question");
    println!("  POST /retriever/initialize  - Re-attach the retriever");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
