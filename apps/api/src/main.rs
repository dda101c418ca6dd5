mod candidates;
mod chat;
mod config;
mod db;
mod embeddings;
mod errors;
mod indexing;
mod instructions;
mod llm_client;
mod models;
mod routes;
mod state;
#[cfg(test)]
mod test_support;
mod vector_store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::chat::service::ChatPrompts;
use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::embeddings::{EmbeddingProvider, HttpEmbeddingClient};
use crate::indexing::builder::build_index;
use crate::instructions::export::export_finetune_dataset;
use crate::llm_client::{ChatModel, LlmClient};
use crate::routes::build_router;
use crate::state::AppState;
use crate::vector_store::{PgVectorStore, VectorStore};

/// Process modes, chosen by the first CLI argument or `APP_MODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Serve,
    Index,
    Export,
    /// Export (best effort), build the index, then serve.
    Default,
}

impl Mode {
    /// Anything other than `serve`, `index` or `export` runs the default pipeline.
    fn resolve(arg: Option<&str>, app_mode: &str) -> Self {
        match arg.unwrap_or(app_mode).trim().to_lowercase().as_str() {
            "serve" | "api" => Mode::Serve,
            "index" => Mode::Index,
            "export" => Mode::Export,
            _ => Mode::Default,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let arg = std::env::args().nth(1);
    let mode = Mode::resolve(arg.as_deref(), &config.app_mode);
    info!(
        "Starting candidate RAG v{} in {:?} mode",
        env!("CARGO_PKG_VERSION"),
        mode
    );

    if mode == Mode::Export {
        let paths = &config.paths;
        let summary = export_finetune_dataset(&paths.llm_instructions_file, &paths.export_dir).await?;
        info!("Exported {} instruction records", summary.record_count);
        return Ok(());
    }

    // Initialize PostgreSQL + pgvector
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Initialize embedding provider and vector store
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HttpEmbeddingClient::new(
        config.embeddings.clone(),
        config.normalize_embeddings,
    )?);
    info!("Embedding provider initialized ({})", embedder.name());
    let vector_store: Arc<dyn VectorStore> = Arc::new(PgVectorStore::new(db, embedder));

    match mode {
        Mode::Index => {
            let summary = build_index(&config.paths, vector_store.as_ref()).await?;
            info!(
                "Indexed {} candidates into {} chunks",
                summary.candidate_count, summary.chunk_count
            );
            return Ok(());
        }
        Mode::Default => {
            let paths = &config.paths;
            if let Err(e) =
                export_finetune_dataset(&paths.llm_instructions_file, &paths.export_dir).await
            {
                warn!("Dataset export failed, continuing: {e:#}");
            }
            let summary = build_index(&config.paths, vector_store.as_ref()).await?;
            info!(
                "Indexed {} candidates into {} chunks",
                summary.candidate_count, summary.chunk_count
            );
        }
        Mode::Serve | Mode::Export => {}
    }

    // Initialize LLM client
    let llm: Arc<dyn ChatModel> = Arc::new(LlmClient::new(config.llm.clone())?);
    info!("LLM client initialized (model: {})", llm.model_name());

    let prompts = Arc::new(ChatPrompts::load(&config.paths.prompts_dir).await);

    // Build app state
    let state = AppState {
        config: config.clone(),
        vector_store,
        llm,
        prompts,
        index_lock: Arc::new(Mutex::new(())),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once a UI host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
