use std::sync::Arc;

use tokio::sync::Mutex;

use crate::chat::service::ChatPrompts;
use crate::config::Config;
use crate::llm_client::ChatModel;
use crate::vector_store::VectorStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub vector_store: Arc<dyn VectorStore>,
    pub llm: Arc<dyn ChatModel>,
    /// Loaded once at startup; prompt files are not re-read per request.
    pub prompts: Arc<ChatPrompts>,
    /// Serializes index builds so two rebuilds never interleave their writes.
    pub index_lock: Arc<Mutex<()>>,
}
