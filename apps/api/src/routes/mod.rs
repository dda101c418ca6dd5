pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers::handle_chat;
use crate::indexing::handlers::handle_build_index;
use crate::instructions::handlers::handle_export_dataset;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/index", post(handle_build_index))
        .route("/chat", post(handle_chat))
        .route("/dataset/export", post(handle_export_dataset))
        .with_state(state)
}
