//! Axum route handlers for index builds.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::indexing::builder::{build_index, IndexSummary};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub indexed: IndexSummary,
}

/// POST /index
///
/// Rebuilds the whole index from the input directory. Concurrent requests
/// queue behind the build lock.
pub async fn handle_build_index(
    State(state): State<AppState>,
) -> Result<Json<IndexResponse>, AppError> {
    let _guard = state.index_lock.lock().await;
    let indexed = build_index(&state.config.paths, state.vector_store.as_ref()).await?;
    info!(
        "Index build finished: {} candidates, {} chunks",
        indexed.candidate_count, indexed.chunk_count
    );
    Ok(Json(IndexResponse { indexed }))
}
