//! Axum route handlers for the chat API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

use crate::chat::service::{answer_question, ChatResponse, QueryContext};
use crate::errors::AppError;
use crate::state::AppState;
use crate::vector_store::QueryFilters;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default)]
    pub filters: Option<QueryFilters>,
}

/// POST /chat
///
/// Answers a question from the indexed corpus. Returns 400 for an empty
/// question, a malformed body or bad filters and 503 when the vector store or
/// model is down.
pub async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = payload?;
    let ctx = QueryContext {
        store: state.vector_store.as_ref(),
        llm: state.llm.as_ref(),
        prompts: &state.prompts,
        default_types: &state.config.retrieval_types,
    };

    let response = answer_question(&ctx, &request.question, request.filters.as_ref()).await?;
    Ok(Json(response))
}
