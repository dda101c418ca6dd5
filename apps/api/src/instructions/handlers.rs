//! Axum route handlers for the fine-tuning dataset export.

use axum::{extract::State, Json};
use tracing::info;

use crate::errors::AppError;
use crate::instructions::export::{export_finetune_dataset, ExportSummary};
use crate::state::AppState;

/// POST /dataset/export
///
/// Writes the chat-format and instruct-format datasets from the instruction
/// records on disk. An absent source yields a zero-record summary.
pub async fn handle_export_dataset(
    State(state): State<AppState>,
) -> Result<Json<ExportSummary>, AppError> {
    let paths = &state.config.paths;
    let summary = export_finetune_dataset(&paths.llm_instructions_file, &paths.export_dir).await?;
    info!("Dataset export wrote {} records", summary.record_count);
    Ok(Json(summary))
}
