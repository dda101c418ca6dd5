//! Index Builder: candidate records and auxiliary corpora into the vector store.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::candidates::loader::load_candidate_records;
use crate::config::{DataPaths, CHUNK_OVERLAP, CHUNK_SIZE};
use crate::errors::AppError;
use crate::indexing::splitter::BlockSplitter;
use crate::instructions::{load_instruction_pairs, load_llm_instruction_records};
use crate::models::chunk::TextBlock;
use crate::vector_store::VectorStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub candidate_count: usize,
    pub chunk_count: usize,
}

/// Loads candidates (ordered by file name), splits their blocks, appends any
/// instruction corpora present on disk and replaces the vector store contents.
///
/// Any load, embedding or persistence failure aborts the build before the
/// stored index is replaced.
pub async fn build_index(paths: &DataPaths, store: &dyn VectorStore) -> Result<IndexSummary, AppError> {
    let splitter = BlockSplitter::new(CHUNK_SIZE, CHUNK_OVERLAP)
        .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;

    let records = load_candidate_records(&paths.input_dir).await?;
    let candidate_blocks: Vec<TextBlock> = records.iter().flat_map(|r| r.to_text_blocks()).collect();
    let mut chunks = splitter.split_blocks(&candidate_blocks);
    info!(
        "Built {} blocks / {} chunks from {} candidates",
        candidate_blocks.len(),
        chunks.len(),
        records.len()
    );

    let pairs = load_instruction_pairs(&paths.instruction_pairs_file).await?;
    if !pairs.is_empty() {
        let blocks: Vec<TextBlock> = pairs.iter().flat_map(|p| p.to_text_blocks()).collect();
        let before = chunks.len();
        chunks.extend(splitter.split_blocks(&blocks));
        info!("Appended {} instruction-pair chunks", chunks.len() - before);
    }

    let instructions = load_llm_instruction_records(&paths.llm_instructions_file).await?;
    if !instructions.is_empty() {
        let blocks: Vec<TextBlock> = instructions.iter().map(|r| r.to_text_block()).collect();
        let before = chunks.len();
        chunks.extend(splitter.split_blocks(&blocks));
        info!("Appended {} instruction-record chunks", chunks.len() - before);
    }

    let stored = store.upsert(&chunks).await?;

    Ok(IndexSummary {
        candidate_count: records.len(),
        chunk_count: stored,
    })
}
