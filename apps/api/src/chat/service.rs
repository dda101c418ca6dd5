//! Query Service: retrieve chunks for a question and compose an answer.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::RETRIEVER_TOP_K;
use crate::errors::AppError;
use crate::llm_client::prompts::{
    load_prompt, render_human_prompt, CHAT_HUMAN_FILE, CHAT_SYSTEM_FILE, DEFAULT_CHAT_HUMAN,
    DEFAULT_CHAT_SYSTEM,
};
use crate::llm_client::ChatModel;
use crate::models::chunk::{Metadata, RetrievedChunk, META_TYPE, TYPE_CANDIDATE};
use crate::vector_store::{MetadataFilter, QueryFilters, VectorStore};

/// System prompt and human template used for every question.
#[derive(Debug, Clone)]
pub struct ChatPrompts {
    pub system: String,
    pub human: String,
}

impl Default for ChatPrompts {
    fn default() -> Self {
        Self {
            system: DEFAULT_CHAT_SYSTEM.to_string(),
            human: DEFAULT_CHAT_HUMAN.to_string(),
        }
    }
}

impl ChatPrompts {
    pub async fn load(prompts_dir: &Path) -> Self {
        Self {
            system: load_prompt(prompts_dir, CHAT_SYSTEM_FILE, DEFAULT_CHAT_SYSTEM).await,
            human: load_prompt(prompts_dir, CHAT_HUMAN_FILE, DEFAULT_CHAT_HUMAN).await,
        }
    }
}

/// A candidate surfaced by retrieval, ordered by the prepared + English heuristic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRanking {
    pub candidate_id: String,
    pub prepared: bool,
    pub english_level: String,
    pub why: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    /// Metadata of each retrieved chunk, most similar first.
    pub sources: Vec<Metadata>,
    pub ranking: Vec<CandidateRanking>,
}

/// Collaborators and settings the query service needs per call.
pub struct QueryContext<'a> {
    pub store: &'a dyn VectorStore,
    pub llm: &'a dyn ChatModel,
    pub prompts: &'a ChatPrompts,
    pub default_types: &'a [String],
}

/// Answers `question` from the top-K chunks that pass `filters`.
///
/// Empty questions and malformed filters are client errors; any vector-store
/// or language-model failure is a service error and no partial answer is returned.
pub async fn answer_question(
    ctx: &QueryContext<'_>,
    question: &str,
    filters: Option<&QueryFilters>,
) -> Result<ChatResponse, AppError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(AppError::Validation("question cannot be empty".to_string()));
    }

    let filter = MetadataFilter::from_request(filters, ctx.default_types)?;
    debug!("Retrieving with filter {filter:?}");

    let chunks = ctx.store.query(question, RETRIEVER_TOP_K, &filter).await?;
    info!("Retrieved {} chunks for question", chunks.len());

    let context = stuff_context(&chunks);
    let prompt = render_human_prompt(&ctx.prompts.human, &context, question);
    let answer = ctx.llm.complete(&ctx.prompts.system, &prompt).await?;

    let ranking = rank_candidates(&chunks);
    Ok(ChatResponse {
        answer,
        sources: chunks.into_iter().map(|c| c.metadata).collect(),
        ranking,
    })
}

/// Retrieved chunk contents joined by blank lines, in retrieval order.
fn stuff_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One entry per distinct candidate, prepared first, then by English rank.
/// Ties keep retrieval order.
pub fn rank_candidates(chunks: &[RetrievedChunk]) -> Vec<CandidateRanking> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<(bool, u64, CandidateRanking)> = chunks
        .iter()
        .filter(|c| c.metadata.get(META_TYPE).and_then(Value::as_str) == Some(TYPE_CANDIDATE))
        .filter_map(|c| {
            let id = c.metadata.get("candidate_id").and_then(Value::as_str)?;
            if !seen.insert(id.to_string()) {
                return None;
            }
            let prepared = c
                .metadata
                .get("prepared")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let rank = c
                .metadata
                .get("english_level_num")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let english_level = c
                .metadata
                .get("english_level")
                .and_then(Value::as_str)
                .unwrap_or("UNKNOWN")
                .to_string();
            Some((
                prepared,
                rank,
                CandidateRanking {
                    candidate_id: id.to_string(),
                    prepared,
                    english_level,
                    why: "prepared+english heuristic".to_string(),
                },
            ))
        })
        .collect();

    ranked.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
    ranked.into_iter().map(|(_, _, r)| r).collect()
}
