//! In-memory stand-ins for the external collaborators, shared by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::embeddings::{l2_normalize, EmbeddingError, EmbeddingProvider};
use crate::errors::AppError;
use crate::llm_client::{ChatModel, LlmError};
use crate::models::chunk::{RetrievedChunk, TextBlock};
use crate::vector_store::{MetadataFilter, VectorStore};

/// Letter-frequency vectors: deterministic and good enough to rank by shared vocabulary.
pub struct LetterEmbedder;

#[async_trait]
impl EmbeddingProvider for LetterEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| letter_vector(t)).collect())
    }

    fn name(&self) -> &str {
        "letters"
    }
}

/// An embedding provider that is always down.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::Api {
            status: 503,
            message: "model not loaded".to_string(),
        })
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Embeds with letter vectors but silently drops the last one.
pub struct TruncatingEmbedder;

#[async_trait]
impl EmbeddingProvider for TruncatingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = LetterEmbedder.embed(texts).await?;
        vectors.pop();
        Ok(vectors)
    }

    fn name(&self) -> &str {
        "truncating"
    }
}

fn letter_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0_f32; 26];
    for c in text.to_ascii_lowercase().bytes() {
        if c.is_ascii_lowercase() {
            v[(c - b'a') as usize] += 1.0;
        }
    }
    l2_normalize(&mut v);
    v
}

fn cosine(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(x, y)| f64::from(x * y)).sum()
}

#[derive(Default)]
pub struct MemoryVectorStore {
    chunks: Mutex<Vec<TextBlock>>,
}

impl MemoryVectorStore {
    pub fn with_chunks(chunks: Vec<TextBlock>) -> Self {
        Self {
            chunks: Mutex::new(chunks),
        }
    }

    pub fn stored(&self) -> Vec<TextBlock> {
        self.chunks.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, chunks: &[TextBlock]) -> Result<usize, AppError> {
        *self.chunks.lock().unwrap() = chunks.to_vec();
        Ok(chunks.len())
    }

    async fn query(
        &self,
        text: &str,
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<RetrievedChunk>, AppError> {
        let query = letter_vector(text);
        let mut hits: Vec<RetrievedChunk> = self
            .chunks
            .lock()
            .unwrap()
            .iter()
            .filter(|c| filter.matches(&c.metadata))
            .map(|c| RetrievedChunk {
                content: c.content.clone(),
                metadata: c.metadata.clone(),
                similarity: cosine(&query, &letter_vector(&c.content)),
            })
            .collect();
        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(k);
        Ok(hits)
    }
}

/// A vector store whose backend is always down.
pub struct FailingStore;

#[async_trait]
impl VectorStore for FailingStore {
    async fn upsert(&self, _chunks: &[TextBlock]) -> Result<usize, AppError> {
        Err(AppError::VectorStore(sqlx::Error::PoolTimedOut))
    }

    async fn query(
        &self,
        _text: &str,
        _k: usize,
        _filter: &MetadataFilter,
    ) -> Result<Vec<RetrievedChunk>, AppError> {
        Err(AppError::VectorStore(sqlx::Error::PoolTimedOut))
    }
}

/// Records the last prompt and answers with a fixed string, or fails when `answer` is `None`.
pub struct ScriptedChat {
    pub answer: Option<String>,
    pub last_prompt: Mutex<Option<String>>,
}

impl ScriptedChat {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            last_prompt: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String, LlmError> {
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        self.answer.clone().ok_or(LlmError::Api {
            status: 502,
            message: "upstream down".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
