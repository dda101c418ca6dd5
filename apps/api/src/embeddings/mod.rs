//! Embedding provider seam and its HTTP implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::{Provider, ProviderConfig};
use crate::llm_client::extract_error_message;

/// Texts sent per HTTP request.
const EMBED_BATCH_SIZE: usize = 64;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("expected {expected} embeddings, provider returned {got}")]
    CountMismatch { expected: usize, got: usize },
}

/// `embed(texts) -> vectors`, one vector per input text, in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    fn name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
    index: usize,
}

/// Embeddings over HTTP: Ollama `/api/embed` or OpenAI-compatible `/embeddings`.
#[derive(Clone)]
pub struct HttpEmbeddingClient {
    client: Client,
    config: ProviderConfig,
    normalize: bool,
}

impl HttpEmbeddingClient {
    pub fn new(config: ProviderConfig, normalize: bool) -> Result<Self, EmbeddingError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            config,
            normalize,
        })
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let base = self.config.base_url.trim_end_matches('/');
        let body = EmbedRequest {
            model: &self.config.model,
            input: batch,
        };

        let vectors = match self.config.provider {
            Provider::Ollama => {
                let response = self
                    .client
                    .post(format!("{base}/api/embed"))
                    .json(&body)
                    .send()
                    .await?;
                let parsed: OllamaEmbedResponse = ensure_success(response).await?.json().await?;
                parsed.embeddings
            }
            Provider::OpenAi => {
                let mut request = self.client.post(format!("{base}/embeddings")).json(&body);
                if let Some(key) = &self.config.api_key {
                    request = request.bearer_auth(key);
                }
                let parsed: OpenAiEmbedResponse =
                    ensure_success(request.send().await?).await?.json().await?;
                let mut data = parsed.data;
                data.sort_by_key(|d| d.index);
                data.into_iter().map(|d| d.embedding).collect()
            }
        };

        if vectors.len() != batch.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: batch.len(),
                got: vectors.len(),
            });
        }
        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH_SIZE) {
            debug!("Embedding batch of {} texts with {}", batch.len(), self.config.model);
            let mut vectors = self.embed_batch(batch).await?;
            if self.normalize {
                vectors.iter_mut().for_each(|v| l2_normalize(v));
            }
            out.extend(vectors);
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, EmbeddingError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(EmbeddingError::Api {
        status: status.as_u16(),
        message: extract_error_message(&body),
    })
}

/// Scales `v` to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}
