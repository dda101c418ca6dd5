/// LLM Client: the single point of entry for chat completions.
///
/// No other module may call a chat-completion API directly.
/// Backends: Ollama (`/api/chat`) and OpenAI-compatible (`/chat/completions`),
/// selected by `LLM_PROVIDER`. Temperature is fixed at 0.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::{Provider, ProviderConfig};

pub mod prompts;

const TEMPERATURE: f32 = 0.0;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Answer composition seam. Carried in `AppState` as `Arc<dyn ChatModel>`.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError>;

    fn model_name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaMessage>,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

#[derive(Debug, Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// The chat client used by the query service.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: ProviderConfig,
}

impl LlmClient {
    pub fn new(config: ProviderConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            config,
        })
    }

    /// One chat round trip. No retries: a failure is returned to the caller as-is.
    pub async fn call(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let messages = vec![
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: prompt,
            },
        ];

        let text = match self.config.provider {
            Provider::Ollama => self.call_ollama(messages).await?,
            Provider::OpenAi => self.call_openai(messages).await?,
        };

        if text.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(text)
    }

    async fn call_ollama(&self, messages: Vec<ChatMessage<'_>>) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.config.base_url.trim_end_matches('/'));
        let body = OllamaChatRequest {
            model: &self.config.model,
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: TEMPERATURE,
            },
        };

        let response = self.client.post(url).json(&body).send().await?;
        let response = ensure_success(response).await?;
        let parsed: OllamaChatResponse = response.json().await?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            parsed.prompt_eval_count, parsed.eval_count
        );
        parsed
            .message
            .map(|m| m.content)
            .ok_or(LlmError::EmptyContent)
    }

    async fn call_openai(&self, messages: Vec<ChatMessage<'_>>) -> Result<String, LlmError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = OpenAiChatRequest {
            model: &self.config.model,
            messages,
            temperature: TEMPERATURE,
        };

        let mut request = self.client.post(url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = ensure_success(request.send().await?).await?;
        let parsed: OpenAiChatResponse = response.json().await?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyContent)
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        self.call(system, prompt).await
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Turns a non-2xx response into `LlmError::Api`, pulling out the provider's message.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LlmError::Api {
        status: status.as_u16(),
        message: extract_error_message(&body),
    })
}

/// Handles both `{"error":"..."}` (Ollama) and `{"error":{"message":"..."}}` (OpenAI).
pub(crate) fn extract_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    match value.get("error") {
        Some(Value::String(msg)) => msg.clone(),
        Some(Value::Object(obj)) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_message_ollama_shape() {
        assert_eq!(
            extract_error_message(r#"{"error":"model 'x' not found"}"#),
            "model 'x' not found"
        );
    }

    #[test]
    fn test_extract_error_message_openai_shape() {
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"Invalid API key","type":"auth"}}"#),
            "Invalid API key"
        );
    }

    #[test]
    fn test_extract_error_message_plain_text() {
        assert_eq!(extract_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_openai_response_deserializes() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"c-1 fits"}}],"usage":{"prompt_tokens":10,"completion_tokens":3}}"#;
        let parsed: OpenAiChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("c-1 fits"));
    }

    #[test]
    fn test_ollama_response_deserializes_without_counts() {
        let body = r#"{"model":"llama3.1","message":{"role":"assistant","content":"ok"},"done":true}"#;
        let parsed: OllamaChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.message.unwrap().content, "ok");
        assert_eq!(parsed.eval_count, 0);
    }
}
