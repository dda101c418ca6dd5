use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Characters per chunk handed to the embedding provider.
pub const CHUNK_SIZE: usize = 600;
/// Characters repeated between neighbouring chunks.
pub const CHUNK_OVERLAP: usize = 60;
/// Number of chunks retrieved per question.
pub const RETRIEVER_TOP_K: usize = 6;

const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OLLAMA_CHAT_MODEL: &str = "llama3.1";
const DEFAULT_OPENAI_CHAT_MODEL: &str = "gpt-5-mini";
const DEFAULT_OLLAMA_EMB_MODEL: &str = "nomic-embed-text";
const DEFAULT_OPENAI_EMB_MODEL: &str = "text-embedding-3-small";

/// Which HTTP backend serves chat completions or embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    OpenAi,
}

impl Provider {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAi),
            other => bail!("Unsupported provider '{other}' (expected 'ollama' or 'openai')"),
        }
    }
}

/// Connection details for one HTTP model backend.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
}

/// Filesystem locations read and written by the loaders and exporters.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub input_dir: PathBuf,
    pub instruction_pairs_file: PathBuf,
    pub llm_instructions_file: PathBuf,
    pub export_dir: PathBuf,
    pub prompts_dir: PathBuf,
}

impl DataPaths {
    /// Layout rooted at `data_dir`, with the default file names underneath.
    pub fn under(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            input_dir: data_dir.join("input"),
            instruction_pairs_file: data_dir.join("instructions").join("embedings.jsonl"),
            llm_instructions_file: data_dir.join("instructions").join("llm.jsonl"),
            export_dir: data_dir.join("finetune_exports"),
            prompts_dir: data_dir.join("prompts"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub llm: ProviderConfig,
    pub embeddings: ProviderConfig,
    pub normalize_embeddings: bool,
    pub paths: DataPaths,
    pub retrieval_types: Vec<String>,
    pub app_mode: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let llm_provider = Provider::parse(&require_env("LLM_PROVIDER")?)?;
        let llm = provider_config(
            llm_provider,
            optional_env("LLM_MODEL"),
            match llm_provider {
                Provider::Ollama => DEFAULT_OLLAMA_CHAT_MODEL,
                Provider::OpenAi => DEFAULT_OPENAI_CHAT_MODEL,
            },
        )?;

        let emb_provider = match optional_env("EMB_PROVIDER") {
            Some(raw) => Provider::parse(&raw)?,
            None => llm_provider,
        };
        let embeddings = provider_config(
            emb_provider,
            optional_env("EMB_MODEL"),
            match emb_provider {
                Provider::Ollama => DEFAULT_OLLAMA_EMB_MODEL,
                Provider::OpenAi => DEFAULT_OPENAI_EMB_MODEL,
            },
        )?;

        let data_dir = optional_env("DATA_DIR").unwrap_or_else(|| "./data".to_string());
        let mut paths = DataPaths::under(&data_dir);
        // Instruction and export paths are relative to the working directory, not DATA_DIR.
        paths.instruction_pairs_file = optional_env("EMBEDING_INSTRUCTION_FILE")
            .unwrap_or_else(|| "data/instructions/embedings.jsonl".to_string())
            .into();
        paths.llm_instructions_file = optional_env("LLM_INSTRUCTION_FILE")
            .unwrap_or_else(|| "data/instructions/llm.jsonl".to_string())
            .into();
        paths.export_dir = optional_env("LLM_FT_EXPORT_DIR")
            .unwrap_or_else(|| "data/finetune_exports".to_string())
            .into();
        paths.prompts_dir = optional_env("PROMPTS_DIR")
            .unwrap_or_else(|| "data/prompts".to_string())
            .into();

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            llm,
            embeddings,
            normalize_embeddings: parse_flag(optional_env("EMB_NORMALIZE").as_deref(), true),
            paths,
            retrieval_types: parse_type_list(
                &optional_env("RETRIEVAL_TYPES").unwrap_or_else(|| "candidate".to_string()),
            ),
            app_mode: optional_env("APP_MODE").unwrap_or_default().to_lowercase(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn provider_config(
    provider: Provider,
    model: Option<String>,
    default_model: &str,
) -> Result<ProviderConfig> {
    let model = model.unwrap_or_else(|| default_model.to_string());
    match provider {
        Provider::Ollama => Ok(ProviderConfig {
            provider,
            model,
            base_url: optional_env("OLLAMA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.to_string()),
            api_key: None,
        }),
        Provider::OpenAi => Ok(ProviderConfig {
            provider,
            model,
            base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            api_key: Some(
                require_env("OPENAI_API_KEY")
                    .context("OPENAI_API_KEY is required for provider=openai")?,
            ),
        }),
    }
}

/// Splits a comma-separated list, dropping blanks.
pub fn parse_type_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(raw: Option<&str>, default: bool) -> bool {
    raw.map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
