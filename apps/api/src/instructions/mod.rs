//! Auxiliary instruction corpora read from line-delimited JSON.
//!
//! Instruction pairs (`query`/`positive`/`negative`) and instruction records
//! (`instruction`/`input`/`output`) can be appended to the retrieval index and
//! exported as fine-tuning datasets. Neither takes part in candidate scoring.

pub mod export;
pub mod handlers;

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::candidates::loader::LoadError;
use crate::models::chunk::{Metadata, TextBlock, META_TYPE, TYPE_INSTRUCTION_PAIR, TYPE_LLM_INSTRUCTION};

/// One line of the instruction-pair corpus. `pair_id` is the 1-based line number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionPair {
    pub pair_id: usize,
    pub query: Option<String>,
    pub positive: Option<String>,
    pub negative: Option<String>,
}

impl InstructionPair {
    /// One block per non-empty side, in query, positive, negative order.
    pub fn to_text_blocks(&self) -> Vec<TextBlock> {
        [
            ("query", &self.query),
            ("positive", &self.positive),
            ("negative", &self.negative),
        ]
        .into_iter()
        .filter_map(|(role, text)| {
            let text = text.as_deref().filter(|t| !t.is_empty())?;
            let mut metadata = Metadata::new();
            metadata.insert(META_TYPE.into(), json!(TYPE_INSTRUCTION_PAIR));
            metadata.insert("role".into(), json!(role));
            metadata.insert("pair_id".into(), json!(self.pair_id));
            if role != "query" {
                metadata.insert("query".into(), json!(self.query));
            }
            Some(TextBlock::new(text, metadata))
        })
        .collect()
    }
}

/// One line of the instruction-record corpus. `row_id` is the 1-based line number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmInstructionRecord {
    pub row_id: usize,
    pub instruction: Value,
    pub input: Value,
    pub output: Value,
}

impl LlmInstructionRecord {
    pub fn to_text_block(&self) -> TextBlock {
        let content = format!(
            "Instruction: {}\nInput: {}\nOutput: {}",
            render_text(&self.instruction),
            render_text(&self.input),
            render_text(&self.output)
        );
        let mut metadata = Metadata::new();
        metadata.insert(META_TYPE.into(), json!(TYPE_LLM_INSTRUCTION));
        metadata.insert("row_id".into(), json!(self.row_id));
        TextBlock::new(content, metadata)
    }
}

/// Strings as-is; everything else as compact JSON.
pub fn render_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Reads the instruction-pair corpus. A missing file is an empty corpus.
pub async fn load_instruction_pairs(path: &Path) -> Result<Vec<InstructionPair>, LoadError> {
    let pairs: Vec<InstructionPair> = read_jsonl_objects(path)
        .await?
        .into_iter()
        .map(|(line, obj)| InstructionPair {
            pair_id: line,
            query: string_field(&obj, "query"),
            positive: string_field(&obj, "positive"),
            negative: string_field(&obj, "negative"),
        })
        .collect();

    info!("Loaded {} instruction pairs from {}", pairs.len(), path.display());
    Ok(pairs)
}

/// Reads the instruction-record corpus. Lines lacking any of
/// `instruction`, `input` or `output` are skipped.
pub async fn load_llm_instruction_records(
    path: &Path,
) -> Result<Vec<LlmInstructionRecord>, LoadError> {
    let records: Vec<LlmInstructionRecord> = read_jsonl_objects(path)
        .await?
        .into_iter()
        .filter_map(|(line, mut obj)| {
            Some(LlmInstructionRecord {
                row_id: line,
                instruction: obj.remove("instruction")?,
                input: obj.remove("input")?,
                output: obj.remove("output")?,
            })
        })
        .collect();

    info!(
        "Loaded {} instruction records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Parses each non-blank line as a JSON object, tagged with its 1-based line number.
/// One bad line fails the whole file.
async fn read_jsonl_objects(path: &Path) -> Result<Vec<(usize, Map<String, Value>)>, LoadError> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|source| LoadError::ParseLine {
            path: path.to_path_buf(),
            line: line_no,
            source,
        })?;
        match value {
            Value::Object(obj) => out.push((line_no, obj)),
            _ => {
                return Err(LoadError::NotAnObject {
                    path: path.to_path_buf(),
                    line: Some(line_no),
                })
            }
        }
    }
    Ok(out)
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}
