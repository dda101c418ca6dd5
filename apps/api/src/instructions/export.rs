//! Fine-tuning dataset export from the instruction-record corpus.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::instructions::{load_llm_instruction_records, render_text, LlmInstructionRecord};

pub const OPENAI_EXPORT_FILENAME: &str = "openai_chat.jsonl";
pub const INSTRUCT_EXPORT_FILENAME: &str = "instruct_generic.jsonl";

#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub record_count: usize,
    /// Both paths are `None` when there was nothing to export.
    pub openai_path: Option<PathBuf>,
    pub instruct_path: Option<PathBuf>,
}

/// Loads `source` and writes the chat-format and generic instruct-format datasets
/// into `export_dir`. A malformed source line is an input-parse error naming the
/// file and line; nothing is written in that case.
pub async fn export_finetune_dataset(
    source: &Path,
    export_dir: &Path,
) -> Result<ExportSummary, AppError> {
    let records = load_llm_instruction_records(source).await?;
    if records.is_empty() {
        warn!("No instruction records loaded from {}", source.display());
        return Ok(ExportSummary {
            record_count: 0,
            openai_path: None,
            instruct_path: None,
        });
    }

    tokio::fs::create_dir_all(export_dir)
        .await
        .with_context(|| format!("Failed to create export dir {}", export_dir.display()))?;

    let openai_path = export_dir.join(OPENAI_EXPORT_FILENAME);
    write_jsonl(&openai_path, records.iter().map(openai_chat_line)).await?;

    let instruct_path = export_dir.join(INSTRUCT_EXPORT_FILENAME);
    write_jsonl(&instruct_path, records.iter().map(instruct_line)).await?;

    info!(
        "Exported {} instruction records to {} and {}",
        records.len(),
        openai_path.display(),
        instruct_path.display()
    );

    Ok(ExportSummary {
        record_count: records.len(),
        openai_path: Some(openai_path),
        instruct_path: Some(instruct_path),
    })
}

/// `{"messages":[system, user, assistant]}`; user and assistant carry JSON-encoded text.
fn openai_chat_line(record: &LlmInstructionRecord) -> serde_json::Value {
    json!({
        "messages": [
            { "role": "system", "content": render_text(&record.instruction) },
            { "role": "user", "content": record.input.to_string() },
            { "role": "assistant", "content": record.output.to_string() }
        ]
    })
}

fn instruct_line(record: &LlmInstructionRecord) -> serde_json::Value {
    json!({
        "instruction": record.instruction,
        "input": record.input,
        "output": record.output
    })
}

async fn write_jsonl(
    path: &Path,
    lines: impl Iterator<Item = serde_json::Value>,
) -> anyhow::Result<()> {
    let mut body = String::new();
    for line in lines {
        body.push_str(&line.to_string());
        body.push('\n');
    }
    tokio::fs::write(path, body)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::fs;

    #[tokio::test]
    async fn test_export_writes_both_formats() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("llm.jsonl");
        fs::write(
            &source,
            "{\"instruction\":\"Pick the best candidate\",\"input\":{\"ids\":[\"a\"]},\"output\":\"a\"}\n",
        )
        .unwrap();
        let out_dir = tmp.path().join("exports");

        let summary = export_finetune_dataset(&source, &out_dir).await.unwrap();
        assert_eq!(summary.record_count, 1);

        let chat = fs::read_to_string(out_dir.join(OPENAI_EXPORT_FILENAME)).unwrap();
        let line: Value = serde_json::from_str(chat.trim_end()).unwrap();
        assert_eq!(line["messages"][0]["content"], "Pick the best candidate");
        assert_eq!(line["messages"][1]["content"], "{\"ids\":[\"a\"]}");
        // Strings are JSON-encoded too, so they keep their quotes.
        assert_eq!(line["messages"][2]["content"], "\"a\"");

        let generic = fs::read_to_string(out_dir.join(INSTRUCT_EXPORT_FILENAME)).unwrap();
        let line: Value = serde_json::from_str(generic.trim_end()).unwrap();
        assert_eq!(line["input"]["ids"][0], "a");
        assert!(line.get("row_id").is_none());
    }

    #[tokio::test]
    async fn test_empty_source_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let out_dir = tmp.path().join("exports");
        let summary = export_finetune_dataset(&tmp.path().join("missing.jsonl"), &out_dir)
            .await
            .unwrap();
        assert_eq!(summary.record_count, 0);
        assert!(summary.openai_path.is_none());
        assert!(!out_dir.exists());
    }

    #[tokio::test]
    async fn test_malformed_line_is_input_parse_error_and_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("llm.jsonl");
        fs::write(
            &source,
            "{\"instruction\":\"i\",\"input\":\"x\",\"output\":\"y\"}\nnot json\n",
        )
        .unwrap();
        let out_dir = tmp.path().join("exports");

        let err = export_finetune_dataset(&source, &out_dir).await.unwrap_err();
        match err {
            AppError::InputParse(msg) => {
                assert!(msg.contains("llm.jsonl"));
                assert!(msg.contains("line 2"));
            }
            other => panic!("expected InputParse, got {other:?}"),
        }
        assert!(!out_dir.exists());
    }
}
