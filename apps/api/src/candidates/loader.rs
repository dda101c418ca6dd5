use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::candidates::record::CandidateRecord;
use crate::errors::AppError;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed JSON in {path} line {line}: {source}")]
    ParseLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path}: expected a JSON object at the top level")]
    NotAnObject { path: PathBuf, line: Option<usize> },
}

impl From<LoadError> for AppError {
    fn from(e: LoadError) -> Self {
        match e {
            LoadError::Io { .. } => AppError::Internal(anyhow::Error::new(e)),
            other => AppError::InputParse(other.to_string()),
        }
    }
}

/// Loads every `*.json` document in `input_dir`, ordered by file name.
///
/// A missing directory yields no records. Any unreadable or malformed file
/// fails the whole load.
pub async fn load_candidate_records(input_dir: &Path) -> Result<Vec<CandidateRecord>, LoadError> {
    let files = list_json_files(input_dir).await?;
    let mut records = Vec::with_capacity(files.len());

    for path in files {
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
        let data: Value = serde_json::from_str(&text).map_err(|source| LoadError::Parse {
            path: path.clone(),
            source,
        })?;
        if !data.is_object() {
            return Err(LoadError::NotAnObject { path, line: None });
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let record = CandidateRecord::from_payload(data, &stem);
        debug!("Loaded candidate {} from {}", record.candidate_id, path.display());
        records.push(record);
    }

    info!(
        "Loaded {} candidate records from {}",
        records.len(),
        input_dir.display()
    );
    Ok(records)
}

async fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Candidate input directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(LoadError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut files = Vec::new();
    loop {
        let entry = entries.next_entry().await.map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let Some(entry) = entry else { break };
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }
        let file_type = entry.file_type().await.map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        if file_type.is_file() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let records = load_candidate_records(&tmp.path().join("nope")).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_loads_sorted_by_filename_and_skips_other_files() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "b.json", r#"{"GeneralInfo":{"CandidateId":"beta"}}"#);
        write(tmp.path(), "a.json", r#"{"Summary":"no id here"}"#);
        write(tmp.path(), "c.txt", "not json at all");
        fs::create_dir(tmp.path().join("nested.json")).unwrap();

        let records = load_candidate_records(tmp.path()).await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.candidate_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "beta"]);
    }

    #[tokio::test]
    async fn test_directory_with_json_suffix_is_not_a_document() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("archive.json")).unwrap();
        write(tmp.path(), "a.json", r#"{"Summary":"only file"}"#);

        let records = load_candidate_records(tmp.path()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].candidate_id, "a");
    }

    #[tokio::test]
    async fn test_ordering_is_deterministic_across_runs() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["zeta", "alpha", "mid", "10", "2"] {
            write(tmp.path(), &format!("{name}.json"), "{}");
        }
        let first: Vec<String> = load_candidate_records(tmp.path())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.candidate_id)
            .collect();
        let second: Vec<String> = load_candidate_records(tmp.path())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.candidate_id)
            .collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["10", "2", "alpha", "mid", "zeta"]);
    }

    #[tokio::test]
    async fn test_malformed_file_aborts_whole_load() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.json", "{}");
        write(tmp.path(), "b.json", "{ broken");
        let err = load_candidate_records(tmp.path()).await.unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert!(err.to_string().contains("b.json"));
    }

    #[tokio::test]
    async fn test_non_object_document_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.json", "[1, 2]");
        let err = load_candidate_records(tmp.path()).await.unwrap_err();
        assert!(matches!(err, LoadError::NotAnObject { .. }));
        assert!(matches!(AppError::from(err), AppError::InputParse(_)));
    }
}
