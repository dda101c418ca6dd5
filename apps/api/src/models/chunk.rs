use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

/// Metadata attached to every block and chunk in the retrieval index.
pub type Metadata = Map<String, Value>;

/// Metadata key holding the record-type discriminator.
pub const META_TYPE: &str = "type";

pub const TYPE_CANDIDATE: &str = "candidate";
pub const TYPE_INSTRUCTION_PAIR: &str = "instruction_pair";
pub const TYPE_LLM_INSTRUCTION: &str = "llm_instruction";

/// A contiguous span of derived text plus metadata, the unit fed into chunking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub content: String,
    pub metadata: Metadata,
}

impl TextBlock {
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    #[cfg(test)]
    pub fn record_type(&self) -> Option<&str> {
        self.metadata.get(META_TYPE).and_then(Value::as_str)
    }
}

/// A chunk with its embedding, ready for the vector store.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub content: String,
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
}

/// A chunk returned by similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,
    pub metadata: Metadata,
    pub similarity: f64,
}

#[derive(Debug, Clone, FromRow)]
pub struct ChunkRow {
    pub content: String,
    pub metadata: Value,
    pub similarity: f64,
}

impl From<ChunkRow> for RetrievedChunk {
    fn from(row: ChunkRow) -> Self {
        RetrievedChunk {
            content: row.content,
            metadata: match row.metadata {
                Value::Object(map) => map,
                _ => Metadata::new(),
            },
            similarity: row.similarity,
        }
    }
}
