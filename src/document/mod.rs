use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata key that every document carries, identifying where it came from.
pub const SOURCE_KEY: &str = "source";

/// Source value used for documents supplied as raw text rather than a file.
pub const INLINE_SOURCE: &str = "inline";

/// A normalized source document ready for chunking.
///
/// Metadata always carries a `source` entry (file path, "inline", or a
/// caller-supplied identifier); any other keys are caller-defined and pass
/// through the pipeline untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    /// Create a document with the given content and a `source` metadata entry.
    #[inline]
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(SOURCE_KEY.to_string(), source.into());
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// The `source` metadata value, if present.
    #[inline]
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// A bounded fragment of a [`Document`], the unit of embedding and retrieval.
///
/// Chunks never reference their parent document; the vector store holds them
/// flatly, so the inherited metadata is all the provenance they carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub metadata: BTreeMap<String, String>,
}

impl Chunk {
    /// The `source` metadata value, if present.
    #[inline]
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// A chunk paired with its embedding, as stored in a vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub content: String,
    pub metadata: BTreeMap<String, String>,
    pub created_at: String,
}

impl VectorRecord {
    /// Build a record from a chunk and its embedding, assigning a fresh id
    /// and an RFC 3339 creation timestamp.
    #[inline]
    pub fn from_chunk(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            vector,
            content: chunk.content,
            metadata: chunk.metadata,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// The `source` metadata value, if present.
    #[inline]
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// A retrieved record with its similarity score (higher is more relevant).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: VectorRecord,
    pub score: f32,
}
