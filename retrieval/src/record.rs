//! Embedding record types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agenda_embeddings::Embedding;

/// The category of record an embedding was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// An uploaded document (bills, reports, receipts).
    Document,

    /// A calendar event.
    Event,

    /// A stored conversation snippet.
    Conversation,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Document => write!(f, "document"),
            Self::Event => write!(f, "event"),
            Self::Conversation => write!(f, "conversation"),
        }
    }
}

/// One stored chunk of vectorized text.
///
/// `(source_type, source_id, chunk_index)` is unique per logical chunk; a
/// multi-chunk source has contiguous chunk indices 0..N-1. All chunks for a
/// source are deleted and recreated together on update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Opaque unique key.
    pub id: String,

    /// What kind of record this chunk came from.
    pub source_type: SourceType,

    /// Foreign key into the record store.
    pub source_id: String,

    /// Chunk position within the source (0 for single-chunk sources).
    pub chunk_index: u32,

    /// The raw chunk text.
    pub text_content: String,

    /// The embedding vector, L2-normalized.
    pub vector: Embedding,

    /// Open key-value metadata.
    pub metadata: serde_json::Value,
}

impl EmbeddingRecord {
    /// Create a new record with a fresh id.
    pub fn new(
        source_type: SourceType,
        source_id: impl Into<String>,
        chunk_index: u32,
        text_content: impl Into<String>,
        vector: Embedding,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source_type,
            source_id: source_id.into(),
            chunk_index,
            text_content: text_content.into(),
            vector,
            metadata,
        }
    }

    /// The unique key of this record.
    pub fn key(&self) -> (SourceType, String, u32) {
        (self.source_type, self.source_id.clone(), self.chunk_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_source_type_display() {
        assert_eq!(SourceType::Document.to_string(), "document");
        assert_eq!(SourceType::Event.to_string(), "event");
        assert_eq!(SourceType::Conversation.to_string(), "conversation");
    }

    #[test]
    fn test_record_key() {
        let record = EmbeddingRecord::new(
            SourceType::Event,
            "evt-1",
            0,
            "Titolo: Palestra",
            vec![1.0, 0.0],
            serde_json::json!({}),
        );
        assert_eq!(record.key(), (SourceType::Event, "evt-1".to_string(), 0));
        assert!(!record.id.is_empty());
    }
}
