//! Indexing pipeline: chunk → embed → store.
//!
//! Runs whenever a document or event is created or edited. A multi-chunk
//! vectorization is all-or-nothing: every chunk is embedded before any row
//! is written, and the rows for a source are swapped in as one unit, so a
//! provider failure never leaves a partially indexed source behind.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use agenda_embeddings::{EmbedIntent, EmbeddingProvider, EmbeddingRequest, WordChunker};

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::record::{EmbeddingRecord, SourceType};
use crate::store::VectorStore;

/// The event fields flattened into searchable text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFields {
    /// Event title.
    pub title: Option<String>,

    /// Free-text description.
    pub description: Option<String>,

    /// Location, if any.
    pub location: Option<String>,

    /// Start date/time (ISO 8601).
    pub start_datetime: Option<String>,

    /// Category display name.
    pub category_name: Option<String>,

    /// Monetary amount attached to the event.
    pub amount: Option<f64>,
}

impl EventFields {
    /// Build the labeled summary text that gets embedded.
    fn summary_text(&self) -> String {
        let mut parts = Vec::new();
        if let Some(title) = &self.title {
            parts.push(format!("Titolo: {title}"));
        }
        if let Some(description) = &self.description {
            parts.push(format!("Descrizione: {description}"));
        }
        if let Some(location) = &self.location {
            parts.push(format!("Luogo: {location}"));
        }
        if let Some(start) = &self.start_datetime {
            parts.push(format!("Data: {start}"));
        }
        if let Some(category) = &self.category_name {
            parts.push(format!("Categoria: {category}"));
        }
        parts.join(". ")
    }
}

/// Vectorizes documents and events into the store.
pub struct Indexer {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    chunker: WordChunker,
}

impl Indexer {
    /// Create an indexer over the given provider and store.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self::with_config(provider, store, RetrievalConfig::default())
    }

    /// Create an indexer with custom chunking configuration.
    pub fn with_config(
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            provider,
            store,
            chunker: WordChunker::with_config(config.chunker),
        }
    }

    /// Vectorize an entire document, replacing any previous chunks.
    ///
    /// Returns the number of chunks stored.
    pub async fn vectorize_document(
        &self,
        document_id: &str,
        full_text: &str,
        metadata: serde_json::Value,
    ) -> Result<usize> {
        let chunks = self.chunker.chunk(full_text);

        // Embed everything up front: if any chunk fails, nothing is written
        // and the caller retries the whole document.
        let mut records = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            let response = self
                .provider
                .embed(EmbeddingRequest::new(chunk.clone(), EmbedIntent::Document))
                .await?;
            records.push(EmbeddingRecord::new(
                SourceType::Document,
                document_id,
                i as u32,
                chunk.clone(),
                response.embedding,
                self.stamp_metadata(metadata.clone(), &response.model, response.dimension),
            ));
        }

        let count = self.store.replace_source(document_id, records).await?;
        info!("Vectorized document {document_id} into {count} chunks");
        Ok(count)
    }

    /// Vectorize an event as a single embedding over its summary text.
    ///
    /// Returns the embedding record id.
    pub async fn vectorize_event(&self, event_id: &str, event: &EventFields) -> Result<String> {
        let text = event.summary_text();

        let response = self
            .provider
            .embed(EmbeddingRequest::new(text.clone(), EmbedIntent::Document))
            .await?;

        let metadata = serde_json::json!({
            "event_type": event.category_name,
            "has_location": event.location.is_some(),
            "has_amount": event.amount.is_some(),
        });

        let record = EmbeddingRecord::new(
            SourceType::Event,
            event_id,
            0,
            text,
            response.embedding,
            self.stamp_metadata(metadata, &response.model, response.dimension),
        );
        let record_id = record.id.clone();

        self.store.replace_source(event_id, vec![record]).await?;
        info!("Vectorized event {event_id}");
        Ok(record_id)
    }

    /// Remove every chunk for a deleted source.
    pub async fn remove_source(&self, source_id: &str) -> Result<usize> {
        self.store.delete_by_source(source_id).await
    }

    fn stamp_metadata(
        &self,
        mut metadata: serde_json::Value,
        model: &str,
        dimension: usize,
    ) -> serde_json::Value {
        if !metadata.is_object() {
            metadata = serde_json::json!({});
        }
        if let Some(map) = metadata.as_object_mut() {
            map.insert("model".to_string(), serde_json::json!(model));
            map.insert("dimension".to_string(), serde_json::json!(dimension));
        }
        metadata
    }
}
