//! Semantic search over the vector store.

use std::sync::Arc;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use agenda_embeddings::{EmbedIntent, EmbeddingProvider, EmbeddingRequest, cosine_similarity};

use crate::error::{Result, RetrievalError};
use crate::record::SourceType;
use crate::store::VectorStore;

/// One ranked search result.
///
/// Carries enough to both display the text and dereference the originating
/// record (e.g. open an event by id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMatch {
    /// What kind of record matched.
    pub source_type: SourceType,

    /// Id of the originating record.
    pub source_id: String,

    /// Which chunk of the source matched.
    pub chunk_index: u32,

    /// The matched chunk text.
    pub text: String,

    /// Metadata stored with the chunk.
    pub metadata: serde_json::Value,

    /// Cosine similarity in [-1, 1]. No implicit thresholding; callers
    /// decide what is good enough.
    pub score: f32,
}

/// Ranks stored vectors by cosine similarity to a query.
pub struct Retriever {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    /// Create a retriever over the given provider and store.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { provider, store }
    }

    /// Search stored embeddings for the query text.
    ///
    /// Embeds the query with query intent, scores every stored vector,
    /// and returns the `top_k` best matches in non-increasing score order
    /// (ties broken by scan order). An empty store yields an empty vec.
    pub async fn search(
        &self,
        query_text: &str,
        source_types: Option<&[SourceType]>,
        top_k: usize,
    ) -> Result<Vec<SearchMatch>> {
        if query_text.trim().is_empty() {
            return Err(RetrievalError::Validation(
                "query text is empty".to_string(),
            ));
        }

        let response = self
            .provider
            .embed(EmbeddingRequest::new(query_text, EmbedIntent::Query))
            .await?;
        let query_vector = response.embedding;

        let records = self.store.scan(source_types).await?;
        debug!("Scoring {} stored records", records.len());

        let mut matches = Vec::with_capacity(records.len());
        for record in records {
            let score = cosine_similarity(&query_vector, &record.vector)?;
            matches.push(SearchMatch {
                source_type: record.source_type,
                source_id: record.source_id,
                chunk_index: record.chunk_index,
                text: record.text_content,
                metadata: record.metadata,
                score,
            });
        }

        // Stable sort keeps scan order for equal scores.
        matches.sort_by_key(|m| std::cmp::Reverse(OrderedFloat(m.score)));
        matches.truncate(top_k);

        info!(
            "Search query '{query_text}' returned {} results",
            matches.len()
        );
        Ok(matches)
    }
}
