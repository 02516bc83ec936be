//! Configuration for the retrieval system.

use agenda_embeddings::ChunkerConfig;

/// Configuration for indexing and search.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Word-window chunking parameters.
    pub chunker: ChunkerConfig,

    /// Default number of matches returned by a search.
    pub default_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            default_top_k: 5,
        }
    }
}
