//! # Embeddings
//!
//! This crate turns free-form organizer text (documents, events, queries)
//! into fixed-dimension vectors and provides the similarity math used to
//! rank them.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert text to dense, L2-normalized vectors
//! - **Asymmetric Intents**: Documents and queries are embedded separately
//! - **Word Chunking**: Split long documents into overlapping windows
//! - **Similarity Math**: Cosine similarity over normalized vectors
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Embeddings System                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  WordChunker ──► EmbeddingProvider ──► Embedding                │
//! │                        │                   │                    │
//! │                        ▼                   ▼                    │
//! │                  GeminiProvider      cosine_similarity          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod chunker;
pub mod error;
pub mod provider;
pub mod similarity;

pub use chunker::{ChunkerConfig, WordChunker};
pub use error::{EmbeddingError, Result};
pub use provider::{
    EmbedIntent, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, GeminiProvider,
};
pub use similarity::{cosine_similarity, l2_norm, normalize};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Default dimension of embeddings (gemini-embedding-001 truncated output).
pub const DEFAULT_DIMENSION: usize = 768;
