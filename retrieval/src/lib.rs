//! # Retrieval
//!
//! This crate stores embedding records for the organizer and answers lookup
//! questions over them semantically:
//!
//! - **Vector Store**: durable mapping from (source type, source id, chunk
//!   index) to (vector, text, metadata)
//! - **Indexer**: chunk → embed → store pipeline for documents and events
//! - **Retriever**: top-k cosine ranking of stored vectors for a query
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Retrieval System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Indexer ──► VectorStore ◄── Retriever                          │
//! │     │             │               │                             │
//! │     ▼             ▼               ▼                             │
//! │  WordChunker  EmbeddingRecord  SearchMatch                      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store is a full-scan design: acceptable at organizer scale (tens to
//! low thousands of chunks per user). The `search` contract, not the scan,
//! is the durable interface; an ANN index could replace it unchanged.

pub mod config;
pub mod error;
pub mod indexer;
pub mod record;
pub mod search;
pub mod store;

pub use config::RetrievalConfig;
pub use error::{Result, RetrievalError, StoreError};
pub use indexer::{EventFields, Indexer};
pub use record::{EmbeddingRecord, SourceType};
pub use search::{Retriever, SearchMatch};
pub use store::{MemoryVectorStore, VectorStore};
