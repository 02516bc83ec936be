//! Vector storage.
//!
//! The store is a keyed mapping from `(source_type, source_id, chunk_index)`
//! to embedding records. Scans return records in key order so that ranking
//! tie-breaks are deterministic.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::record::{EmbeddingRecord, SourceType};

/// Storage contract for embedding records.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Upsert one chunk row; idempotent on repeated calls with the same key.
    async fn put(&self, record: EmbeddingRecord) -> Result<()>;

    /// Remove every chunk belonging to `source_id`.
    ///
    /// Returns the number removed; 0 (not an error) when nothing existed.
    async fn delete_by_source(&self, source_id: &str) -> Result<usize>;

    /// Replace every chunk for `source_id` with `records` as one logical
    /// unit: two concurrent revectorizations of the same source must not
    /// interleave deletes and inserts.
    async fn replace_source(
        &self,
        source_id: &str,
        records: Vec<EmbeddingRecord>,
    ) -> Result<usize>;

    /// Return every stored record, optionally filtered by source type.
    ///
    /// Full scan by design; no pagination at organizer scale.
    async fn scan(&self, source_types: Option<&[SourceType]>) -> Result<Vec<EmbeddingRecord>>;
}

type RecordKey = (SourceType, String, u32);

/// In-memory vector store.
///
/// Reads run concurrently with unrelated writes; a query started just before
/// a revectorization may or may not see the new chunks.
pub struct MemoryVectorStore {
    /// Expected vector dimension; changing it invalidates all prior vectors.
    dimension: usize,

    /// Stored rows, keyed and ordered by (source_type, source_id, chunk_index).
    rows: RwLock<std::collections::BTreeMap<RecordKey, EmbeddingRecord>>,

    /// Per-source locks serializing delete + re-put cycles.
    source_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MemoryVectorStore {
    /// Create a store for vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            rows: RwLock::new(std::collections::BTreeMap::new()),
            source_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Check whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    async fn source_lock(&self, source_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.source_locks.lock().await;
        locks
            .entry(source_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn check_dimension(&self, record: &EmbeddingRecord) -> Result<()> {
        if record.vector.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: record.vector.len(),
            }
            .into());
        }
        Ok(())
    }

    async fn delete_rows(&self, source_id: &str) -> usize {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|(_, sid, _), _| sid != source_id);
        before - rows.len()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn put(&self, record: EmbeddingRecord) -> Result<()> {
        self.check_dimension(&record)?;
        let key = record.key();
        self.rows.write().await.insert(key, record);
        Ok(())
    }

    async fn delete_by_source(&self, source_id: &str) -> Result<usize> {
        let lock = self.source_lock(source_id).await;
        let _guard = lock.lock().await;

        let removed = self.delete_rows(source_id).await;
        debug!("Deleted {removed} embeddings for source {source_id}");
        Ok(removed)
    }

    async fn replace_source(
        &self,
        source_id: &str,
        records: Vec<EmbeddingRecord>,
    ) -> Result<usize> {
        for record in &records {
            self.check_dimension(record)?;
        }

        let lock = self.source_lock(source_id).await;
        let _guard = lock.lock().await;

        self.delete_rows(source_id).await;
        let count = records.len();
        let mut rows = self.rows.write().await;
        for record in records {
            rows.insert(record.key(), record);
        }

        debug!("Replaced source {source_id} with {count} chunks");
        Ok(count)
    }

    async fn scan(&self, source_types: Option<&[SourceType]>) -> Result<Vec<EmbeddingRecord>> {
        let rows = self.rows.read().await;
        let records = rows
            .values()
            .filter(|r| source_types.is_none_or(|types| types.contains(&r.source_type)))
            .cloned()
            .collect();
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(source_type: SourceType, source_id: &str, chunk_index: u32) -> EmbeddingRecord {
        EmbeddingRecord::new(
            source_type,
            source_id,
            chunk_index,
            format!("chunk {chunk_index} of {source_id}"),
            vec![1.0, 0.0, 0.0],
            serde_json::json!({}),
        )
    }

    #[tokio::test]
    async fn test_put_is_idempotent_on_key() {
        let store = MemoryVectorStore::new(3);
        store.put(record(SourceType::Document, "doc-1", 0)).await.unwrap();
        store.put(record(SourceType::Document, "doc-1", 0)).await.unwrap();

        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_by_source_idempotent() {
        let store = MemoryVectorStore::new(3);
        store.put(record(SourceType::Document, "doc-1", 0)).await.unwrap();
        store.put(record(SourceType::Document, "doc-1", 1)).await.unwrap();
        store.put(record(SourceType::Event, "evt-1", 0)).await.unwrap();

        assert_eq!(store.delete_by_source("doc-1").await.unwrap(), 2);
        assert_eq!(store.delete_by_source("doc-1").await.unwrap(), 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_scan_filters_by_source_type() {
        let store = MemoryVectorStore::new(3);
        store.put(record(SourceType::Document, "doc-1", 0)).await.unwrap();
        store.put(record(SourceType::Event, "evt-1", 0)).await.unwrap();
        store.put(record(SourceType::Conversation, "conv-1", 0)).await.unwrap();

        let all = store.scan(None).await.unwrap();
        assert_eq!(all.len(), 3);

        let events = store.scan(Some(&[SourceType::Event])).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source_id, "evt-1");

        let mixed = store
            .scan(Some(&[SourceType::Document, SourceType::Event]))
            .await
            .unwrap();
        assert_eq!(mixed.len(), 2);
    }

    #[tokio::test]
    async fn test_scan_order_is_deterministic() {
        let store = MemoryVectorStore::new(3);
        store.put(record(SourceType::Event, "b", 0)).await.unwrap();
        store.put(record(SourceType::Document, "a", 1)).await.unwrap();
        store.put(record(SourceType::Document, "a", 0)).await.unwrap();

        let keys: Vec<_> = store
            .scan(None)
            .await
            .unwrap()
            .iter()
            .map(EmbeddingRecord::key)
            .collect();
        assert_eq!(
            keys,
            vec![
                (SourceType::Document, "a".to_string(), 0),
                (SourceType::Document, "a".to_string(), 1),
                (SourceType::Event, "b".to_string(), 0),
            ]
        );
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let store = MemoryVectorStore::new(4);
        let result = store.put(record(SourceType::Document, "doc-1", 0)).await;
        assert!(matches!(
            result,
            Err(crate::RetrievalError::Store(StoreError::DimensionMismatch {
                expected: 4,
                actual: 3
            }))
        ));
    }

    #[tokio::test]
    async fn test_replace_source_swaps_all_chunks() {
        let store = MemoryVectorStore::new(3);
        store.put(record(SourceType::Document, "doc-1", 0)).await.unwrap();
        store.put(record(SourceType::Document, "doc-1", 1)).await.unwrap();
        store.put(record(SourceType::Document, "doc-1", 2)).await.unwrap();

        let replaced = store
            .replace_source("doc-1", vec![record(SourceType::Document, "doc-1", 0)])
            .await
            .unwrap();

        assert_eq!(replaced, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_replace_leaves_one_complete_set() {
        let store = Arc::new(MemoryVectorStore::new(3));

        let batch = |marker: &str, n: u32| -> Vec<EmbeddingRecord> {
            (0..n)
                .map(|i| {
                    EmbeddingRecord::new(
                        SourceType::Document,
                        "doc-1",
                        i,
                        format!("{marker} chunk {i}"),
                        vec![0.0, 1.0, 0.0],
                        serde_json::json!({ "batch": marker }),
                    )
                })
                .collect()
        };

        let a = {
            let store = store.clone();
            let records = batch("a", 2);
            tokio::spawn(async move { store.replace_source("doc-1", records).await })
        };
        let b = {
            let store = store.clone();
            let records = batch("b", 3);
            tokio::spawn(async move { store.replace_source("doc-1", records).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        // Whichever replacement ran last, the surviving rows must all come
        // from the same batch.
        let rows = store.scan(None).await.unwrap();
        let batches: std::collections::HashSet<String> = rows
            .iter()
            .map(|r| r.metadata["batch"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(batches.len(), 1);
        let expected = if batches.contains("a") { 2 } else { 3 };
        assert_eq!(rows.len(), expected);
    }
}
