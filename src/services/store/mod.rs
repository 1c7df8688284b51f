//! Document store abstraction layer.
//!
//! This module provides a trait-based abstraction over the document store so
//! that loading, index lifecycle, and query logic stay independent of the
//! driver. The one concrete backend talks to Azure Cosmos DB for MongoDB
//! vCore.

mod mongo;

pub use mongo::MongoStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{Document, IndexDescriptor, SearchHit, SimilaritySearch, VectorIndexSpec};

/// Outcome of one unordered bulk insert.
#[derive(Debug, Clone, Default)]
pub struct BulkInsertOutcome {
    /// Documents the store accepted.
    pub inserted: usize,

    /// Documents the store rejected, with their positions in the batch.
    pub failures: Vec<WriteFailure>,
}

/// One rejected document within a bulk insert.
#[derive(Debug, Clone)]
pub struct WriteFailure {
    /// Position of the document within the submitted batch.
    pub index: usize,

    pub message: String,
}

/// Abstract trait for document store operations.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Check if the store is reachable.
    async fn health_check(&self) -> Result<bool, StoreError>;

    /// Count documents in the collection.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Delete every document in the collection. Returns the number removed.
    async fn delete_all(&self) -> Result<u64, StoreError>;

    /// Insert a batch without ordering guarantees: one rejected document
    /// does not block the rest. Per-document rejections come back in the
    /// outcome; an `Err` means the whole batch failed.
    async fn bulk_insert(&self, documents: &[Document]) -> Result<BulkInsertOutcome, StoreError>;

    /// List all indexes on the collection.
    async fn list_indexes(&self) -> Result<Vec<IndexDescriptor>, StoreError>;

    /// Drop one index by name.
    async fn drop_index(&self, name: &str) -> Result<(), StoreError>;

    /// Create a vector index from the spec.
    async fn create_vector_index(&self, spec: &VectorIndexSpec) -> Result<(), StoreError>;

    /// Run a similarity search, returning hits in store order.
    async fn similarity_search(
        &self,
        search: &SimilaritySearch,
    ) -> Result<Vec<SearchHit>, StoreError>;

    /// Get the collection name.
    fn collection(&self) -> &str;
}
