//! Query execution: embed the query text, search the store.

use std::sync::Arc;
use std::time::Instant;

use crate::error::SearchError;
use crate::models::{QueryRequest, SearchResults, SimilaritySearch};
use crate::services::embedding::Embedder;
use crate::services::store::DocumentStore;

/// Runs one query end to end against live collaborators.
pub struct QueryExecutor {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn DocumentStore>,
}

impl QueryExecutor {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn DocumentStore>) -> Self {
        Self { embedder, store }
    }

    /// Embed the query text and run the similarity search. Results come
    /// back in store order, which is already most-similar first.
    ///
    /// Note that `probes` on the request is informational only. The
    /// store's search command has no per-query probe count, so it never
    /// reaches the wire.
    pub async fn search(&self, request: &QueryRequest) -> Result<SearchResults, SearchError> {
        if request.query.trim().is_empty() {
            return Err(SearchError::InvalidQuery(
                "query text is empty".to_string(),
            ));
        }

        let started = Instant::now();
        let vector = self.embedder.embed_query(&request.query).await?;

        let hits = self
            .store
            .similarity_search(&SimilaritySearch {
                vector,
                field: request.field.clone(),
                limit: request.limit,
                ef_search: request.ef_search,
                projection: request.projection.clone(),
            })
            .await?;

        Ok(SearchResults::new(
            request.query.clone(),
            hits,
            started.elapsed().as_millis() as u64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EmbeddingError, StoreError};
    use crate::models::{Document, IndexDescriptor, SearchHit, VectorIndexSpec};
    use crate::services::store::BulkInsertOutcome;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedEmbedder {
        vector: Vec<f32>,
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl FixedEmbedder {
        fn returning(vector: Vec<f32>) -> Self {
            Self {
                vector,
                calls: Mutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.calls.lock().unwrap().extend(texts.iter().cloned());
            if self.fail {
                return Err(EmbeddingError::ConnectionError("offline".to_string()));
            }
            Ok(texts.iter().map(|_| self.vector.clone()).collect())
        }

        fn model(&self) -> &str {
            "test-model"
        }
    }

    struct SearchingStore {
        hits: Vec<SearchHit>,
        seen: Mutex<Vec<SimilaritySearch>>,
        fail: bool,
    }

    impl SearchingStore {
        fn returning(hits: Vec<SearchHit>) -> Self {
            Self {
                hits,
                seen: Mutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl DocumentStore for SearchingStore {
        async fn health_check(&self) -> Result<bool, StoreError> {
            unreachable!()
        }

        async fn count(&self) -> Result<u64, StoreError> {
            unreachable!()
        }

        async fn delete_all(&self) -> Result<u64, StoreError> {
            unreachable!()
        }

        async fn bulk_insert(
            &self,
            _documents: &[Document],
        ) -> Result<BulkInsertOutcome, StoreError> {
            unreachable!()
        }

        async fn list_indexes(&self) -> Result<Vec<IndexDescriptor>, StoreError> {
            unreachable!()
        }

        async fn drop_index(&self, _name: &str) -> Result<(), StoreError> {
            unreachable!()
        }

        async fn create_vector_index(&self, _spec: &VectorIndexSpec) -> Result<(), StoreError> {
            unreachable!()
        }

        async fn similarity_search(
            &self,
            search: &SimilaritySearch,
        ) -> Result<Vec<SearchHit>, StoreError> {
            self.seen.lock().unwrap().push(search.clone());
            if self.fail {
                return Err(StoreError::SearchError("aggregate failed".to_string()));
            }
            Ok(self.hits.clone())
        }

        fn collection(&self) -> &str {
            "test"
        }
    }

    fn hit(id: &str, score: f64) -> SearchHit {
        let mut document = Document::new();
        document.insert("HotelId", id);
        SearchHit { document, score }
    }

    #[tokio::test]
    async fn test_search_forwards_request_parameters() {
        let embedder = Arc::new(FixedEmbedder::returning(vec![0.5, 0.25]));
        let store = Arc::new(SearchingStore::returning(vec![hit("1", 0.9)]));
        let executor = QueryExecutor::new(embedder.clone(), store.clone());

        let request = QueryRequest::new("hotel near airport", "DescriptionVector")
            .with_limit(3)
            .with_ef_search(16)
            .with_probes(10)
            .with_projection(vec!["HotelName".to_string()]);
        let results = executor.search(&request).await.unwrap();

        assert_eq!(results.query, "hotel near airport");
        assert_eq!(results.len(), 1);
        assert_eq!(
            *embedder.calls.lock().unwrap(),
            vec!["hotel near airport".to_string()]
        );

        // Probes stay out of the store request; everything else forwards.
        let seen = store.seen.lock().unwrap();
        assert_eq!(
            seen[0],
            SimilaritySearch {
                vector: vec![0.5, 0.25],
                field: "DescriptionVector".to_string(),
                limit: 3,
                ef_search: Some(16),
                projection: Some(vec!["HotelName".to_string()]),
            }
        );
    }

    #[tokio::test]
    async fn test_results_keep_store_order() {
        let store = SearchingStore::returning(vec![
            hit("b", 0.90),
            hit("a", 0.95),
            hit("c", 0.10),
        ]);
        let executor = QueryExecutor::new(
            Arc::new(FixedEmbedder::returning(vec![1.0])),
            Arc::new(store),
        );

        let results = executor
            .search(&QueryRequest::new("anything", "DescriptionVector"))
            .await
            .unwrap();

        let ids: Vec<String> = results
            .results
            .iter()
            .map(|h| h.document.display_id("HotelId"))
            .collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected_before_embedding() {
        let embedder = Arc::new(FixedEmbedder::returning(vec![1.0]));
        let executor = QueryExecutor::new(
            embedder.clone(),
            Arc::new(SearchingStore::returning(Vec::new())),
        );

        let err = executor
            .search(&QueryRequest::new("   ", "DescriptionVector"))
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::InvalidQuery(_)));
        assert!(embedder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let mut embedder = FixedEmbedder::returning(vec![1.0]);
        embedder.fail = true;
        let executor = QueryExecutor::new(
            Arc::new(embedder),
            Arc::new(SearchingStore::returning(Vec::new())),
        );

        let err = executor
            .search(&QueryRequest::new("query", "DescriptionVector"))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::EmbeddingError(_)));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut store = SearchingStore::returning(Vec::new());
        store.fail = true;
        let executor = QueryExecutor::new(
            Arc::new(FixedEmbedder::returning(vec![1.0])),
            Arc::new(store),
        );

        let err = executor
            .search(&QueryRequest::new("query", "DescriptionVector"))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::StoreError(_)));
    }
}
