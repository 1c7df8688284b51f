//! Batch enrichment of documents with embedding vectors.

use indicatif::ProgressBar;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::error::EmbeddingError;
use crate::models::{Config, Document};
use crate::services::Embedder;

/// Field names and pacing for a batch embedding run.
#[derive(Debug, Clone)]
pub struct BatcherOptions {
    /// Source field whose text gets embedded.
    pub text_field: String,

    /// Target field that receives the vector.
    pub vector_field: String,

    /// Field used to identify skipped documents.
    pub id_field: String,

    pub batch_size: usize,

    /// Pause between batches, skipped after the last one.
    pub batch_pause: Duration,
}

impl BatcherOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            text_field: config.fields.text.clone(),
            vector_field: config.fields.vector.clone(),
            id_field: config.fields.id.clone(),
            batch_size: config.embedding.batch_size as usize,
            batch_pause: Duration::from_millis(config.embedding.batch_pause_ms),
        }
    }
}

/// Outcome of one embedding run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmbedReport {
    /// Documents examined.
    pub total: usize,

    /// Documents that received a vector.
    pub embedded: usize,

    /// Ids of documents skipped for missing or empty text.
    pub skipped: Vec<String>,
}

/// Enriches documents in place by embedding their text field in fixed-size
/// batches. Documents without usable text are skipped and reported; a
/// failed provider call aborts the run, leaving earlier batches enriched.
pub struct EmbeddingBatcher {
    embedder: Arc<dyn Embedder>,
    options: BatcherOptions,
}

impl EmbeddingBatcher {
    pub fn new(embedder: Arc<dyn Embedder>, options: BatcherOptions) -> Self {
        Self { embedder, options }
    }

    /// Embed every eligible document. The input is processed as consecutive
    /// fixed-size batches; within a batch, only documents with non-empty
    /// text are sent to the provider, and the returned vectors map back onto
    /// those documents by position. There is no retry: the first provider
    /// failure is returned, tagged with the 1-based ordinal of the batch
    /// that failed.
    pub async fn embed_all(
        &self,
        documents: &mut [Document],
        progress: Option<&ProgressBar>,
    ) -> Result<EmbedReport, EmbeddingError> {
        let mut report = EmbedReport {
            total: documents.len(),
            ..Default::default()
        };

        let batch_size = self.options.batch_size.max(1);
        let batch_count = documents.len().div_ceil(batch_size);

        for (ordinal, batch) in documents.chunks_mut(batch_size).enumerate() {
            let mut texts = Vec::new();
            let mut positions = Vec::new();
            for (position, doc) in batch.iter().enumerate() {
                match doc.text(&self.options.text_field) {
                    Some(text) => {
                        texts.push(text.to_string());
                        positions.push(position);
                    }
                    None => {
                        report.skipped.push(doc.display_id(&self.options.id_field));
                        if let Some(pb) = progress {
                            pb.inc(1);
                        }
                    }
                }
            }

            if !texts.is_empty() {
                let vectors = self
                    .embedder
                    .embed(&texts)
                    .await
                    .map_err(|e| e.in_batch(ordinal + 1))?;

                for (position, vector) in positions.into_iter().zip(vectors) {
                    batch[position].set_vector(&self.options.vector_field, vector);
                    report.embedded += 1;
                    if let Some(pb) = progress {
                        pb.inc(1);
                    }
                }
            }

            if ordinal + 1 < batch_count {
                tokio::time::sleep(self.options.batch_pause).await;
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct MockEmbedder {
        calls: Mutex<Vec<Vec<String>>>,
        fail_on_call: Option<usize>,
    }

    impl MockEmbedder {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on_call: None,
            }
        }

        fn failing_on(call: usize) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on_call: Some(call),
            }
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Embedder for MockEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(texts.to_vec());
            if self.fail_on_call == Some(calls.len()) {
                return Err(EmbeddingError::Timeout);
            }
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }

        fn model(&self) -> &str {
            "mock"
        }
    }

    fn options(batch_size: usize) -> BatcherOptions {
        BatcherOptions {
            text_field: "Description".to_string(),
            vector_field: "DescriptionVector".to_string(),
            id_field: "HotelId".to_string(),
            batch_size,
            batch_pause: Duration::ZERO,
        }
    }

    fn docs(values: Vec<serde_json::Value>) -> Vec<Document> {
        values
            .into_iter()
            .map(|v| serde_json::from_value(v).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_batches_partition_input() {
        let embedder = Arc::new(MockEmbedder::new());
        let batcher = EmbeddingBatcher::new(embedder.clone(), options(4));

        let mut documents = docs(
            (1..=10)
                .map(|i| json!({"HotelId": i.to_string(), "Description": "d".repeat(i)}))
                .collect(),
        );

        let report = batcher.embed_all(&mut documents, None).await.unwrap();

        assert_eq!(report.total, 10);
        assert_eq!(report.embedded, 10);
        assert!(report.skipped.is_empty());

        let calls = embedder.calls();
        let shape: Vec<usize> = calls.iter().map(Vec::len).collect();
        assert_eq!(shape, vec![4, 4, 2]);
        assert_eq!(calls[0][0], "d");
        assert_eq!(calls[2][1], "d".repeat(10));
    }

    #[tokio::test]
    async fn test_vectors_written_positionally() {
        let embedder = Arc::new(MockEmbedder::new());
        let batcher = EmbeddingBatcher::new(embedder, options(2));

        let mut documents = docs(vec![
            json!({"HotelId": "1", "Description": "a"}),
            json!({"HotelId": "2", "Description": "bb"}),
            json!({"HotelId": "3", "Description": "ccc"}),
        ]);

        batcher.embed_all(&mut documents, None).await.unwrap();

        assert_eq!(documents[0].vector("DescriptionVector"), Some(vec![1.0]));
        assert_eq!(documents[1].vector("DescriptionVector"), Some(vec![2.0]));
        assert_eq!(documents[2].vector("DescriptionVector"), Some(vec![3.0]));
    }

    #[tokio::test]
    async fn test_skips_documents_without_text() {
        let embedder = Arc::new(MockEmbedder::new());
        let batcher = EmbeddingBatcher::new(embedder.clone(), options(10));

        let mut documents = docs(vec![
            json!({"HotelId": "1", "Description": "fine"}),
            json!({"HotelId": "2", "Description": ""}),
            json!({"HotelId": "3"}),
            json!({"HotelId": "4", "Description": 99}),
            json!({"Description": ""}),
        ]);

        let report = batcher.embed_all(&mut documents, None).await.unwrap();

        assert_eq!(report.total, 5);
        assert_eq!(report.embedded, 1);
        assert_eq!(report.skipped, vec!["2", "3", "4", "unknown"]);

        // Only the eligible text was sent to the provider.
        assert_eq!(embedder.calls(), vec![vec!["fine".to_string()]]);

        // Skipped documents were not touched.
        assert!(documents[0].contains("DescriptionVector"));
        assert!(!documents[1].contains("DescriptionVector"));
        assert!(!documents[2].contains("DescriptionVector"));
    }

    #[tokio::test]
    async fn test_skips_shrink_the_batch_call() {
        let embedder = Arc::new(MockEmbedder::new());
        let batcher = EmbeddingBatcher::new(embedder.clone(), options(2));

        // Batches are cut over the whole input, so the skip in the first
        // batch does not pull a later document forward.
        let mut documents = docs(vec![
            json!({"HotelId": "1", "Description": "a"}),
            json!({"HotelId": "2"}),
            json!({"HotelId": "3", "Description": "ccc"}),
            json!({"HotelId": "4", "Description": "dddd"}),
            json!({"HotelId": "5", "Description": "eeeee"}),
        ]);

        let report = batcher.embed_all(&mut documents, None).await.unwrap();

        assert_eq!(report.embedded, 4);
        assert_eq!(report.skipped, vec!["2"]);
        assert_eq!(
            embedder.calls(),
            vec![
                vec!["a".to_string()],
                vec!["ccc".to_string(), "dddd".to_string()],
                vec!["eeeee".to_string()],
            ]
        );
    }

    #[tokio::test]
    async fn test_fully_skipped_batch_makes_no_provider_call() {
        let embedder = Arc::new(MockEmbedder::new());
        let batcher = EmbeddingBatcher::new(embedder.clone(), options(2));

        let mut documents = docs(vec![
            json!({"HotelId": "1"}),
            json!({"HotelId": "2"}),
            json!({"HotelId": "3", "Description": "text"}),
        ]);

        let report = batcher.embed_all(&mut documents, None).await.unwrap();

        assert_eq!(report.embedded, 1);
        assert_eq!(report.skipped, vec!["1", "2"]);
        assert_eq!(embedder.calls(), vec![vec!["text".to_string()]]);
    }

    #[tokio::test]
    async fn test_failure_carries_batch_ordinal_and_stops() {
        let embedder = Arc::new(MockEmbedder::failing_on(2));
        let batcher = EmbeddingBatcher::new(embedder.clone(), options(2));

        let mut documents = docs(
            (1..=6)
                .map(|i| json!({"HotelId": i.to_string(), "Description": "d".repeat(i)}))
                .collect(),
        );

        let err = batcher.embed_all(&mut documents, None).await.unwrap_err();
        match err {
            EmbeddingError::BatchFailed { batch, source } => {
                assert_eq!(batch, 2);
                assert!(matches!(*source, EmbeddingError::Timeout));
            }
            other => panic!("unexpected error: {other}"),
        }

        // The failing batch ended the run; batch three was never sent.
        assert_eq!(embedder.calls().len(), 2);

        // Earlier batches keep their vectors.
        assert!(documents[0].contains("DescriptionVector"));
        assert!(documents[1].contains("DescriptionVector"));
        assert!(!documents[2].contains("DescriptionVector"));
        assert!(!documents[5].contains("DescriptionVector"));
    }

    #[tokio::test]
    async fn test_zero_batch_size_treated_as_one() {
        let embedder = Arc::new(MockEmbedder::new());
        let batcher = EmbeddingBatcher::new(embedder.clone(), options(0));

        let mut documents = docs(vec![
            json!({"HotelId": "1", "Description": "a"}),
            json!({"HotelId": "2", "Description": "bb"}),
        ]);

        let report = batcher.embed_all(&mut documents, None).await.unwrap();
        assert_eq!(report.embedded, 2);
        assert_eq!(embedder.calls().len(), 2);
    }
}
