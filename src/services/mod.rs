//! Service layer: embedding, loading, index lifecycle, and queries.

pub mod batcher;
pub mod embedding;
pub mod index_manager;
pub mod loader;
pub mod query;
pub mod store;

pub use batcher::{BatcherOptions, EmbedReport, EmbeddingBatcher};
pub use embedding::{AzureOpenAiEmbedder, Embedder};
pub use index_manager::{IndexManager, ReplaceOutcome, settle_delay};
pub use loader::{BulkLoader, InsertStats, LoaderOptions};
pub use query::QueryExecutor;
pub use store::{BulkInsertOutcome, DocumentStore, MongoStore, WriteFailure};
