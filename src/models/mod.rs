mod config;
mod document;
mod index;
mod search;

pub use config::{
    Config, DEFAULT_API_VERSION, DEFAULT_COLLECTION, DEFAULT_DATABASE, DEFAULT_EMBEDDING_MODEL,
    DataConfig, EmbeddingConfig, ENV_CONNECTION_STRING, ENV_EMBEDDING_ENDPOINT, ENV_EMBEDDING_KEY,
    FieldsConfig, IndexConfig, LoadConfig, SearchConfig, Secrets, StoreConfig,
};
pub use document::Document;
pub use index::{
    DiskAnnParams, HnswParams, IndexAlgorithm, IndexDescriptor, IndexKind, IvfParams, Similarity,
    VECTOR_KEY_MARKER, VectorIndexSpec,
};
pub use search::{OutputFormat, QueryRequest, SearchHit, SearchResults, SimilaritySearch};
