//! Error types for the vector search CLI.

use thiserror::Error;

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {name}: {value}")]
    InvalidVar { name: String, value: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),
}

/// Errors related to reading and writing JSON data files.
#[derive(Debug, Error)]
pub enum DataFileError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParseError(#[from] serde_json::Error),
}

/// Errors related to embedding operations.
///
/// Any failure is fatal to the batch run that hit it; there is no automatic
/// retry, so transient provider errors surface to the caller as-is.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding endpoint: {0}")]
    ConnectionError(String),

    #[error("embedding API error: {0}")]
    ApiError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,

    #[error("embedding batch {batch} failed: {source}")]
    BatchFailed {
        batch: usize,
        #[source]
        source: Box<EmbeddingError>,
    },
}

impl EmbeddingError {
    /// Wraps an error with the 1-based ordinal of the batch that produced it.
    pub fn in_batch(self, batch: usize) -> Self {
        EmbeddingError::BatchFailed {
            batch,
            source: Box::new(self),
        }
    }
}

/// Errors related to document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to document store: {0}")]
    ConnectionError(String),

    #[error("document conversion error: {0}")]
    DocumentError(String),

    #[error("insert error: {0}")]
    InsertError(String),

    #[error("index error: {0}")]
    IndexError(String),

    #[error("search error: {0}")]
    SearchError(String),

    #[error("delete error: {0}")]
    DeleteError(String),

    #[error("command error: {0}")]
    CommandError(String),
}

/// Errors related to vector index lifecycle operations.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("failed to create index {name}: {source}")]
    CreateFailed {
        name: String,
        #[source]
        source: StoreError,
        /// Actionable hint attached when the store rejects the index kind,
        /// e.g. a cluster tier that does not support DiskANN.
        remediation: Option<String>,
    },
}

/// Errors related to search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    #[error("store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data file error: {0}")]
    DataFile(#[from] DataFileError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("search error: {0}")]
    Search(#[from] SearchError),

    #[error("no documents carry a non-empty '{field}' field")]
    NoEligibleDocuments { field: String },

    #[error("no documents were inserted successfully")]
    NoDocumentsInserted,

    #[error("{0}")]
    Other(String),
}
