use serde::{Deserialize, Serialize};

use super::index::{DiskAnnParams, HnswParams, IvfParams, Similarity};
use super::search::OutputFormat;
use crate::error::ConfigError;

pub const DEFAULT_DATABASE: &str = "vectorSearchDB";
pub const DEFAULT_COLLECTION: &str = "vectorSearchCollection";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_API_VERSION: &str = "2024-02-01";

/// Environment variables understood on top of the config file. The names
/// match the deployment scripts that provision the demo dataset.
pub const ENV_CONNECTION_STRING: &str = "MONGO_CONNECTION_STRING";
pub const ENV_EMBEDDING_ENDPOINT: &str = "AZURE_OPENAI_EMBEDDING_ENDPOINT";
pub const ENV_EMBEDDING_KEY: &str = "AZURE_OPENAI_EMBEDDING_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub load: LoadConfig,

    #[serde(default)]
    pub fields: FieldsConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub data: DataConfig,
}

impl Config {
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join("vsearch").join("config.toml"))
    }

    /// Loads the config file if present, then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = Self::config_path()
            && path.exists()
        {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str::<Config>(&content)?
        } else {
            Self::default()
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            ConfigError::PathError("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Applies overrides from an environment lookup. The lookup is injected
    /// so tests can drive it without touching the process environment.
    pub fn apply_overrides(
        &mut self,
        get: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = get("AZURE_OPENAI_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Some(v) = get("AZURE_OPENAI_EMBEDDING_API_VERSION") {
            self.embedding.api_version = v;
        }
        if let Some(v) = get("EMBEDDING_DIMENSIONS") {
            self.embedding.dimensions = parse_var("EMBEDDING_DIMENSIONS", v)?;
        }
        if let Some(v) = get("EMBEDDING_SIZE_BATCH") {
            self.embedding.batch_size = parse_var("EMBEDDING_SIZE_BATCH", v)?;
        }
        if let Some(v) = get("LOAD_SIZE_BATCH") {
            self.load.batch_size = parse_var("LOAD_SIZE_BATCH", v)?;
        }
        if let Some(v) = get("FIELD_TO_EMBED") {
            self.fields.text = v;
        }
        if let Some(v) = get("EMBEDDED_FIELD") {
            self.fields.vector = v;
        }
        if let Some(v) = get("DATA_FILE_WITHOUT_VECTORS") {
            self.data.input = v;
        }
        if let Some(v) = get("DATA_FILE_WITH_VECTORS") {
            self.data.output = v;
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidVar {
        name: name.to_string(),
        value,
    })
}

/// Credentials are read from the environment only, never from the config
/// file, and are required before any network call is attempted.
#[derive(Clone)]
pub struct Secrets {
    pub connection_string: String,
    pub embedding_endpoint: String,
    pub embedding_key: String,
}

impl Secrets {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            connection_string: require_var(ENV_CONNECTION_STRING)?,
            embedding_endpoint: require_var(ENV_EMBEDDING_ENDPOINT)?,
            embedding_key: require_var(ENV_EMBEDDING_KEY)?,
        })
    }
}

fn require_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingVar(name.to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            collection: default_collection(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: u32,

    #[serde(default = "default_embed_batch_size")]
    pub batch_size: u32,

    #[serde(default = "default_embed_pause_ms")]
    pub batch_pause_ms: u64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_dimensions() -> u32 {
    1536
}

fn default_embed_batch_size() -> u32 {
    16
}

fn default_embed_pause_ms() -> u64 {
    1000
}

fn default_timeout() -> u64 {
    120
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_version: default_api_version(),
            dimensions: default_dimensions(),
            batch_size: default_embed_batch_size(),
            batch_pause_ms: default_embed_pause_ms(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    #[serde(default = "default_load_batch_size")]
    pub batch_size: u32,

    #[serde(default = "default_load_pause_ms")]
    pub batch_pause_ms: u64,
}

fn default_load_batch_size() -> u32 {
    100
}

fn default_load_pause_ms() -> u64 {
    100
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            batch_size: default_load_batch_size(),
            batch_pause_ms: default_load_pause_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldsConfig {
    /// Source field whose text gets embedded.
    #[serde(default = "default_text_field")]
    pub text: String,

    /// Target field that receives the embedding vector.
    #[serde(default = "default_vector_field")]
    pub vector: String,

    /// Field used to identify documents in skip reports and previews.
    #[serde(default = "default_id_field")]
    pub id: String,
}

fn default_text_field() -> String {
    "Description".to_string()
}

fn default_vector_field() -> String {
    "DescriptionVector".to_string()
}

fn default_id_field() -> String {
    "HotelId".to_string()
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            text: default_text_field(),
            vector: default_vector_field(),
            id: default_id_field(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IndexConfig {
    #[serde(default)]
    pub similarity: Similarity,

    #[serde(default)]
    pub hnsw: HnswParams,

    #[serde(default)]
    pub diskann: DiskAnnParams,

    #[serde(default)]
    pub ivf: IvfParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    #[serde(default)]
    pub default_format: OutputFormat,

    #[serde(default)]
    pub ef_search: Option<u32>,

    #[serde(default)]
    pub probes: Option<u32>,

    /// When set, results are projected down to these fields; otherwise the
    /// whole document comes back.
    #[serde(default)]
    pub default_fields: Option<Vec<String>>,
}

fn default_limit() -> u32 {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            default_format: OutputFormat::Text,
            ef_search: None,
            probes: None,
            default_fields: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Source documents without vectors.
    #[serde(default = "default_input_file")]
    pub input: String,

    /// Enriched documents ready for loading.
    #[serde(default = "default_output_file")]
    pub output: String,
}

fn default_input_file() -> String {
    "data/HotelsData_toCosmosDB_Vector.json".to_string()
}

fn default_output_file() -> String {
    "data/HotelsData_with_vectors.json".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            input: default_input_file(),
            output: default_output_file(),
        }
    }
}
