//! Vector index specifications and descriptors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Marker value the store puts in an index key to flag a vector index.
pub const VECTOR_KEY_MARKER: &str = "cosmosSearch";

/// Distance metric used by the vector index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Similarity {
    /// Cosine similarity
    #[default]
    Cos,
    /// Euclidean distance
    L2,
    /// Inner product
    Ip,
}

impl Similarity {
    /// Spelling the store expects in index options.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Similarity::Cos => "COS",
            Similarity::L2 => "L2",
            Similarity::Ip => "IP",
        }
    }
}

impl std::str::FromStr for Similarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cos" | "cosine" => Ok(Similarity::Cos),
            "l2" | "euclidean" => Ok(Similarity::L2),
            "ip" | "innerproduct" => Ok(Similarity::Ip),
            _ => Err(format!("unknown similarity metric: {}", s)),
        }
    }
}

impl std::fmt::Display for Similarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// Index algorithm selector, as typed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Hnsw,
    DiskAnn,
    Ivf,
}

impl std::str::FromStr for IndexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hnsw" => Ok(IndexKind::Hnsw),
            "diskann" => Ok(IndexKind::DiskAnn),
            "ivf" => Ok(IndexKind::Ivf),
            _ => Err(format!("unknown index algorithm: {}", s)),
        }
    }
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexKind::Hnsw => write!(f, "hnsw"),
            IndexKind::DiskAnn => write!(f, "diskann"),
            IndexKind::Ivf => write!(f, "ivf"),
        }
    }
}

/// HNSW graph parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HnswParams {
    /// Maximum connections per graph node.
    #[serde(default = "default_m")]
    pub m: u32,

    /// Candidate list size during construction.
    #[serde(default = "default_ef_construction")]
    pub ef_construction: u32,
}

fn default_m() -> u32 {
    16
}

fn default_ef_construction() -> u32 {
    64
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: default_m(),
            ef_construction: default_ef_construction(),
        }
    }
}

/// DiskANN graph parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskAnnParams {
    /// Maximum edges per graph node.
    #[serde(default = "default_max_degree")]
    pub max_degree: u32,

    /// Candidate list size during build.
    #[serde(default = "default_l_build")]
    pub l_build: u32,
}

fn default_max_degree() -> u32 {
    20
}

fn default_l_build() -> u32 {
    10
}

impl Default for DiskAnnParams {
    fn default() -> Self {
        Self {
            max_degree: default_max_degree(),
            l_build: default_l_build(),
        }
    }
}

/// IVF clustering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IvfParams {
    /// Number of inverted lists (clusters).
    #[serde(default = "default_num_lists")]
    pub num_lists: u32,
}

fn default_num_lists() -> u32 {
    10
}

impl Default for IvfParams {
    fn default() -> Self {
        Self {
            num_lists: default_num_lists(),
        }
    }
}

/// Algorithm choice with its tuning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexAlgorithm {
    Hnsw(HnswParams),
    DiskAnn(DiskAnnParams),
    Ivf(IvfParams),
}

impl IndexAlgorithm {
    pub fn kind(&self) -> IndexKind {
        match self {
            IndexAlgorithm::Hnsw(_) => IndexKind::Hnsw,
            IndexAlgorithm::DiskAnn(_) => IndexKind::DiskAnn,
            IndexAlgorithm::Ivf(_) => IndexKind::Ivf,
        }
    }

    /// Index kind name the store expects in `cosmosSearchOptions`.
    pub fn wire_kind(&self) -> &'static str {
        match self {
            IndexAlgorithm::Hnsw(_) => "vector-hnsw",
            IndexAlgorithm::DiskAnn(_) => "vector-diskann",
            IndexAlgorithm::Ivf(_) => "vector-ivf",
        }
    }
}

/// Everything needed to create one vector index on one field.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndexSpec {
    /// Document field holding the embedding vector.
    pub field: String,

    /// Embedding dimensionality.
    pub dimensions: u32,

    pub similarity: Similarity,

    pub algorithm: IndexAlgorithm,
}

impl VectorIndexSpec {
    pub fn new(
        field: impl Into<String>,
        dimensions: u32,
        similarity: Similarity,
        algorithm: IndexAlgorithm,
    ) -> Self {
        Self {
            field: field.into(),
            dimensions,
            similarity,
            algorithm,
        }
    }

    /// Deterministic index name, one per (algorithm, field) pair.
    pub fn index_name(&self) -> String {
        format!("{}_index_{}", self.algorithm.kind(), self.field)
    }
}

/// An index as reported by the store's listing command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,

    /// Key map: indexed field to index type marker.
    pub key: Map<String, Value>,

    /// Full descriptor as returned by the store, for display.
    pub raw: Value,
}

impl IndexDescriptor {
    /// Whether this index is a vector index over the given field.
    pub fn marks_vector_field(&self, field: &str) -> bool {
        matches!(self.key.get(field), Some(Value::String(s)) if s == VECTOR_KEY_MARKER)
    }

    /// Whether this index is a vector index over any field.
    pub fn is_vector_index(&self) -> bool {
        self.key
            .values()
            .any(|v| matches!(v, Value::String(s) if s == VECTOR_KEY_MARKER))
    }

    /// Vector-search options attached by the store, when present. The
    /// listing command reports them under `vectorSearchConfiguration`
    /// even though creation sends `cosmosSearchOptions`.
    pub fn vector_options(&self) -> Option<&Value> {
        self.raw
            .get("vectorSearchConfiguration")
            .or_else(|| self.raw.get("cosmosSearchOptions"))
    }
}
