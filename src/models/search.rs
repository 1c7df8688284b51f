//! Search-related models for queries and results.

use serde::{Deserialize, Serialize};

use super::document::Document;

/// Output format for search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
    /// Documentation-friendly Markdown format
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// User's search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Natural language query text
    pub query: String,

    /// Vector field to search against
    pub field: String,

    /// Maximum results to return
    pub limit: u32,

    /// HNSW candidate list size at query time
    pub ef_search: Option<u32>,

    /// IVF clusters to inspect. Reported in output for context; the store
    /// offers no per-query probe setting, so it never reaches the wire.
    pub probes: Option<u32>,

    /// When set, results carry only these fields plus the score
    pub projection: Option<Vec<String>>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            field: field.into(),
            limit: 5,
            ef_search: None,
            probes: None,
            projection: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_ef_search(mut self, ef_search: u32) -> Self {
        self.ef_search = Some(ef_search);
        self
    }

    pub fn with_probes(mut self, probes: u32) -> Self {
        self.probes = Some(probes);
        self
    }

    pub fn with_projection(mut self, fields: Vec<String>) -> Self {
        self.projection = Some(fields);
        self
    }
}

/// Store-level similarity search, issued after the query text is embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilaritySearch {
    pub vector: Vec<f32>,

    /// Vector field the index covers
    pub field: String,

    pub limit: u32,

    pub ef_search: Option<u32>,

    pub projection: Option<Vec<String>>,
}

/// A single search result, in the order the store returned it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub document: Document,

    /// Similarity score reported by the store
    pub score: f64,
}

/// Collection of search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// Query that was executed
    pub query: String,

    /// Matching results
    pub results: Vec<SearchHit>,

    /// Query execution time in milliseconds
    pub duration_ms: u64,
}

impl SearchResults {
    /// Create a new search results container.
    pub fn new(query: String, results: Vec<SearchHit>, duration_ms: u64) -> Self {
        Self {
            query,
            results,
            duration_ms,
        }
    }

    /// Check if there are no results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Get the number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "md".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
    }

    #[test]
    fn test_query_request_builder() {
        let request = QueryRequest::new("hotel near airport", "DescriptionVector")
            .with_limit(3)
            .with_ef_search(16)
            .with_projection(vec!["HotelName".to_string(), "Rating".to_string()]);

        assert_eq!(request.query, "hotel near airport");
        assert_eq!(request.field, "DescriptionVector");
        assert_eq!(request.limit, 3);
        assert_eq!(request.ef_search, Some(16));
        assert_eq!(request.probes, None);
        assert_eq!(request.projection.as_ref().map(|f| f.len()), Some(2));
    }

    #[test]
    fn test_search_results() {
        let results = SearchResults::new("test".to_string(), vec![], 50);
        assert!(results.is_empty());
        assert_eq!(results.len(), 0);
        assert_eq!(results.duration_ms, 50);
    }
}
