use std::fmt::Write as FmtWrite;

use serde_json::Value;

use crate::models::{IndexDescriptor, SearchHit, SearchResults};
use crate::services::{EmbedReport, InsertStats};

/// How many hits the text formatter prints in full before summarizing.
const DEFAULT_MAX_DISPLAY: usize = 3;

pub trait Formatter {
    fn format_search_results(&self, results: &SearchResults) -> String;
    fn format_insert_stats(&self, stats: &InsertStats) -> String;
    fn format_embed_report(&self, report: &EmbedReport) -> String;
    fn format_indexes(&self, collection: &str, indexes: &[IndexDescriptor]) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub connected: bool,
    pub database: String,
    pub collection: String,
    pub documents: Option<u64>,
    pub vector_indexes: Vec<String>,
    pub embedding_configured: bool,
    pub embedding_model: String,
}

pub struct TextFormatter {
    max_display: usize,
}

impl TextFormatter {
    pub fn new(max_display: usize) -> Self {
        Self { max_display }
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DISPLAY)
    }
}

impl Formatter for TextFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("No results found for: {}\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "Search results for: \"{}\"", results.query).unwrap();
        writeln!(
            output,
            "Found {} results in {}ms\n",
            results.len(),
            results.duration_ms
        )
        .unwrap();

        for (i, hit) in results.results.iter().take(self.max_display).enumerate() {
            write_hit(&mut output, i + 1, hit);
        }

        if results.len() > self.max_display {
            writeln!(
                output,
                "   ... and {} more results",
                results.len() - self.max_display
            )
            .unwrap();
        }

        output
    }

    fn format_insert_stats(&self, stats: &InsertStats) -> String {
        let mut output = String::new();
        writeln!(output, "Load Complete").unwrap();
        writeln!(output, "-------------").unwrap();
        writeln!(output, "Total documents: {}", stats.total).unwrap();
        writeln!(output, "Inserted: {}", stats.inserted).unwrap();
        writeln!(output, "Failed: {}", stats.failed).unwrap();
        if !stats.errors.is_empty() {
            writeln!(output, "Errors:").unwrap();
            for error in &stats.errors {
                writeln!(output, "  {}", error).unwrap();
            }
        }
        output
    }

    fn format_embed_report(&self, report: &EmbedReport) -> String {
        let mut output = String::new();
        writeln!(output, "Embedding Complete").unwrap();
        writeln!(output, "------------------").unwrap();
        writeln!(output, "Total documents: {}", report.total).unwrap();
        writeln!(output, "Embedded: {}", report.embedded).unwrap();
        writeln!(output, "Skipped: {}", report.skipped.len()).unwrap();
        if !report.skipped.is_empty() {
            writeln!(output, "Skipped ids: {}", report.skipped.join(", ")).unwrap();
        }
        output
    }

    fn format_indexes(&self, collection: &str, indexes: &[IndexDescriptor]) -> String {
        let mut output = String::new();
        let header = format!("Indexes on {}", collection);
        writeln!(output, "{}", header).unwrap();
        writeln!(output, "{}", "-".repeat(header.len())).unwrap();

        if indexes.is_empty() {
            writeln!(output, "No indexes found.").unwrap();
            return output;
        }

        writeln!(output, "Found {} index(es)\n", indexes.len()).unwrap();
        for (i, descriptor) in indexes.iter().enumerate() {
            writeln!(output, "Index {}:", i + 1).unwrap();
            for line in describe_index(descriptor) {
                writeln!(output, "  {}", line).unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        let store_status = if status.connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(output, "Store:       {}", store_status).unwrap();
        writeln!(output, "  Database:   {}", status.database).unwrap();
        writeln!(output, "  Collection: {}", status.collection).unwrap();
        if let Some(documents) = status.documents {
            writeln!(output, "  Documents:  {}", documents).unwrap();
        }
        if !status.vector_indexes.is_empty() {
            writeln!(
                output,
                "  Vector indexes: {}",
                status.vector_indexes.join(", ")
            )
            .unwrap();
        }
        writeln!(output).unwrap();

        let embedding_status = if status.embedding_configured {
            "[CONFIGURED]"
        } else {
            "[NOT CONFIGURED]"
        };
        writeln!(output, "Embedding:   {}", embedding_status).unwrap();
        writeln!(output, "  Model:      {}", status.embedding_model).unwrap();

        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

/// One numbered hit block in the original demo layout: headline name,
/// four-decimal score, a capped description, then rating and address
/// when the document carries them.
fn write_hit(output: &mut String, position: usize, hit: &SearchHit) {
    let name = hit
        .document
        .get("HotelName")
        .and_then(Value::as_str)
        .unwrap_or("Unknown");
    writeln!(output, "{}. {}", position, name).unwrap();
    writeln!(output, "   Similarity Score: {:.4}", hit.score).unwrap();

    if let Some(description) = hit.document.get("Description").and_then(Value::as_str) {
        writeln!(output, "   Description: {}", preview(description, 200)).unwrap();
    }

    if let Some(rating) = hit.document.get("Rating").filter(|v| !v.is_null()) {
        writeln!(output, "   Rating: {}", display_value(rating)).unwrap();
    }

    if let Some(address) = address_line(&hit.document) {
        writeln!(output, "   Address: {}", address).unwrap();
    }

    writeln!(output).unwrap();
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

fn address_line(document: &crate::models::Document) -> Option<String> {
    let address = document.get("Address")?.as_object()?;
    let parts: Vec<&str> = ["StreetAddress", "City", "StateProvince"]
        .iter()
        .filter_map(|part| address.get(*part).and_then(Value::as_str))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Render a JSON value the way it reads in a terminal: strings bare,
/// everything else in JSON notation.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Lines describing one index, in the listing layout the store's raw
/// descriptors support: vector indexes get their configuration spelled
/// out, standard indexes get their key pattern.
fn describe_index(descriptor: &IndexDescriptor) -> Vec<String> {
    let mut lines = vec![format!("Index Name: {}", descriptor.name)];

    if let Some(config) = descriptor.vector_options() {
        lines.push("Type: Vector Search Index".to_string());
        if let Some(similarity) = config.get("similarity").and_then(Value::as_str) {
            lines.push(format!("Similarity Metric: {}", similarity));
        }
        if let Some(dimensions) = config.get("dimensions").and_then(Value::as_u64) {
            lines.push(format!("Vector Dimensions: {}", dimensions));
        }

        if let Some(params) = config.get("diskann") {
            lines.push("Algorithm: DiskANN".to_string());
            lines.push(format!("  Max Degree: {}", param(params, "maxDegree")));
            lines.push(format!("  Build Parameter: {}", param(params, "buildParam")));
        } else if let Some(params) = config.get("hnsw") {
            lines.push("Algorithm: HNSW".to_string());
            lines.push(format!(
                "  Max Connections: {}",
                param(params, "maxConnections")
            ));
            lines.push(format!(
                "  EF Construction: {}",
                param(params, "efConstruction")
            ));
        } else if let Some(params) = config.get("ivf") {
            lines.push("Algorithm: IVF".to_string());
            lines.push(format!(
                "  Number of Clusters: {}",
                param(params, "numClusters")
            ));
            lines.push(format!("  Minimum Vectors: {}", param(params, "minVectors")));
        } else if let Some(kind) = config.get("kind").and_then(Value::as_str) {
            lines.push(format!("Kind: {}", kind));
        }
    } else {
        lines.push("Type: Standard Index".to_string());
        if !descriptor.key.is_empty() {
            let key_fields: Vec<String> = descriptor
                .key
                .iter()
                .map(|(field, marker)| format!("{}: {}", field, display_value(marker)))
                .collect();
            lines.push(format!("Key Pattern: {}", key_fields.join(", ")));
        }
    }

    for (flag, label) in [
        ("unique", "Unique: Yes"),
        ("sparse", "Sparse: Yes"),
        ("background", "Built in Background: Yes"),
    ] {
        if descriptor.raw.get(flag).and_then(Value::as_bool) == Some(true) {
            lines.push(label.to_string());
        }
    }

    lines
}

fn param(params: &Value, key: &str) -> String {
    params
        .get(key)
        .map(display_value)
        .unwrap_or_else(|| "N/A".to_string())
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, value: &impl serde::Serialize) -> String {
        let result = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        let body = result.unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e));
        format!("{}\n", body)
    }
}

impl Formatter for JsonFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        self.render(results)
    }

    fn format_insert_stats(&self, stats: &InsertStats) -> String {
        self.render(stats)
    }

    fn format_embed_report(&self, report: &EmbedReport) -> String {
        self.render(report)
    }

    fn format_indexes(&self, collection: &str, indexes: &[IndexDescriptor]) -> String {
        self.render(&serde_json::json!({
            "collection": collection,
            "indexes": indexes,
        }))
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        self.render(&serde_json::json!({
            "store": {
                "connected": status.connected,
                "database": status.database,
                "collection": status.collection,
                "documents": status.documents,
                "vector_indexes": status.vector_indexes,
            },
            "embedding": {
                "configured": status.embedding_configured,
                "model": status.embedding_model,
            }
        }))
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", serde_json::json!({"message": message}))
    }

    fn format_error(&self, error: &str) -> String {
        format!("{}\n", serde_json::json!({"error": error}))
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("## No results found\n\nQuery: `{}`\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "## Search Results\n").unwrap();
        writeln!(output, "**Query:** `{}`\n", results.query).unwrap();
        writeln!(
            output,
            "Found {} results in {}ms\n",
            results.len(),
            results.duration_ms
        )
        .unwrap();

        for (i, hit) in results.results.iter().enumerate() {
            let name = hit
                .document
                .get("HotelName")
                .and_then(Value::as_str)
                .unwrap_or("Unknown");
            writeln!(output, "### {}. {}\n", i + 1, name).unwrap();
            writeln!(output, "**Score:** {:.4}\n", hit.score).unwrap();
            if let Some(description) = hit.document.get("Description").and_then(Value::as_str) {
                writeln!(output, "> {}\n", preview(description, 200)).unwrap();
            }
            if let Some(rating) = hit.document.get("Rating").filter(|v| !v.is_null()) {
                writeln!(output, "- **Rating:** {}", display_value(rating)).unwrap();
            }
            if let Some(address) = address_line(&hit.document) {
                writeln!(output, "- **Address:** {}", address).unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn format_insert_stats(&self, stats: &InsertStats) -> String {
        let mut output = String::new();
        writeln!(output, "## Load Complete\n").unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Total documents | {} |", stats.total).unwrap();
        writeln!(output, "| Inserted | {} |", stats.inserted).unwrap();
        writeln!(output, "| Failed | {} |", stats.failed).unwrap();
        if !stats.errors.is_empty() {
            writeln!(output, "\n**Errors:**\n").unwrap();
            for error in &stats.errors {
                writeln!(output, "- {}", error).unwrap();
            }
        }
        output
    }

    fn format_embed_report(&self, report: &EmbedReport) -> String {
        let mut output = String::new();
        writeln!(output, "## Embedding Complete\n").unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Total documents | {} |", report.total).unwrap();
        writeln!(output, "| Embedded | {} |", report.embedded).unwrap();
        writeln!(output, "| Skipped | {} |", report.skipped.len()).unwrap();
        if !report.skipped.is_empty() {
            let ids: Vec<String> = report.skipped.iter().map(|id| format!("`{}`", id)).collect();
            writeln!(output, "\n**Skipped ids:** {}", ids.join(", ")).unwrap();
        }
        output
    }

    fn format_indexes(&self, collection: &str, indexes: &[IndexDescriptor]) -> String {
        let mut output = String::new();
        writeln!(output, "## Indexes on `{}`\n", collection).unwrap();

        if indexes.is_empty() {
            writeln!(output, "*No indexes found.*").unwrap();
            return output;
        }

        for descriptor in indexes {
            writeln!(output, "### {}\n", descriptor.name).unwrap();
            for line in describe_index(descriptor).into_iter().skip(1) {
                writeln!(output, "- {}", line.trim_start()).unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "## Status\n").unwrap();

        let store_status = if status.connected { "✅" } else { "❌" };
        writeln!(output, "### Store {}\n", store_status).unwrap();
        writeln!(output, "- **Database:** {}", status.database).unwrap();
        writeln!(output, "- **Collection:** {}", status.collection).unwrap();
        if let Some(documents) = status.documents {
            writeln!(output, "- **Documents:** {}", documents).unwrap();
        }
        if !status.vector_indexes.is_empty() {
            let names: Vec<String> = status
                .vector_indexes
                .iter()
                .map(|name| format!("`{}`", name))
                .collect();
            writeln!(output, "- **Vector indexes:** {}", names.join(", ")).unwrap();
        }
        writeln!(output).unwrap();

        let embedding_status = if status.embedding_configured {
            "✅"
        } else {
            "❌"
        };
        writeln!(output, "### Embedding {}\n", embedding_status).unwrap();
        writeln!(output, "- **Model:** {}", status.embedding_model).unwrap();

        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: crate::models::OutputFormat) -> Box<dyn Formatter> {
    match format {
        crate::models::OutputFormat::Text => Box::new(TextFormatter::default()),
        crate::models::OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        crate::models::OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Document;
    use serde_json::json;

    fn hit(fields: Value, score: f64) -> SearchHit {
        let document: Document = serde_json::from_value(fields).unwrap();
        SearchHit { document, score }
    }

    fn results(hits: Vec<SearchHit>) -> SearchResults {
        SearchResults::new("test query".to_string(), hits, 42)
    }

    #[test]
    fn test_text_scores_have_four_decimals() {
        let output = TextFormatter::default()
            .format_search_results(&results(vec![hit(json!({"HotelName": "A"}), 0.8)]));
        assert!(output.contains("Similarity Score: 0.8000"));
    }

    #[test]
    fn test_text_truncates_long_descriptions() {
        let long = "x".repeat(250);
        let output = TextFormatter::default().format_search_results(&results(vec![hit(
            json!({"HotelName": "A", "Description": long}),
            0.9,
        )]));

        let expected = format!("Description: {}...", "x".repeat(200));
        assert!(output.contains(&expected));
        assert!(!output.contains(&"x".repeat(201)));
    }

    #[test]
    fn test_text_short_description_is_untouched() {
        let output = TextFormatter::default().format_search_results(&results(vec![hit(
            json!({"HotelName": "A", "Description": "Cozy rooms"}),
            0.9,
        )]));
        assert!(output.contains("Description: Cozy rooms\n"));
    }

    #[test]
    fn test_text_caps_displayed_results() {
        let hits = (0..5)
            .map(|i| hit(json!({"HotelName": format!("Hotel {}", i)}), 0.9))
            .collect();
        let output = TextFormatter::new(3).format_search_results(&results(hits));

        assert!(output.contains("Hotel 2"));
        assert!(!output.contains("Hotel 3"));
        assert!(output.contains("... and 2 more results"));
    }

    #[test]
    fn test_text_shows_all_when_under_the_cap() {
        let hits = (0..2)
            .map(|i| hit(json!({"HotelName": format!("Hotel {}", i)}), 0.9))
            .collect();
        let output = TextFormatter::new(3).format_search_results(&results(hits));
        assert!(!output.contains("more results"));
    }

    #[test]
    fn test_text_skips_null_or_missing_rating() {
        let output = TextFormatter::default().format_search_results(&results(vec![
            hit(json!({"HotelName": "A", "Rating": null}), 0.9),
            hit(json!({"HotelName": "B"}), 0.8),
        ]));
        assert!(!output.contains("Rating:"));

        let output = TextFormatter::default()
            .format_search_results(&results(vec![hit(json!({"HotelName": "A", "Rating": 4.5}), 0.9)]));
        assert!(output.contains("Rating: 4.5"));
    }

    #[test]
    fn test_text_joins_available_address_parts() {
        let output = TextFormatter::default().format_search_results(&results(vec![hit(
            json!({
                "HotelName": "A",
                "Address": {"City": "Seattle", "StateProvince": "WA"},
            }),
            0.9,
        )]));
        assert!(output.contains("Address: Seattle, WA"));
    }

    #[test]
    fn test_text_unknown_hotel_name() {
        let output = TextFormatter::default()
            .format_search_results(&results(vec![hit(json!({"HotelId": "9"}), 0.9)]));
        assert!(output.contains("1. Unknown"));
    }

    #[test]
    fn test_json_results_roundtrip() {
        let output = JsonFormatter::new(false)
            .format_search_results(&results(vec![hit(json!({"HotelName": "A"}), 0.9)]));
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["query"], "test query");
        assert_eq!(parsed["results"][0]["score"], 0.9);
    }

    #[test]
    fn test_insert_stats_lists_errors() {
        let stats = InsertStats {
            total: 5,
            inserted: 4,
            failed: 1,
            errors: vec!["document 2: duplicate key".to_string()],
        };
        let output = TextFormatter::default().format_insert_stats(&stats);
        assert!(output.contains("Inserted: 4"));
        assert!(output.contains("document 2: duplicate key"));
    }

    #[test]
    fn test_index_listing_shows_vector_configuration() {
        let descriptor = IndexDescriptor {
            name: "hnsw_index_DescriptionVector".to_string(),
            key: serde_json::from_value(json!({"DescriptionVector": "cosmosSearch"})).unwrap(),
            raw: json!({
                "name": "hnsw_index_DescriptionVector",
                "key": {"DescriptionVector": "cosmosSearch"},
                "vectorSearchConfiguration": {
                    "similarity": "COS",
                    "dimensions": 1536,
                    "hnsw": {"maxConnections": 16, "efConstruction": 64},
                },
            }),
        };

        let output =
            TextFormatter::default().format_indexes("vectorSearchCollection", &[descriptor]);
        assert!(output.contains("Type: Vector Search Index"));
        assert!(output.contains("Similarity Metric: COS"));
        assert!(output.contains("Vector Dimensions: 1536"));
        assert!(output.contains("Max Connections: 16"));
        assert!(output.contains("EF Construction: 64"));
    }

    #[test]
    fn test_index_listing_standard_index_key_pattern() {
        let descriptor = IndexDescriptor {
            name: "_id_".to_string(),
            key: serde_json::from_value(json!({"_id": 1})).unwrap(),
            raw: json!({"name": "_id_", "key": {"_id": 1}}),
        };

        let output = TextFormatter::default().format_indexes("c", &[descriptor]);
        assert!(output.contains("Type: Standard Index"));
        assert!(output.contains("Key Pattern: _id: 1"));
    }

    #[test]
    fn test_status_disconnected_store() {
        let status = StatusInfo {
            connected: false,
            database: "vectorSearchDB".to_string(),
            collection: "vectorSearchCollection".to_string(),
            documents: None,
            vector_indexes: Vec::new(),
            embedding_configured: true,
            embedding_model: "text-embedding-ada-002".to_string(),
        };

        let output = TextFormatter::default().format_status(&status);
        assert!(output.contains("[DISCONNECTED]"));
        assert!(!output.contains("Documents:"));
    }
}
