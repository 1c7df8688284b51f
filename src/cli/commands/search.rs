use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat, QueryRequest, Secrets};
use crate::services::{AzureOpenAiEmbedder, MongoStore, QueryExecutor};

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(required = true, help = "Search query text")]
    pub query: String,

    #[arg(long, short = 'n', help = "Maximum number of results to return")]
    pub limit: Option<u32>,

    #[arg(long, help = "HNSW search candidate list size")]
    pub ef_search: Option<u32>,

    #[arg(long, help = "IVF probe count (reported only, not sent to the store)")]
    pub probes: Option<u32>,

    #[arg(
        long,
        help = "Comma-separated fields to return (default: whole document)"
    )]
    pub fields: Option<String>,
}

pub async fn handle_search(args: SearchArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("search query cannot be empty");
    }

    let config = Config::load()?;
    let secrets = Secrets::from_env()?;
    let formatter = get_formatter(format);

    let limit = args.limit.unwrap_or(config.search.default_limit);
    if limit == 0 {
        anyhow::bail!("limit must be at least 1");
    }

    let projection: Option<Vec<String>> = args
        .fields
        .as_ref()
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(String::from)
                .collect::<Vec<_>>()
        })
        .filter(|fields| !fields.is_empty())
        .or_else(|| config.search.default_fields.clone());

    let mut request = QueryRequest::new(query, &config.fields.vector).with_limit(limit);
    request.ef_search = args.ef_search.or(config.search.ef_search);
    request.probes = args.probes.or(config.search.probes);
    request.projection = projection;

    if verbose {
        eprintln!("Query: \"{}\"", request.query);
        eprintln!("  Limit: {}", request.limit);
        if let Some(ef_search) = request.ef_search {
            eprintln!("  efSearch: {}", ef_search);
        }
        if let Some(probes) = request.probes {
            eprintln!("  Probes: {} (reported only)", probes);
        }
        if let Some(ref fields) = request.projection {
            eprintln!("  Fields: {}", fields.join(", "));
        }
    }

    let embedder = Arc::new(AzureOpenAiEmbedder::new(
        &secrets.embedding_endpoint,
        &secrets.embedding_key,
        &config.embedding,
    )?);
    let store = Arc::new(
        MongoStore::connect(&secrets.connection_string, &config.store)
            .await
            .context("failed to connect to the document store")?,
    );

    let executor = QueryExecutor::new(embedder, store);
    let results = executor.search(&request).await.context("search failed")?;

    print!("{}", formatter.format_search_results(&results));

    Ok(())
}
