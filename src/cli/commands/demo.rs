//! Demo command implementation.
//!
//! Runs the full pipeline for one index algorithm: reload the collection
//! from an embedded data file, rebuild the vector index, then run the
//! algorithm's sample searches.

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::output::{Formatter, get_formatter};
use crate::error::AppError;
use crate::models::{
    Config, Document, IndexAlgorithm, IndexKind, OutputFormat, QueryRequest, Secrets,
    VectorIndexSpec,
};
use crate::services::{
    AzureOpenAiEmbedder, BulkLoader, DocumentStore, IndexManager, LoaderOptions, MongoStore,
    QueryExecutor,
};
use crate::utils::file;

const HNSW_QUERY: &str = "quintessential lodging near running trails, eateries, retail";
const HNSW_LIMIT: u32 = 5;
const HNSW_EF_SEARCH: u32 = 16;

const DISKANN_QUERIES: [&str; 3] = [
    "luxury hotel with pool and spa",
    "budget accommodation downtown",
    "hotel near airport with free parking",
];
const DISKANN_LIMIT: u32 = 3;
const DISKANN_FIELDS: [&str; 6] = [
    "HotelId",
    "HotelName",
    "Description",
    "Category",
    "Rating",
    "Address",
];

/// Query, scenario label, and the probe counts to sweep.
const IVF_SCENARIOS: [(&str, &str, &[u32]); 3] = [
    (
        "hotel with pool and spa amenities",
        "Luxury amenities search",
        &[5, 10, 20],
    ),
    (
        "budget accommodation with basic facilities",
        "Economy hotel search",
        &[5, 10],
    ),
    (
        "extended stay hotel with kitchen facilities",
        "Long-term accommodation",
        &[10, 15],
    ),
];
const IVF_LIMIT: u32 = 3;
const IVF_FIELDS: [&str; 8] = [
    "HotelId",
    "HotelName",
    "Description",
    "Category",
    "Rating",
    "Address",
    "Tags",
    "ParkingIncluded",
];

#[derive(Debug, Args)]
pub struct DemoArgs {
    #[arg(help = "Index algorithm to demonstrate: hnsw, diskann, or ivf")]
    pub algorithm: IndexKind,

    #[arg(long, help = "JSON file with embedded documents")]
    pub file: Option<PathBuf>,
}

pub async fn handle_demo(args: DemoArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let secrets = Secrets::from_env()?;
    let formatter = get_formatter(format);

    let path = args
        .file
        .unwrap_or_else(|| PathBuf::from(&config.data.output));

    let documents = file::read_documents(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let vector_field = config.fields.vector.clone();
    let eligible: Vec<Document> = documents
        .into_iter()
        .filter(|d| d.contains(&vector_field))
        .collect();
    if eligible.is_empty() {
        return Err(AppError::NoEligibleDocuments {
            field: vector_field,
        }
        .into());
    }

    if verbose {
        eprintln!("Algorithm: {}", args.algorithm);
        eprintln!("File: {}", path.display());
        eprintln!("Documents with vectors: {}", eligible.len());
        eprintln!(
            "Target: {}.{}",
            config.store.database, config.store.collection
        );
    }

    let store = Arc::new(
        MongoStore::connect(&secrets.connection_string, &config.store)
            .await
            .context("failed to connect to the document store")?,
    );
    let embedder = Arc::new(AzureOpenAiEmbedder::new(
        &secrets.embedding_endpoint,
        &secrets.embedding_key,
        &config.embedding,
    )?);

    print!(
        "{}",
        formatter.format_message(&format!(
            "Loading {} documents into {}.{}",
            eligible.len(),
            config.store.database,
            config.store.collection
        ))
    );

    let cleared = store
        .delete_all()
        .await
        .context("failed to clear the collection")?;
    if verbose && cleared > 0 {
        eprintln!("Cleared {} existing documents", cleared);
    }

    let loader = BulkLoader::new(store.clone(), LoaderOptions::from_config(&config));

    let pb = ProgressBar::new(eligible.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let stats = loader.insert_all(&eligible, Some(&pb)).await;
    pb.finish_and_clear();

    print!("{}", formatter.format_insert_stats(&stats));

    if stats.inserted == 0 {
        return Err(AppError::NoDocumentsInserted.into());
    }

    let spec = demo_spec(&config, args.algorithm);
    let manager = IndexManager::new(store.clone());
    super::index::replace_and_report(&manager, &spec, formatter.as_ref(), true).await?;

    let executor = QueryExecutor::new(embedder, store);
    match args.algorithm {
        IndexKind::Hnsw => run_hnsw_search(&executor, formatter.as_ref(), &config).await,
        IndexKind::DiskAnn => run_diskann_searches(&executor, formatter.as_ref(), &config).await,
        IndexKind::Ivf => run_ivf_searches(&executor, formatter.as_ref(), &config).await,
    }
}

/// Index spec for the demo comes straight from configuration, no overrides.
fn demo_spec(config: &Config, kind: IndexKind) -> VectorIndexSpec {
    let algorithm = match kind {
        IndexKind::Hnsw => IndexAlgorithm::Hnsw(config.index.hnsw),
        IndexKind::DiskAnn => IndexAlgorithm::DiskAnn(config.index.diskann),
        IndexKind::Ivf => IndexAlgorithm::Ivf(config.index.ivf),
    };

    VectorIndexSpec::new(
        config.fields.vector.clone(),
        config.embedding.dimensions,
        config.index.similarity,
        algorithm,
    )
}

async fn run_hnsw_search(
    executor: &QueryExecutor,
    formatter: &dyn Formatter,
    config: &Config,
) -> Result<()> {
    let mut request = QueryRequest::new(HNSW_QUERY, &config.fields.vector).with_limit(HNSW_LIMIT);
    request.ef_search = Some(HNSW_EF_SEARCH);

    let results = executor
        .search(&request)
        .await
        .context("demo search failed")?;
    print!("{}", formatter.format_search_results(&results));

    Ok(())
}

async fn run_diskann_searches(
    executor: &QueryExecutor,
    formatter: &dyn Formatter,
    config: &Config,
) -> Result<()> {
    for query in DISKANN_QUERIES {
        let mut request = QueryRequest::new(query, &config.fields.vector).with_limit(DISKANN_LIMIT);
        request.projection = Some(DISKANN_FIELDS.iter().map(|f| f.to_string()).collect());

        let results = executor
            .search(&request)
            .await
            .context("demo search failed")?;
        print!("{}", formatter.format_search_results(&results));
    }

    Ok(())
}

async fn run_ivf_searches(
    executor: &QueryExecutor,
    formatter: &dyn Formatter,
    config: &Config,
) -> Result<()> {
    for (query, label, probe_values) in IVF_SCENARIOS {
        print!("{}", formatter.format_message(label));

        for &probes in probe_values {
            print!(
                "{}",
                formatter.format_message(&format!("Searching with {} cluster probes", probes))
            );

            let mut request = QueryRequest::new(query, &config.fields.vector).with_limit(IVF_LIMIT);
            request.probes = Some(probes);
            request.projection = Some(IVF_FIELDS.iter().map(|f| f.to_string()).collect());

            let results = executor
                .search(&request)
                .await
                .context("demo search failed")?;
            print!("{}", formatter.format_search_results(&results));
        }
    }

    Ok(())
}
