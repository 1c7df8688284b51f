use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::output::get_formatter;
use crate::error::AppError;
use crate::models::{Config, Document, OutputFormat, Secrets};
use crate::services::{BulkLoader, DocumentStore, LoaderOptions, MongoStore};
use crate::utils::file;

#[derive(Debug, Args)]
pub struct LoadArgs {
    #[arg(long, short = 'i', help = "JSON file with embedded documents")]
    pub file: Option<PathBuf>,
}

pub async fn handle_load(args: LoadArgs, format: OutputFormat, verbose: bool) -> Result<()> {
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

    let cleared = store
        .delete_all()
        .await
        .context("failed to clear the collection")?;
    if verbose && cleared > 0 {
        eprintln!("Cleared {} existing documents", cleared);
    }

    let loader = BulkLoader::new(store, LoaderOptions::from_config(&config));

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

    Ok(())
}
