use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat, Secrets};
use crate::services::{AzureOpenAiEmbedder, BatcherOptions, EmbeddingBatcher};
use crate::utils::file;

#[derive(Debug, Args)]
pub struct EmbedArgs {
    #[arg(long, short = 'i', help = "Input JSON file with documents to embed")]
    pub input: Option<PathBuf>,

    #[arg(long, short = 'o', help = "Output JSON file for embedded documents")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Document field whose text gets embedded")]
    pub field: Option<String>,
}

pub async fn handle_embed(args: EmbedArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let secrets = Secrets::from_env()?;
    let formatter = get_formatter(format);

    let input = args
        .input
        .unwrap_or_else(|| PathBuf::from(&config.data.input));
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(&config.data.output));

    let mut options = BatcherOptions::from_config(&config);
    if let Some(field) = args.field {
        options.text_field = field;
    }

    if verbose {
        eprintln!("Input: {}", input.display());
        eprintln!("Output: {}", output.display());
        eprintln!("Field: {}", options.text_field);
        eprintln!("Model: {}", config.embedding.model);
        eprintln!("Batch size: {}", options.batch_size);
    }

    let mut documents = file::read_documents(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    if documents.is_empty() {
        anyhow::bail!("no documents found in {}", input.display());
    }

    let embedder = Arc::new(AzureOpenAiEmbedder::new(
        &secrets.embedding_endpoint,
        &secrets.embedding_key,
        &config.embedding,
    )?);
    let batcher = EmbeddingBatcher::new(embedder, options.clone());

    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let report = batcher
        .embed_all(&mut documents, Some(&pb))
        .await
        .context("embedding run failed")?;
    pb.finish_and_clear();

    for id in &report.skipped {
        eprintln!(
            "Warning: Document {} missing {} field",
            id, options.text_field
        );
    }

    file::write_documents(&output, &documents)
        .with_context(|| format!("failed to write {}", output.display()))?;

    print!("{}", formatter.format_embed_report(&report));
    print!(
        "{}",
        formatter.format_message(&format!(
            "Embedding dimensions: {}",
            config.embedding.dimensions
        ))
    );
    print!(
        "{}",
        formatter.format_message(&format!("Saved to: {}", output.display()))
    );

    Ok(())
}
