//! Index command implementation.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::sync::Arc;

use crate::cli::output::{Formatter, get_formatter};
use crate::error::IndexError;
use crate::models::{
    Config, IndexAlgorithm, IndexKind, OutputFormat, Secrets, Similarity, VectorIndexSpec,
};
use crate::services::{DocumentStore, IndexManager, MongoStore, settle_delay};

#[derive(Debug, Subcommand)]
pub enum IndexCommand {
    /// Create the vector index, replacing any existing one on the field
    Create(CreateArgs),

    /// Drop vector indexes on the configured field
    Drop {
        /// Vector field whose indexes to drop
        #[arg(long)]
        field: Option<String>,
    },

    /// Show all indexes on the collection
    Show,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long, short = 'a', help = "Index algorithm: hnsw, diskann, or ivf")]
    pub algorithm: IndexKind,

    #[arg(long, help = "Similarity metric: cos, l2, or ip")]
    pub similarity: Option<Similarity>,

    #[arg(long, help = "HNSW maximum connections per node")]
    pub m: Option<u32>,

    #[arg(long, help = "HNSW construction candidate list size")]
    pub ef_construction: Option<u32>,

    #[arg(long, help = "DiskANN maximum edges per node")]
    pub max_degree: Option<u32>,

    #[arg(long, help = "DiskANN build candidate list size")]
    pub l_build: Option<u32>,

    #[arg(long, help = "IVF cluster count")]
    pub num_lists: Option<u32>,

    #[arg(long, help = "Skip the settle pause after creation")]
    pub no_wait: bool,
}

pub async fn handle_index(cmd: IndexCommand, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let secrets = Secrets::from_env()?;
    let formatter = get_formatter(format);

    let store = Arc::new(
        MongoStore::connect(&secrets.connection_string, &config.store)
            .await
            .context("failed to connect to the document store")?,
    );

    match cmd {
        IndexCommand::Create(args) => {
            let spec = build_spec(&config, &args);
            if verbose {
                eprintln!("Index: {}", spec.index_name());
                eprintln!("Field: {}", spec.field);
                eprintln!("Dimensions: {}", spec.dimensions);
                eprintln!("Similarity: {}", spec.similarity);
            }

            let manager = IndexManager::new(store);
            replace_and_report(&manager, &spec, formatter.as_ref(), !args.no_wait).await
        }
        IndexCommand::Drop { field } => {
            let field = field.unwrap_or_else(|| config.fields.vector.clone());
            let manager = IndexManager::new(store);
            let outcome = manager
                .drop_vector_indexes(&field)
                .await
                .context("failed to drop vector indexes")?;

            for warning in &outcome.warnings {
                eprintln!("Warning: {}", warning);
            }
            if outcome.dropped.is_empty() && outcome.warnings.is_empty() {
                print!(
                    "{}",
                    formatter.format_message(&format!("No vector indexes found on {}", field))
                );
            }
            for name in &outcome.dropped {
                print!(
                    "{}",
                    formatter.format_message(&format!("Dropped index: {}", name))
                );
            }
            Ok(())
        }
        IndexCommand::Show => {
            let indexes = store
                .list_indexes()
                .await
                .context("failed to list indexes")?;
            print!("{}", formatter.format_indexes(store.collection(), &indexes));
            Ok(())
        }
    }
}

/// Assemble the index spec from configuration plus command-line overrides.
fn build_spec(config: &Config, args: &CreateArgs) -> VectorIndexSpec {
    let algorithm = match args.algorithm {
        IndexKind::Hnsw => {
            let mut params = config.index.hnsw;
            if let Some(m) = args.m {
                params.m = m;
            }
            if let Some(ef_construction) = args.ef_construction {
                params.ef_construction = ef_construction;
            }
            IndexAlgorithm::Hnsw(params)
        }
        IndexKind::DiskAnn => {
            let mut params = config.index.diskann;
            if let Some(max_degree) = args.max_degree {
                params.max_degree = max_degree;
            }
            if let Some(l_build) = args.l_build {
                params.l_build = l_build;
            }
            IndexAlgorithm::DiskAnn(params)
        }
        IndexKind::Ivf => {
            let mut params = config.index.ivf;
            if let Some(num_lists) = args.num_lists {
                params.num_lists = num_lists;
            }
            IndexAlgorithm::Ivf(params)
        }
    };

    VectorIndexSpec::new(
        config.fields.vector.clone(),
        config.embedding.dimensions,
        args.similarity.unwrap_or(config.index.similarity),
        algorithm,
    )
}

/// Replace the index, narrate the outcome, and sit out the settle window.
/// On a tier rejection the remediation hint lands on stderr while the
/// server's error propagates unchanged.
pub(crate) async fn replace_and_report(
    manager: &IndexManager,
    spec: &VectorIndexSpec,
    formatter: &dyn Formatter,
    wait: bool,
) -> Result<()> {
    match manager.replace_vector_index(spec).await {
        Ok(outcome) => {
            for warning in &outcome.warnings {
                eprintln!("Warning: {}", warning);
            }
            for name in &outcome.dropped {
                print!(
                    "{}",
                    formatter.format_message(&format!("Dropped index: {}", name))
                );
            }
            print!(
                "{}",
                formatter.format_message(&format!("Created index: {}", spec.index_name()))
            );

            if wait {
                let kind = spec.algorithm.kind();
                print!(
                    "{}",
                    formatter.format_message(&format!(
                        "Waiting {}s for the index to settle...",
                        settle_delay(kind).as_secs()
                    ))
                );
                manager.wait_until_settled(kind).await;
            }
            Ok(())
        }
        Err(e) => {
            if let IndexError::CreateFailed {
                remediation: Some(hint),
                ..
            } = &e
            {
                eprintln!("Hint: {}", hint);
            }
            Err(e.into())
        }
    }
}
