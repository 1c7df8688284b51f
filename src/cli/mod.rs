//! CLI module for the vector search CLI.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Vector search CLI for Azure Cosmos DB for MongoDB vCore.
#[derive(Debug, Parser)]
#[command(name = "vsearch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check infrastructure status (document store, embedding provider)
    Status,

    /// Generate embeddings for the documents in a JSON data file
    Embed(commands::EmbedArgs),

    /// Load embedded documents into the collection
    Load(commands::LoadArgs),

    /// Manage the vector index (create, drop, show)
    #[command(subcommand)]
    Index(commands::IndexCommand),

    /// Search the collection with a natural-language query
    Search(commands::SearchArgs),

    /// Run an end-to-end demo for one index algorithm
    Demo(commands::DemoArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}
