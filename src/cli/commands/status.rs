use anyhow::Result;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{
    Config, ENV_CONNECTION_STRING, ENV_EMBEDDING_ENDPOINT, ENV_EMBEDDING_KEY, OutputFormat,
};
use crate::services::{DocumentStore, MongoStore};

/// Reports on every dependency the pipeline needs, probing each one
/// directly so a missing credential degrades the report instead of
/// failing it.
pub async fn handle_status(format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let connection_string = env_var(ENV_CONNECTION_STRING);
    let embedding_configured =
        env_var(ENV_EMBEDDING_ENDPOINT).is_some() && env_var(ENV_EMBEDDING_KEY).is_some();

    let (connected, documents, vector_indexes) = match connection_string {
        Some(ref uri) => probe_store(uri, &config).await,
        None => (false, None, Vec::new()),
    };

    let status = StatusInfo {
        connected,
        database: config.store.database.clone(),
        collection: config.store.collection.clone(),
        documents,
        vector_indexes,
        embedding_configured,
        embedding_model: config.embedding.model.clone(),
    };

    print!("{}", formatter.format_status(&status));

    if !status.connected || !status.embedding_configured {
        eprintln!();
        if !status.connected {
            if connection_string.is_none() {
                eprintln!(
                    "Hint: set {} to enable store access.",
                    ENV_CONNECTION_STRING
                );
            } else {
                eprintln!(
                    "Hint: the store did not answer a ping. Check the connection string and network access."
                );
            }
        }
        if !status.embedding_configured {
            eprintln!(
                "Hint: set {} and {} to enable embedding.",
                ENV_EMBEDDING_ENDPOINT, ENV_EMBEDDING_KEY
            );
        }
    }

    Ok(())
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

async fn probe_store(uri: &str, config: &Config) -> (bool, Option<u64>, Vec<String>) {
    let store = match MongoStore::connect(uri, &config.store).await {
        Ok(store) => store,
        Err(_) => return (false, None, Vec::new()),
    };

    let connected = store.health_check().await.unwrap_or(false);
    if !connected {
        return (false, None, Vec::new());
    }

    let documents = store.count().await.ok();
    let vector_indexes = store
        .list_indexes()
        .await
        .map(|indexes| {
            indexes
                .into_iter()
                .filter(|ix| ix.is_vector_index())
                .map(|ix| ix.name)
                .collect()
        })
        .unwrap_or_default();

    (true, documents, vector_indexes)
}
