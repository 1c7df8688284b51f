//! Cosmos DB for MongoDB vCore store backend.

use async_trait::async_trait;
use mongodb::bson::{self, Bson, doc};
use mongodb::error::ErrorKind;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use std::time::Duration;

use super::{BulkInsertOutcome, DocumentStore, WriteFailure};
use crate::error::StoreError;
use crate::models::{
    Document, IndexAlgorithm, IndexDescriptor, SearchHit, SimilaritySearch, StoreConfig,
    VECTOR_KEY_MARKER, VectorIndexSpec,
};

/// Document store backend over the MongoDB wire protocol.
pub struct MongoStore {
    client: Client,
    database: String,
    collection: String,
}

impl MongoStore {
    /// Connect using a connection string. Pool and timeout tuning is sized
    /// for batch loads against a managed cluster.
    pub async fn connect(
        connection_string: &str,
        config: &StoreConfig,
    ) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(connection_string)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;
        options.max_pool_size = Some(50);
        options.min_pool_size = Some(5);
        options.max_idle_time = Some(Duration::from_secs(30));
        options.server_selection_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(options)
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            database: config.database.clone(),
            collection: config.collection.clone(),
        })
    }

    fn db(&self) -> Database {
        self.client.database(&self.database)
    }

    fn documents(&self) -> Collection<bson::Document> {
        self.db().collection(&self.collection)
    }

    /// Get the database name.
    pub fn database_name(&self) -> &str {
        &self.database
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn health_check(&self) -> Result<bool, StoreError> {
        self.db()
            .run_command(doc! {"ping": 1})
            .await
            .map(|_| true)
            .map_err(|e| StoreError::ConnectionError(e.to_string()))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.documents()
            .count_documents(doc! {})
            .await
            .map_err(|e| StoreError::CommandError(e.to_string()))
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        self.documents()
            .delete_many(doc! {})
            .await
            .map(|result| result.deleted_count)
            .map_err(|e| StoreError::DeleteError(e.to_string()))
    }

    async fn bulk_insert(&self, documents: &[Document]) -> Result<BulkInsertOutcome, StoreError> {
        if documents.is_empty() {
            return Ok(BulkInsertOutcome::default());
        }

        let batch = documents
            .iter()
            .map(bson_document)
            .collect::<Result<Vec<_>, _>>()?;

        match self.documents().insert_many(batch).ordered(false).await {
            Ok(result) => Ok(BulkInsertOutcome {
                inserted: result.inserted_ids.len(),
                failures: Vec::new(),
            }),
            Err(e) => match e.kind.as_ref() {
                ErrorKind::InsertMany(failure) => {
                    let failures: Vec<WriteFailure> = failure
                        .write_errors
                        .as_deref()
                        .unwrap_or_default()
                        .iter()
                        .map(|write_error| WriteFailure {
                            index: write_error.index,
                            message: write_error.message.clone(),
                        })
                        .collect();
                    // `InsertManyError::inserted_ids` is private; with an
                    // unordered insert every document not named in a write
                    // error was inserted, so derive the count instead.
                    Ok(BulkInsertOutcome {
                        inserted: documents.len() - failures.len(),
                        failures,
                    })
                }
                _ => Err(StoreError::InsertError(e.to_string())),
            },
        }
    }

    async fn list_indexes(&self) -> Result<Vec<IndexDescriptor>, StoreError> {
        // The raw command keeps store-specific options the typed index
        // model would drop. The listing fits in the first batch at this
        // collection scale.
        let reply = self
            .db()
            .run_command(doc! {"listIndexes": &self.collection})
            .await
            .map_err(|e| StoreError::IndexError(e.to_string()))?;

        let batch = reply
            .get_document("cursor")
            .and_then(|cursor| cursor.get_array("firstBatch"))
            .map_err(|e| StoreError::CommandError(e.to_string()))?;

        Ok(batch
            .iter()
            .filter_map(|item| descriptor_from_bson(item.clone()))
            .collect())
    }

    async fn drop_index(&self, name: &str) -> Result<(), StoreError> {
        self.documents()
            .drop_index(name)
            .await
            .map_err(|e| StoreError::IndexError(e.to_string()))
    }

    async fn create_vector_index(&self, spec: &VectorIndexSpec) -> Result<(), StoreError> {
        self.db()
            .run_command(create_indexes_command(&self.collection, spec))
            .await
            .map(|_| ())
            .map_err(|e| StoreError::IndexError(e.to_string()))
    }

    async fn similarity_search(
        &self,
        search: &SimilaritySearch,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let mut cursor = self
            .documents()
            .aggregate(search_pipeline(search))
            .await
            .map_err(|e| StoreError::SearchError(e.to_string()))?;

        let mut hits = Vec::new();
        while cursor
            .advance()
            .await
            .map_err(|e| StoreError::SearchError(e.to_string()))?
        {
            let raw = cursor
                .deserialize_current()
                .map_err(|e| StoreError::SearchError(e.to_string()))?;
            hits.push(hit_from_document(raw));
        }

        Ok(hits)
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}

/// Numeric command fields are i32 on the wire. Oversized values clamp
/// instead of wrapping negative.
fn wire_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Build the index creation command for a vector index spec.
fn create_indexes_command(collection: &str, spec: &VectorIndexSpec) -> bson::Document {
    let mut key = bson::Document::new();
    key.insert(spec.field.as_str(), VECTOR_KEY_MARKER);

    let mut options = doc! {
        "kind": spec.algorithm.wire_kind(),
        "dimensions": wire_i32(spec.dimensions),
        "similarity": spec.similarity.wire_name(),
    };
    match spec.algorithm {
        IndexAlgorithm::Hnsw(params) => {
            options.insert("m", wire_i32(params.m));
            options.insert("efConstruction", wire_i32(params.ef_construction));
        }
        IndexAlgorithm::DiskAnn(params) => {
            options.insert("maxDegree", wire_i32(params.max_degree));
            options.insert("lBuild", wire_i32(params.l_build));
        }
        IndexAlgorithm::Ivf(params) => {
            options.insert("numLists", wire_i32(params.num_lists));
        }
    }

    doc! {
        "createIndexes": collection,
        "indexes": [{
            "name": spec.index_name(),
            "key": key,
            "cosmosSearchOptions": options,
        }],
    }
}

/// Build the similarity search aggregation pipeline.
fn search_pipeline(search: &SimilaritySearch) -> Vec<bson::Document> {
    let vector: Vec<f64> = search.vector.iter().map(|v| f64::from(*v)).collect();

    let mut cosmos = doc! {
        "vector": vector,
        "path": &search.field,
        "k": wire_i32(search.limit),
    };
    if let Some(ef_search) = search.ef_search {
        cosmos.insert("efSearch", wire_i32(ef_search));
    }

    let project = match &search.projection {
        Some(fields) => {
            let mut stage = bson::Document::new();
            for field in fields {
                stage.insert(field.as_str(), 1);
            }
            stage.insert("score", doc! {"$meta": "searchScore"});
            stage
        }
        None => doc! {
            "document": "$$ROOT",
            "score": {"$meta": "searchScore"},
        },
    };

    vec![
        doc! {"$search": {"cosmosSearch": cosmos}},
        doc! {"$project": project},
    ]
}

fn bson_document(document: &Document) -> Result<bson::Document, StoreError> {
    bson::Document::try_from(document.as_map().clone())
        .map_err(|e| StoreError::DocumentError(e.to_string()))
}

fn json_document(document: bson::Document) -> Document {
    match serde_json::Value::from(Bson::Document(document)) {
        serde_json::Value::Object(map) => Document::from(map),
        _ => Document::new(),
    }
}

/// Normalize one aggregation row into a hit. Full-document searches wrap
/// the record under a `document` key; projected searches return it flat.
fn hit_from_document(mut raw: bson::Document) -> SearchHit {
    let score = raw
        .remove("score")
        .and_then(|value| value.as_f64())
        .unwrap_or_default();

    let document = match raw.remove("document") {
        Some(Bson::Document(inner)) => json_document(inner),
        _ => json_document(raw),
    };

    SearchHit { document, score }
}

fn descriptor_from_bson(raw: Bson) -> Option<IndexDescriptor> {
    let value = serde_json::Value::from(raw);
    let name = value.get("name")?.as_str()?.to_string();
    let key = value
        .get("key")
        .and_then(|k| k.as_object())
        .cloned()
        .unwrap_or_default();
    Some(IndexDescriptor {
        name,
        key,
        raw: value,
    })
}
