//! MongoDB-backed document store.

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::{Client, Collection};

use crate::config::StoreConfig;
use crate::store::{DocumentId, DocumentStore, StoreError, StoredMessage};

/// Document store backed by a MongoDB collection.
///
/// The client maintains its own connection pool internally, so a single
/// `MongoStore` is shared across all connection tasks. A failed insert
/// never leaves the adapter unusable for subsequent calls.
pub struct MongoStore {
    collection: Collection<Document>,
}

impl MongoStore {
    /// Build a store from config. The client connects lazily; an
    /// unreachable server surfaces on the first insert, not here.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(&config.uri)
            .await
            .map_err(classify_error)?;
        let collection = client
            .database(&config.database)
            .collection::<Document>(&config.collection);
        Ok(Self { collection })
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert(&self, message: StoredMessage) -> Result<DocumentId, StoreError> {
        let mut document = Document::new();
        for (key, value) in &message.fields {
            document.insert(key.as_str(), value.as_str());
        }
        // Inserted last so a submitted field named `received_at` cannot
        // mask the server-side stamp.
        document.insert("received_at", message.received_at.to_rfc3339());

        let result = self
            .collection
            .insert_one(document, None)
            .await
            .map_err(classify_error)?;

        Ok(DocumentId::new(render_id(&result.inserted_id)))
    }
}

fn render_id(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}

fn classify_error(err: mongodb::error::Error) -> StoreError {
    match *err.kind {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) | ErrorKind::ConnectionPoolCleared { .. } => {
            StoreError::Unavailable(err.to_string())
        }
        _ => StoreError::Write(err.to_string()),
    }
}
