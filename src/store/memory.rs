//! In-memory document store.
//!
//! Backs the integration tests and the `backend = "memory"` config
//! option for running the service without a database.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::store::{DocumentId, DocumentStore, StoreError, StoredMessage};

#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<Vec<(DocumentId, StoredMessage)>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything persisted so far, in insertion order.
    pub async fn documents(&self) -> Vec<(DocumentId, StoredMessage)> {
        self.documents.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.lock().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, message: StoredMessage) -> Result<DocumentId, StoreError> {
        let id = DocumentId::new(format!("mem-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1));
        self.documents.lock().await.push((id.clone(), message));
        Ok(id)
    }
}
