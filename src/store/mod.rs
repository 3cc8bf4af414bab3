//! Document store adapter.
//!
//! # Data Flow
//! ```text
//! Decoded record (ingest layer)
//!     → StoredMessage (receipt timestamp stamped by the server)
//!     → DocumentStore::insert (one logical write)
//!     → DocumentId (opaque, store-assigned)
//! ```
//!
//! # Design Decisions
//! - One operation only: insert-and-return-id; retry policy, if any,
//!   belongs to the caller
//! - The adapter is safe to call from any number of connection tasks
//!   without external locking
//! - Backend is selected by config: MongoDB in production, the in-memory
//!   store for tests and local development

pub mod memory;
pub mod mongo;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::codec::SubmittedRecord;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// A record as persisted: the submitted fields plus the server-side
/// receipt timestamp. Written once, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    /// When the ingestion server received the record. Assigned at the
    /// moment of receipt, never by the client or the bridge.
    pub received_at: DateTime<Utc>,
    pub fields: SubmittedRecord,
}

impl StoredMessage {
    /// Stamp a freshly decoded record with the current server time.
    pub fn stamp(fields: SubmittedRecord) -> Self {
        Self {
            received_at: Utc::now(),
            fields,
        }
    }
}

/// Opaque identifier assigned by the store for a persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error taxonomy for the adapter. The caller decides whether to retry,
/// surface, or drop; the adapter never retries internally.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached at all.
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    /// The store was reached but rejected the write.
    #[error("document store rejected write: {0}")]
    Write(String),
}

/// Thin interface to a document-oriented database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist the message in a single logical write and return the
    /// identifier the store assigned to it.
    async fn insert(&self, message: StoredMessage) -> Result<DocumentId, StoreError>;
}
