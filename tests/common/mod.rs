//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use message_relay::codec::{self, SubmittedRecord};
use message_relay::config::IngestConfig;
use message_relay::ingest::{IngestListener, IngestServer};
use message_relay::lifecycle::Shutdown;
use message_relay::store::{DocumentId, DocumentStore, MemoryStore, StoreError, StoredMessage};

/// Start an ingestion server on an ephemeral port with the given store.
pub async fn start_ingest_server(store: Arc<dyn DocumentStore>) -> (SocketAddr, Shutdown) {
    let config = IngestConfig {
        bind_address: "127.0.0.1:0".to_string(),
        ..IngestConfig::default()
    };
    let listener = IngestListener::bind(&config).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = IngestServer::new(config, store);
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        server.serve(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Raw client speaking the ingest wire protocol: length-prefixed
/// payloads out, newline-terminated acknowledgement tokens back.
#[allow(dead_code)]
pub struct IngestClient {
    pub reader: BufReader<OwnedReadHalf>,
    pub writer: OwnedWriteHalf,
}

#[allow(dead_code)]
impl IngestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }

    pub async fn send_record(&mut self, pairs: &[(&str, &str)]) {
        let payload = codec::encode(&record(pairs));
        self.send_payload(&payload).await;
    }

    pub async fn send_payload(&mut self, payload: &[u8]) {
        codec::write_frame(&mut self.writer, payload).await.unwrap();
    }

    /// Read one acknowledgement line; `None` when the server closed.
    pub async fn read_ack(&mut self) -> Option<String> {
        let mut line = String::new();
        let bytes_read = self.reader.read_line(&mut line).await.unwrap();
        if bytes_read == 0 {
            None
        } else {
            Some(line.trim_end().to_string())
        }
    }
}

#[allow(dead_code)]
pub fn record(pairs: &[(&str, &str)]) -> SubmittedRecord {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Store wrapper that fails the first N inserts, then delegates.
#[allow(dead_code)]
pub struct FailingStore {
    inner: Arc<MemoryStore>,
    failures_left: AtomicU32,
}

#[allow(dead_code)]
impl FailingStore {
    pub fn new(inner: Arc<MemoryStore>, failures: u32) -> Self {
        Self {
            inner,
            failures_left: AtomicU32::new(failures),
        }
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn insert(&self, message: StoredMessage) -> Result<DocumentId, StoreError> {
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StoreError::Write("injected failure".to_string()));
        }
        self.inner.insert(message).await
    }
}
