//! Ingestion server subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (per-connection receive loop)
//!         read frame → decode → stamp received_at → store insert → ack
//!     → tracker.rs (drain accounting for graceful shutdown)
//!
//! Connection states:
//!     Listening → Connected → Receiving → Persisting → Receiving → Closing
//! ```
//!
//! # Design Decisions
//! - One task per accepted connection; a blocked read or store call
//!   never stalls acceptance of other connections
//! - Malformed payloads are logged and skipped without an ack; the
//!   connection stays open for the next payload
//! - A store failure is acked as `FAILED` and does not tear the
//!   connection down
//! - Shutdown stops accepting immediately and lets in-flight cycles
//!   finish before the listener task returns

pub mod connection;
pub mod listener;
pub mod tracker;

use std::sync::Arc;

use crate::config::IngestConfig;
use crate::ingest::connection::ConnectionHandler;
use crate::ingest::tracker::ConnectionTracker;
use crate::lifecycle::Shutdown;
use crate::store::DocumentStore;

pub use listener::{IngestListener, ListenerError};

/// Long-lived TCP listener that ingests submitted records.
pub struct IngestServer {
    config: IngestConfig,
    store: Arc<dyn DocumentStore>,
}

impl IngestServer {
    pub fn new(config: IngestConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self { config, store }
    }

    /// Serve on an already-bound listener until shutdown.
    ///
    /// The listener is bound by the caller so bind failures surface at
    /// startup and tests can use an ephemeral port.
    pub async fn serve(self, listener: IngestListener, shutdown: Shutdown) {
        let tracker = ConnectionTracker::new();
        let mut shutdown_rx = shutdown.subscribe();

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                accepted = listener.accept() => {
                    let (stream, peer, permit) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };

                    let guard = tracker.track();
                    let handler = ConnectionHandler::new(
                        stream,
                        peer,
                        guard.id(),
                        Arc::clone(&self.store),
                        self.config.max_frame_bytes,
                        shutdown.subscribe(),
                    );

                    tokio::spawn(async move {
                        handler.run().await;
                        drop(guard);
                        drop(permit);
                    });
                }
            }
        }

        tracing::info!(
            active_connections = tracker.active_count(),
            "Ingest listener stopped accepting, draining connections"
        );
        tracker.wait_for_drain().await;
        tracing::info!("Ingest server shut down");
    }
}
