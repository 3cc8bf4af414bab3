//! Bounded TCP listener for the ingestion server.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections
//! - Enforce `max_connections` via a semaphore
//!
//! The listening socket is exclusively owned here; accepted streams are
//! handed off to a per-connection task together with a permit that
//! releases the slot when the connection closes.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::IngestConfig;

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind ingest listener: {0}")]
    Bind(#[source] std::io::Error),
    #[error("failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),
}

/// TCP listener that limits concurrent connections.
///
/// When the limit is reached, `accept` waits for a slot instead of
/// accepting more work than the server is configured to carry.
pub struct IngestListener {
    inner: TcpListener,
    connection_limit: Arc<Semaphore>,
}

impl IngestListener {
    pub async fn bind(config: &IngestConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
            ListenerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;

        let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            max_connections = config.max_connections,
            "Ingest listener bound"
        );

        Ok(Self {
            inner: listener,
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
        })
    }

    /// Accept the next connection, waiting if the limit is reached.
    ///
    /// The returned permit must be held for the connection's lifetime;
    /// dropping it releases the slot even if the handler panics.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ConnectionPermit), ListenerError> {
        // The semaphore is never closed, so acquire can only fail after
        // a programming error; surface it as an accept failure.
        let permit = self
            .connection_limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| {
                ListenerError::Accept(std::io::Error::new(std::io::ErrorKind::Other, e))
            })?;

        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(
            peer_addr = %addr,
            available_permits = self.connection_limit.available_permits(),
            "Connection accepted"
        );

        Ok((stream, addr, ConnectionPermit { _permit: permit }))
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    pub fn available_permits(&self) -> usize {
        self.connection_limit.available_permits()
    }
}

/// A held connection slot; dropping it frees the slot.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: OwnedSemaphorePermit,
}
