//! Per-connection receive loop.
//!
//! Each accepted connection is exclusively owned by one handler task.
//! Payloads are processed strictly in receipt order: the acknowledgement
//! for payload N is written before payload N+1 is read.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::broadcast;

use crate::codec::{self, ACK_FAILED, ACK_STORED};
use crate::ingest::tracker::ConnectionId;
use crate::store::{DocumentStore, StoredMessage};

pub struct ConnectionHandler {
    stream: TcpStream,
    peer: SocketAddr,
    id: ConnectionId,
    store: Arc<dyn DocumentStore>,
    max_frame_bytes: usize,
    shutdown: broadcast::Receiver<()>,
}

impl ConnectionHandler {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        id: ConnectionId,
        store: Arc<dyn DocumentStore>,
        max_frame_bytes: usize,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            stream,
            peer,
            id,
            store,
            max_frame_bytes,
            shutdown,
        }
    }

    /// Run the receive loop until the peer closes, an unrecoverable
    /// read error occurs, or shutdown is signalled between cycles.
    ///
    /// Shutdown is only observed while waiting for the next frame, so a
    /// cycle that has started reading a payload always finishes its
    /// persist and acknowledgement before the connection closes.
    pub async fn run(mut self) {
        tracing::debug!(connection_id = %self.id, peer_addr = %self.peer, "Connection opened");

        loop {
            let payload = tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::debug!(connection_id = %self.id, "Closing connection for shutdown");
                    break;
                }
                read = codec::read_frame(&mut self.stream, self.max_frame_bytes) => match read {
                    Ok(Some(payload)) => payload,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(
                            connection_id = %self.id,
                            peer_addr = %self.peer,
                            error = %e,
                            "Unrecoverable read error, closing connection"
                        );
                        break;
                    }
                }
            };

            // Malformed input is not fatal: drop the payload, send no
            // ack, and stay available for the next frame.
            let record = match codec::decode(&payload) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(
                        connection_id = %self.id,
                        peer_addr = %self.peer,
                        error = %e,
                        "Rejected malformed payload"
                    );
                    continue;
                }
            };

            let message = StoredMessage::stamp(record);
            let ack = match self.store.insert(message).await {
                Ok(document_id) => {
                    tracing::info!(
                        connection_id = %self.id,
                        document_id = %document_id,
                        "Message persisted"
                    );
                    ACK_STORED
                }
                Err(e) => {
                    tracing::error!(
                        connection_id = %self.id,
                        error = %e,
                        "Failed to persist message"
                    );
                    ACK_FAILED
                }
            };

            if let Err(e) = self.stream.write_all(ack).await {
                tracing::warn!(
                    connection_id = %self.id,
                    peer_addr = %self.peer,
                    error = %e,
                    "Failed to write acknowledgement, closing connection"
                );
                break;
            }
        }

        tracing::debug!(connection_id = %self.id, peer_addr = %self.peer, "Connection closed");
    }
}
