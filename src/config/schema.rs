//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files,
//! and every section has a complete `Default` so the service can start
//! without a config file at all.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the message relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Ingestion server settings (TCP listener).
    pub ingest: IngestConfig,

    /// HTTP front-end settings.
    pub http: HttpConfig,

    /// Submission bridge settings (HTTP → ingest forwarding).
    pub bridge: BridgeConfig,

    /// Document store settings.
    pub store: StoreConfig,
}

/// Ingestion server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Bind address for the TCP listener (e.g. "127.0.0.1:5000").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    /// Largest accepted wire payload in bytes.
    pub max_frame_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
            max_connections: 256,
            max_frame_bytes: 64 * 1024,
        }
    }
}

/// HTTP front-end configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address for the HTTP server (e.g. "127.0.0.1:3000").
    pub bind_address: String,

    /// Directory served for static assets (css, images).
    pub static_dir: String,

    /// Directory holding the HTML page templates.
    pub template_dir: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            static_dir: "static".to_string(),
            template_dir: "templates".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Submission bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Address of the ingestion server to forward submissions to.
    pub ingest_address: String,

    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// How long to wait for an acknowledgement, in seconds.
    pub ack_timeout_secs: u64,
}

impl BridgeConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_secs(self.ack_timeout_secs)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            ingest_address: "127.0.0.1:5000".to_string(),
            connect_timeout_secs: 5,
            ack_timeout_secs: 5,
        }
    }
}

/// Which document store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// MongoDB (production default).
    Mongodb,
    /// In-memory store for tests and local development.
    Memory,
}

/// Document store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Connection string for the document store.
    pub uri: String,

    pub database: String,

    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Mongodb,
            uri: "mongodb://localhost:27017".to_string(),
            database: "user_messages_db".to_string(),
            collection: "message".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: RelayConfig = toml::from_str("").unwrap();
        assert_eq!(config.ingest.bind_address, "127.0.0.1:5000");
        assert_eq!(config.store.backend, StoreBackend::Mongodb);
        assert_eq!(config.bridge.ingest_address, config.ingest.bind_address);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
            [store]
            backend = "memory"
            collection = "notes"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.collection, "notes");
        assert_eq!(config.store.database, "user_messages_db");
        assert_eq!(config.http.bind_address, "127.0.0.1:3000");
    }
}
