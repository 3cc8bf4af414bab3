//! Message relay: HTTP form submissions forwarded over TCP to an
//! ingestion server that timestamps each record and persists it to a
//! document store.
//!
//! # Architecture Overview
//!
//! ```text
//!  Browser ──POST /message──▶ http ──▶ bridge ──TCP frame──▶ ingest
//!                                        ▲                     │
//!                                        └──── STORED/FAILED ──┘
//!                                                              │
//!                                                              ▼
//!                                                            store
//! ```

pub mod bridge;
pub mod codec;
pub mod config;
pub mod http;
pub mod ingest;
pub mod lifecycle;
pub mod store;

pub use bridge::Bridge;
pub use config::RelayConfig;
pub use http::HttpServer;
pub use ingest::IngestServer;
pub use lifecycle::Shutdown;
