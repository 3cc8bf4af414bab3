//! HTTP front end.
//!
//! # Data Flow
//! ```text
//! Browser request
//!     → server.rs (Axum router, trace + timeout middleware)
//!     → GET /            → templates/index.html
//!     → GET /message     → templates/message.html
//!     → POST /message    → bridge → redirect to / (or error page)
//!     → anything else    → static dir, 404 error page when absent
//! ```
//!
//! The core pipeline never renders pages; this layer maps the bridge's
//! typed results onto user-visible responses.

pub mod server;

pub use server::HttpServer;
