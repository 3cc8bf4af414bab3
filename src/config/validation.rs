//! Configuration validation.
//!
//! Semantic checks on top of serde's syntactic ones: addresses must
//! parse as socket addresses, limits and timeouts must be non-zero.
//! Returns all validation errors, not just the first.

use std::net::SocketAddr;

use crate::config::schema::RelayConfig;

/// One semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a parsed configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "ingest.bind_address", &config.ingest.bind_address);
    check_addr(&mut errors, "http.bind_address", &config.http.bind_address);
    check_addr(&mut errors, "bridge.ingest_address", &config.bridge.ingest_address);

    if config.ingest.max_connections == 0 {
        push(&mut errors, "ingest.max_connections", "must be greater than zero");
    }
    if config.ingest.max_frame_bytes < 1024 {
        push(&mut errors, "ingest.max_frame_bytes", "must be at least 1024");
    }
    if config.bridge.connect_timeout_secs == 0 {
        push(&mut errors, "bridge.connect_timeout_secs", "must be greater than zero");
    }
    if config.bridge.ack_timeout_secs == 0 {
        push(&mut errors, "bridge.ack_timeout_secs", "must be greater than zero");
    }
    if config.http.request_timeout_secs == 0 {
        push(&mut errors, "http.request_timeout_secs", "must be greater than zero");
    }
    if config.store.uri.is_empty() {
        push(&mut errors, "store.uri", "must not be empty");
    }
    if config.store.database.is_empty() {
        push(&mut errors, "store.database", "must not be empty");
    }
    if config.store.collection.is_empty() {
        push(&mut errors, "store.collection", "must not be empty");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field,
            message: format!("`{value}` is not a valid socket address"),
        });
    }
}

fn push(errors: &mut Vec<ValidationError>, field: &'static str, message: &str) {
    errors.push(ValidationError {
        field,
        message: message.to_string(),
    });
}
