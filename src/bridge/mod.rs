//! Submission bridge: the HTTP-facing side of the relay.
//!
//! # Data Flow
//! ```text
//! Form body (application/x-www-form-urlencoded bytes)
//!     → parse_form (strict key=value pairs → SubmittedRecord)
//!     → fresh TCP connection to the ingestion server
//!     → one encoded frame out, one acknowledgement line back
//!     → typed success/failure result for the HTTP layer
//! ```
//!
//! # Design Decisions
//! - One connection per submission; no reuse, nothing to pool
//! - A pair must contain exactly one `=`; a dangling key such as
//!   `name=Alice&bad` fails before any connection is opened
//! - The bridge never renders pages; the HTTP layer maps the typed
//!   error onto a user-visible response

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

use thiserror::Error;
use url::form_urlencoded;

use crate::codec::{self, FrameError, SubmittedRecord};
use crate::config::BridgeConfig;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The form body was not valid `key=value` pairs; nothing was sent.
    #[error("malformed form submission: {0}")]
    MalformedSubmission(String),
    /// Connecting to or talking to the ingestion server failed.
    #[error("ingestion server unreachable: {0}")]
    IngestionUnreachable(#[source] std::io::Error),
    /// No acknowledgement arrived within the configured wait.
    #[error("timed out waiting for ingestion acknowledgement")]
    IngestionTimeout,
    /// The server acknowledged the submission as not persisted.
    #[error("ingestion server rejected the submission")]
    IngestionRejected,
}

/// Forwards parsed submissions to the ingestion server.
#[derive(Debug, Clone)]
pub struct Bridge {
    config: BridgeConfig,
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Parse a form body and relay it, blocking for the acknowledgement.
    pub async fn submit(&self, body: &[u8]) -> Result<(), BridgeError> {
        let record = parse_form(body)?;
        self.forward(&record).await
    }

    /// Send one encoded record over a fresh TCP connection and wait for
    /// exactly one acknowledgement.
    pub async fn forward(&self, record: &SubmittedRecord) -> Result<(), BridgeError> {
        let connect = TcpStream::connect(self.config.ingest_address.as_str());
        let stream = timeout(self.config.connect_timeout(), connect)
            .await
            .map_err(|_| {
                BridgeError::IngestionUnreachable(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "connect timed out",
                ))
            })?
            .map_err(BridgeError::IngestionUnreachable)?;

        tracing::debug!(
            ingest_address = %self.config.ingest_address,
            fields = record.len(),
            "Forwarding submission"
        );

        let (read_half, mut write_half) = stream.into_split();

        let payload = codec::encode(record);
        codec::write_frame(&mut write_half, &payload)
            .await
            .map_err(|e| match e {
                FrameError::Io(io) => BridgeError::IngestionUnreachable(io),
                FrameError::Oversized { len, max } => BridgeError::MalformedSubmission(format!(
                    "encoded submission of {len} bytes exceeds the {max} byte frame limit"
                )),
            })?;

        let mut reader = BufReader::new(read_half);
        let mut line = String::new();
        let bytes_read = timeout(self.config.ack_timeout(), reader.read_line(&mut line))
            .await
            .map_err(|_| BridgeError::IngestionTimeout)?
            .map_err(BridgeError::IngestionUnreachable)?;

        if bytes_read == 0 {
            return Err(BridgeError::IngestionUnreachable(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed before acknowledgement",
            )));
        }

        match line.trim_end() {
            "STORED" => Ok(()),
            "FAILED" => Err(BridgeError::IngestionRejected),
            other => {
                tracing::warn!(token = other, "Unexpected acknowledgement token");
                Err(BridgeError::IngestionRejected)
            }
        }
    }
}

/// Parse form-encoded bytes into a record.
///
/// Strict by design: each `&`-separated pair must contain exactly one
/// literal `=` (values with `=` in them arrive percent-encoded). The
/// empty body is malformed rather than an empty record. Duplicate keys
/// keep the last value.
pub fn parse_form(body: &[u8]) -> Result<SubmittedRecord, BridgeError> {
    let text = std::str::from_utf8(body)
        .map_err(|_| BridgeError::MalformedSubmission("body is not valid UTF-8".to_string()))?;

    let mut record = SubmittedRecord::new();
    for pair in text.split('&') {
        if pair.bytes().filter(|b| *b == b'=').count() != 1 {
            return Err(BridgeError::MalformedSubmission(format!(
                "pair `{pair}` must contain exactly one `=`"
            )));
        }
        // Exactly one pair by construction.
        if let Some((key, value)) = form_urlencoded::parse(pair.as_bytes()).next() {
            record.insert(key.into_owned(), value.into_owned());
        }
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_form() {
        let record = parse_form(b"name=Alice&msg=Hello+World").unwrap();
        assert_eq!(record.get("name").map(String::as_str), Some("Alice"));
        assert_eq!(record.get("msg").map(String::as_str), Some("Hello World"));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn decodes_percent_escapes() {
        let record = parse_form(b"msg=a%3Db%26c%20d%E2%98%83").unwrap();
        assert_eq!(record.get("msg").map(String::as_str), Some("a=b&c d☃"));
    }

    #[test]
    fn allows_empty_value() {
        let record = parse_form(b"name=").unwrap();
        assert_eq!(record.get("name").map(String::as_str), Some(""));
    }

    #[test]
    fn last_duplicate_key_wins() {
        let record = parse_form(b"k=first&k=second").unwrap();
        assert_eq!(record.get("k").map(String::as_str), Some("second"));
    }

    #[test]
    fn rejects_pair_without_separator() {
        let err = parse_form(b"name=Alice&bad").unwrap_err();
        assert!(matches!(err, BridgeError::MalformedSubmission(_)));
    }

    #[test]
    fn rejects_pair_with_two_separators() {
        let err = parse_form(b"a=b=c").unwrap_err();
        assert!(matches!(err, BridgeError::MalformedSubmission(_)));
    }

    #[test]
    fn rejects_empty_body() {
        let err = parse_form(b"").unwrap_err();
        assert!(matches!(err, BridgeError::MalformedSubmission(_)));
    }

    #[test]
    fn rejects_non_utf8_body() {
        let err = parse_form(&[b'a', b'=', 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, BridgeError::MalformedSubmission(_)));
    }
}
