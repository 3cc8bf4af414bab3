//! Frame and acknowledgement layer of the wire protocol.
//!
//! TCP gives a byte stream with no message boundaries, so every payload
//! is preceded by a 4-byte big-endian length. Acknowledgements flow the
//! other way as single newline-terminated tokens.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Acknowledgement sent after a payload was decoded and persisted.
pub const ACK_STORED: &[u8] = b"STORED\n";

/// Acknowledgement sent when the document store refused the write.
pub const ACK_FAILED: &[u8] = b"FAILED\n";

/// Error at the framing layer. Unlike a [`DecodeError`](super::DecodeError),
/// a framing error leaves the stream position ambiguous, so callers must
/// close the connection.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("i/o error: {0}")]
    Io(#[source] std::io::Error),
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    Oversized { len: usize, max: usize },
}

/// Read one length-prefixed payload from the stream.
///
/// Returns `Ok(None)` when the peer closed the connection at a frame
/// boundary. An oversized length prefix is an error: the payload cannot
/// be skipped without reading it, so the stream is unrecoverable.
pub async fn read_frame<R>(reader: &mut R, max_frame_bytes: usize) -> Result<Option<Vec<u8>>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(FrameError::Io(e)),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max_frame_bytes {
        return Err(FrameError::Oversized {
            len,
            max: max_frame_bytes,
        });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(FrameError::Io)?;
    Ok(Some(payload))
}

/// Write one length-prefixed payload to the stream.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::Oversized {
        len: payload.len(),
        max: u32::MAX as usize,
    })?;

    writer
        .write_all(&len.to_be_bytes())
        .await
        .map_err(FrameError::Io)?;
    writer.write_all(payload).await.map_err(FrameError::Io)?;
    writer.flush().await.map_err(FrameError::Io)
}
