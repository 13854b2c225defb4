//! Newline-delimited framing over any async byte stream.
//!
//! [`FrameReader`] buffers partial reads until a full line is available,
//! so callers always see whole frames. [`FrameWriter`] appends the
//! delimiter. Both are generic over the underlying half so tests can run
//! them over `tokio::io::duplex` instead of a socket.

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};

use crate::TransportError;

/// Largest frame accepted in either direction (1 MiB).
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Reading half: yields one frame per line.
pub struct FrameReader<R> {
    inner: FramedRead<R, LinesCodec>,
}

impl<R> FrameReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Wraps a byte stream.
    pub fn new(reader: R) -> Self {
        Self {
            inner: FramedRead::new(
                reader,
                LinesCodec::new_with_max_length(MAX_FRAME_LEN),
            ),
        }
    }

    /// Receives the next frame.
    ///
    /// Returns `Ok(None)` when the peer closed the stream cleanly. Blank
    /// lines are skipped.
    pub async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        loop {
            match self.inner.next().await {
                Some(Ok(line)) if line.trim().is_empty() => continue,
                Some(Ok(line)) => return Ok(Some(line.into_bytes())),
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    return Err(TransportError::FrameTooLong {
                        limit: MAX_FRAME_LEN,
                    });
                }
                Some(Err(LinesCodecError::Io(e))) => {
                    return Err(TransportError::ReceiveFailed(e));
                }
                None => return Ok(None),
            }
        }
    }
}

/// Writing half: sends one frame per line.
pub struct FrameWriter<W> {
    inner: FramedWrite<W, LinesCodec>,
}

impl<W> FrameWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Wraps a byte sink.
    pub fn new(writer: W) -> Self {
        Self {
            inner: FramedWrite::new(
                writer,
                LinesCodec::new_with_max_length(MAX_FRAME_LEN),
            ),
        }
    }

    /// Writes one frame and flushes it.
    pub async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if data.len() > MAX_FRAME_LEN {
            return Err(TransportError::FrameTooLong {
                limit: MAX_FRAME_LEN,
            });
        }
        if data.contains(&b'\n') {
            return Err(TransportError::InvalidFrame(
                "frame contains a line delimiter".into(),
            ));
        }
        let line = std::str::from_utf8(data).map_err(|e| {
            TransportError::InvalidFrame(format!("frame is not UTF-8: {e}"))
        })?;

        self.inner.send(line).await.map_err(|e| match e {
            LinesCodecError::Io(e) => TransportError::SendFailed(e),
            LinesCodecError::MaxLineLengthExceeded => {
                TransportError::FrameTooLong {
                    limit: MAX_FRAME_LEN,
                }
            }
        })
    }

    /// Flushes pending data and shuts the write side down.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        SinkExt::<&str>::close(&mut self.inner)
            .await
            .map_err(|e| match e {
                LinesCodecError::Io(e) => TransportError::SendFailed(e),
                LinesCodecError::MaxLineLengthExceeded => {
                    TransportError::FrameTooLong {
                        limit: MAX_FRAME_LEN,
                    }
                }
            })
    }
}
