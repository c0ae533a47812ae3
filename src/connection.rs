use std::io;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

use crate::protocol::frame::{self, FrameError, MAX_FRAME_LEN};

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("connection reset by peer")]
    Reset,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Frame reader/writer over a byte stream.
///
/// Incoming bytes accumulate in `buffer` until the declared `<LEN>` of the
/// frame at its head is available, so frames may arrive split across reads
/// or several to one read.
#[derive(Debug)]
pub struct Connection<S = TcpStream> {
    stream: BufWriter<S>,
    buffer: BytesMut,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Connection<S> {
        Connection {
            stream: BufWriter::new(stream),
            buffer: BytesMut::with_capacity(MAX_FRAME_LEN + 1),
        }
    }

    /// Read the next complete frame.
    ///
    /// Returns `None` when the peer closes the stream on a frame boundary.
    pub async fn read_frame(&mut self) -> Result<Option<String>, ConnectionError> {
        loop {
            if let Some(frame) = self.parse_frame()? {
                return Ok(Some(frame));
            }

            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                if self.buffer.is_empty() {
                    return Ok(None);
                } else {
                    return Err(ConnectionError::Reset);
                }
            }
        }
    }

    fn parse_frame(&mut self) -> Result<Option<String>, FrameError> {
        match frame::check(&self.buffer) {
            Ok(len) => {
                let bytes = self.buffer.split_to(len);
                let frame = String::from_utf8(bytes.to_vec())
                    .map_err(|_| FrameError::malformed("frame is not valid UTF-8"))?;
                Ok(Some(frame))
            }
            Err(FrameError::Incomplete) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Write a full frame and flush it
    pub async fn write_frame(&mut self, frame: &str) -> io::Result<()> {
        self.stream.write_all(frame.as_bytes()).await?;
        self.stream.flush().await
    }
}
