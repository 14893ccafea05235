//! Response body types
//!
//! [`DeliveryBody`] is the single body type returned by the file server. Streamed content is
//! produced by a separate task and handed over through a bounded, ordered channel created with
//! [`pipe`]: the producer waits while the connection is not ready to take more bytes, and a
//! producer failure arrives as an error frame so hyper aborts the response.

use hyper::body::{Body, Bytes, Frame, SizeHint};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// HTTP response body
#[derive(Debug)]
pub enum DeliveryBody {
    /// No body (304, 412, HEAD)
    Empty,
    /// In-memory body, e.g. rendered error or listing pages
    Full(Option<Bytes>),
    /// Bytes streamed from a producer task
    Pipe(mpsc::Receiver<io::Result<Bytes>>),
}

impl DeliveryBody {
    pub const fn empty() -> Self {
        Self::Empty
    }

    pub fn full(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        if data.is_empty() {
            Self::Empty
        } else {
            Self::Full(Some(data))
        }
    }
}

impl Default for DeliveryBody {
    fn default() -> Self {
        Self::Empty
    }
}

impl Body for DeliveryBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Empty => Poll::Ready(None),
            Self::Full(data) => Poll::Ready(data.take().map(|d| Ok(Frame::data(d)))),
            Self::Pipe(rx) => rx
                .poll_recv(cx)
                .map(|chunk| chunk.map(|result| result.map(Frame::data))),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Full(data) => data.is_none(),
            Self::Pipe(_) => false,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            Self::Empty => SizeHint::with_exact(0),
            Self::Full(data) => {
                SizeHint::with_exact(data.as_ref().map_or(0, |d| d.len() as u64))
            }
            Self::Pipe(_) => SizeHint::default(),
        }
    }
}

/// Writing half of a body pipe
#[derive(Debug)]
pub struct PipeWriter {
    tx: mpsc::Sender<io::Result<Bytes>>,
}

impl PipeWriter {
    /// Send a chunk, waiting while the pipe is full
    ///
    /// Fails with `BrokenPipe` once the body has been dropped (client went away).
    pub async fn write(&self, chunk: Bytes) -> io::Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.tx
            .send(Ok(chunk))
            .await
            .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))
    }

    /// Terminate the body with an error
    pub async fn fail(self, err: io::Error) {
        // Nobody is listening any more if this fails.
        let _ = self.tx.send(Err(err)).await;
    }
}

/// Create a bounded body pipe holding at most `capacity` chunks in flight
pub fn pipe(capacity: usize) -> (PipeWriter, DeliveryBody) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (PipeWriter { tx }, DeliveryBody::Pipe(rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_full_body() {
        let body = DeliveryBody::full("hello");
        assert_eq!(body.size_hint().exact(), Some(5));
        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn test_empty_body() {
        let body = DeliveryBody::full(Bytes::new());
        assert!(body.is_end_stream());
        let bytes = body.collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_pipe_preserves_order() {
        let (writer, body) = pipe(1);
        tokio::spawn(async move {
            for chunk in ["a", "bc", "", "def"] {
                writer.write(Bytes::from(chunk)).await.unwrap();
            }
        });
        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"abcdef");
    }

    #[tokio::test]
    async fn test_pipe_error_aborts_body() {
        let (writer, body) = pipe(4);
        tokio::spawn(async move {
            writer.write(Bytes::from_static(b"partial")).await.unwrap();
            writer
                .fail(io::Error::new(io::ErrorKind::UnexpectedEof, "short read"))
                .await;
        });
        let err = body.collect().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_write_after_body_dropped() {
        let (writer, body) = pipe(1);
        drop(body);
        let err = writer.write(Bytes::from_static(b"x")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
