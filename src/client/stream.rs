//! Line streams delivered by a [`Transport`](super::Transport).
//!
//! A [`LineStream`] yields the response body of a streaming GET one line at a
//! time, as bytes arrive. It implements [`Stream`], and also offers an inherent
//! async [`next`](LineStream::next) for simple loops.
//!
//! # Lifecycle
//!
//! 1. Created by [`Transport::open_stream`](super::Transport::open_stream)
//! 2. Drained through `next().await` until it returns `None`
//! 3. Dropping it at any point closes the underlying connection
//!
//! # Examples
//!
//! ```
//! use couchrest::client::LineStream;
//!
//! # tokio_test::block_on(async {
//! let mut lines = LineStream::from_lines(["{\"a\":1}\n", "]}\n"]);
//! assert_eq!(lines.next().await.unwrap().unwrap(), "{\"a\":1}\n");
//! assert_eq!(lines.next().await.unwrap().unwrap(), "]}\n");
//! assert!(lines.next().await.is_none());
//! # });
//! ```

use crate::error::Result;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// A stream of text lines read from an open HTTP response.
///
/// Each item is one line including its terminator, or the transport error
/// that ended the stream.
pub struct LineStream {
    inner: BoxStream<'static, Result<String>>,
}

impl LineStream {
    /// Wrap the receiving end of a reader task's channel.
    ///
    /// The reader task notices the receiver was dropped on its next send and
    /// stops, releasing the connection it holds.
    pub fn from_receiver(receiver: mpsc::Receiver<Result<String>>) -> Self {
        LineStream {
            inner: ReceiverStream::new(receiver).boxed(),
        }
    }

    /// Wrap any stream of lines
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<String>> + Send + 'static,
    {
        LineStream {
            inner: stream.boxed(),
        }
    }

    /// A stream over fixed lines, mostly useful for tests and fixtures
    pub fn from_lines<I, T>(lines: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let lines: Vec<Result<String>> = lines.into_iter().map(|l| Ok(l.into())).collect();
        Self::from_stream(tokio_stream::iter(lines))
    }

    /// Receive the next line.
    ///
    /// - `Some(Ok(line))` - a complete line (or the final unterminated tail)
    /// - `Some(Err(e))` - the transport failed mid-body
    /// - `None` - the body ended
    pub async fn next(&mut self) -> Option<Result<String>> {
        self.inner.next().await
    }
}

impl Stream for LineStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for LineStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineStream").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CouchError;

    #[tokio::test]
    async fn test_from_receiver() {
        let (tx, rx) = mpsc::channel(4);
        let mut lines = LineStream::from_receiver(rx);

        tx.send(Ok("first\n".to_string())).await.unwrap();
        tx.send(Err(CouchError::StreamClosed)).await.unwrap();
        drop(tx);

        assert_eq!(lines.next().await.unwrap().unwrap(), "first\n");
        assert!(matches!(lines.next().await, Some(Err(CouchError::StreamClosed))));
        assert!(lines.next().await.is_none());
    }

    #[tokio::test]
    async fn test_drop_closes_channel() {
        let (tx, rx) = mpsc::channel::<Result<String>>(1);
        let lines = LineStream::from_receiver(rx);
        drop(lines);
        assert!(tx.send(Ok("late".to_string())).await.is_err());
    }
}
