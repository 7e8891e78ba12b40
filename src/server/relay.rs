//! Byte-level pass-through from the upstream body to the outbound body
//!
//! The upstream response is never collected: each chunk reqwest yields is
//! handed to axum as soon as it arrives, so memory use is bounded by the
//! size of one chunk. Nothing is added before, between, or after the
//! upstream bytes.
//!
//! Once the first byte has been sent the status line and headers are
//! committed. An upstream failure after that point is surfaced by ending
//! the outbound body with an error, which aborts the connection and shows
//! up on the client as a read failure.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use futures::Stream;

use crate::mode::Mode;

/// `Content-Type` of every relayed body
pub const STREAM_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Build the streaming response for an upstream reply already known to be
/// successful
///
/// # Errors
///
/// Returns an error only if the response itself cannot be assembled
pub fn relay(mode: Mode, upstream: reqwest::Response) -> Result<Response, axum::http::Error> {
    let stream = RelayStream::new(mode, Box::pin(upstream.bytes_stream()));
    relay_stream(mode, stream)
}

/// Build the streaming response around any byte stream
pub(crate) fn relay_stream<S, E>(mode: Mode, stream: S) -> Result<Response, axum::http::Error>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<axum::BoxError>,
{
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, HeaderValue::from_static(STREAM_CONTENT_TYPE));

    if mode.sets_keep_alive_headers() {
        builder = builder
            .header(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"))
            .header(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    }

    builder.body(Body::from_stream(stream))
}

/// Upstream body wrapper that logs how the transfer ended
struct RelayStream {
    mode: Mode,
    inner: ByteStream,
    relayed: usize,
    finished: bool,
}

impl RelayStream {
    fn new(mode: Mode, inner: ByteStream) -> Self {
        Self {
            mode,
            inner,
            relayed: 0,
            finished: false,
        }
    }
}

impl Stream for RelayStream {
    type Item = Result<Bytes, reqwest::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        let polled = self.inner.as_mut().poll_next(cx);
        match &polled {
            Poll::Ready(Some(Ok(chunk))) => {
                self.relayed += chunk.len();
            }
            Poll::Ready(Some(Err(e))) => {
                tracing::warn!(
                    "Upstream {} stream failed after {} bytes: {}",
                    self.mode,
                    self.relayed,
                    e
                );
                self.finished = true;
            }
            Poll::Ready(None) => {
                tracing::debug!(
                    "Upstream {} stream completed: {} bytes relayed",
                    self.mode,
                    self.relayed
                );
                self.finished = true;
            }
            Poll::Pending => {}
        }
        polled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
        futures::stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::from_static(p.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn test_relay_chat_headers() {
        let response = relay_stream(Mode::Chat, chunks(&["Hi"])).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], STREAM_CONTENT_TYPE);
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers[header::CONNECTION], "keep-alive");
    }

    #[tokio::test]
    async fn test_relay_tools_headers() {
        let response = relay_stream(Mode::Tools, chunks(&["Hi"])).unwrap();
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], STREAM_CONTENT_TYPE);
        assert!(headers.get(header::CACHE_CONTROL).is_none());
        assert!(headers.get(header::CONNECTION).is_none());
    }

    #[tokio::test]
    async fn test_relay_preserves_bytes_and_order() {
        let response = relay_stream(Mode::Chat, chunks(&["Hi", " there", "!"])).unwrap();
        let frames: Vec<Bytes> = response
            .into_body()
            .into_data_stream()
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;
        assert_eq!(
            frames,
            vec![
                Bytes::from_static(b"Hi"),
                Bytes::from_static(b" there"),
                Bytes::from_static(b"!")
            ]
        );
    }

    #[tokio::test]
    async fn test_relay_empty_stream_is_empty_body() {
        let response = relay_stream(Mode::Tools, chunks(&[])).unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_relay_surfaces_mid_stream_error() {
        let stream = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "upstream reset",
            )),
        ]);
        let response = relay_stream(Mode::Chat, stream).unwrap();
        let mut body = response.into_body().into_data_stream();

        let first = body.next().await.unwrap().unwrap();
        assert_eq!(first, Bytes::from_static(b"partial"));
        assert!(body.next().await.unwrap().is_err());
    }
}
