//! Gzip response compression.
//!
//! Compresses response bodies when the client advertises gzip support. The
//! body is re-encoded as a stream, so large files are never buffered whole.

use std::io;
use std::task::{Context, Poll};

use async_compression::tokio::bufread::GzipEncoder;
use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_RANGE, VARY};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::Response;
use futures::future::BoxFuture;
use futures::TryStreamExt;
use tokio_util::io::{ReaderStream, StreamReader};
use tower::{Layer, Service};
use tracing::trace;

/// Layer applying [`Gzip`] to a service.
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipLayer;

impl<S> Layer<S> for GzipLayer {
    type Service = Gzip<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Gzip { inner }
    }
}

/// Service wrapper that gzips responses for clients accepting gzip.
#[derive(Debug, Clone)]
pub struct Gzip<S> {
    inner: S,
}

impl<S> Service<Request> for Gzip<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let negotiated = accepts_gzip(req.headers()) && req.method() != Method::HEAD;

        // Take the service that was driven to readiness
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let response = inner.call(req).await?;

            if !negotiated || !has_body(&response) {
                return Ok(response);
            }

            // Downstream already chose an encoding
            if response.headers().contains_key(CONTENT_ENCODING) {
                trace!("response already encoded, skipping gzip");
                return Ok(response);
            }

            // Content-Range offsets refer to the identity bytes
            if is_partial(&response) {
                trace!("partial content, skipping gzip");
                return Ok(response);
            }

            Ok(compress(response))
        })
    }
}

/// Case-insensitive substring match for `gzip` in any Accept-Encoding value.
fn accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get_all(ACCEPT_ENCODING)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.to_ascii_lowercase().contains("gzip"))
}

fn has_body(response: &Response) -> bool {
    !matches!(
        response.status(),
        StatusCode::NO_CONTENT | StatusCode::NOT_MODIFIED
    )
}

fn is_partial(response: &Response) -> bool {
    response.status() == StatusCode::PARTIAL_CONTENT || response.headers().contains_key(CONTENT_RANGE)
}

/// Swaps the body for a streaming gzip encoder over the downstream body.
///
/// The encoder writes the gzip trailer when the source body ends. If the
/// response is dropped early (client gone, downstream error) the encoder is
/// dropped with it.
fn compress(response: Response) -> Response {
    let (mut parts, body) = response.into_parts();

    parts
        .headers
        .insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    parts
        .headers
        .append(VARY, HeaderValue::from_static("Accept-Encoding"));
    parts.headers.remove(CONTENT_LENGTH);

    let source = body.into_data_stream().map_err(io::Error::other);
    let encoder = GzipEncoder::new(StreamReader::new(source));
    let body = Body::from_stream(ReaderStream::new(encoder));

    Response::from_parts(parts, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{boxed, Handler};
    use async_compression::tokio::bufread::GzipDecoder;
    use axum::http::header::CONTENT_TYPE;
    use axum::response::IntoResponse;
    use std::convert::Infallible;
    use tokio::io::AsyncReadExt;
    use tower::{service_fn, ServiceExt};

    const TEXT: &str = "the quick brown fox jumps over the lazy dog. ";

    fn downstream() -> Handler {
        boxed(service_fn(|_req: Request| async {
            Ok::<_, Infallible>(([(CONTENT_TYPE, "text/plain")], TEXT.repeat(200)).into_response())
        }))
    }

    fn request(accept: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/");
        if let Some(accept) = accept {
            builder = builder.header(ACCEPT_ENCODING, accept);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn gunzip(bytes: &[u8]) -> String {
        let mut decoder = GzipDecoder::new(bytes);
        let mut out = String::new();
        decoder.read_to_string(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn test_gzip_when_accepted() {
        let service = GzipLayer.layer(downstream());

        let response = service.oneshot(request(Some("gzip, deflate"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_ENCODING], "gzip");
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(response.headers()[VARY], "Accept-Encoding");
        assert!(response.headers().get(CONTENT_LENGTH).is_none());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.len() < TEXT.len() * 200);
        assert_eq!(gunzip(&body).await, TEXT.repeat(200));
    }

    #[tokio::test]
    async fn test_accept_encoding_is_case_insensitive() {
        let service = GzipLayer.layer(downstream());

        let response = service.oneshot(request(Some("br, GZIP;q=0.5"))).await.unwrap();

        assert_eq!(response.headers()[CONTENT_ENCODING], "gzip");
    }

    #[tokio::test]
    async fn test_passthrough_without_gzip() {
        for accept in [None, Some("deflate, br"), Some("identity")] {
            let service = GzipLayer.layer(downstream());

            let response = service.oneshot(request(accept)).await.unwrap();

            assert!(response.headers().get(CONTENT_ENCODING).is_none());
            assert!(response.headers().get(VARY).is_none());
            let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert_eq!(body, TEXT.repeat(200).as_bytes());
        }
    }

    #[tokio::test]
    async fn test_status_passes_through() {
        let inner = boxed(service_fn(|_req: Request| async {
            Ok::<_, Infallible>((StatusCode::NOT_FOUND, "missing").into_response())
        }));
        let service = GzipLayer.layer(inner);

        let response = service.oneshot(request(Some("gzip"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(gunzip(&body).await, "missing");
    }

    #[tokio::test]
    async fn test_does_not_double_encode() {
        let inner = boxed(service_fn(|_req: Request| async {
            Ok::<_, Infallible>(([(CONTENT_ENCODING, "br")], "already-brotli").into_response())
        }));
        let service = GzipLayer.layer(inner);

        let response = service.oneshot(request(Some("gzip, br"))).await.unwrap();

        assert_eq!(response.headers()[CONTENT_ENCODING], "br");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, "already-brotli");
    }

    #[tokio::test]
    async fn test_partial_content_is_not_compressed() {
        let inner = boxed(service_fn(|_req: Request| async {
            Ok::<_, Infallible>(
                (
                    StatusCode::PARTIAL_CONTENT,
                    [(CONTENT_RANGE, "bytes 0-9/1000")],
                    "0123456789",
                )
                    .into_response(),
            )
        }));
        let service = GzipLayer.layer(inner);

        let response = service.oneshot(request(Some("gzip"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert!(response.headers().get(CONTENT_ENCODING).is_none());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, "0123456789");
    }

    #[tokio::test]
    async fn test_keeps_existing_vary() {
        let inner = boxed(service_fn(|_req: Request| async {
            Ok::<_, Infallible>(([(VARY, "Origin")], TEXT).into_response())
        }));
        let service = GzipLayer.layer(inner);

        let response = service.oneshot(request(Some("gzip"))).await.unwrap();

        let vary: Vec<&str> = response
            .headers()
            .get_all(VARY)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(vary, ["Origin", "Accept-Encoding"]);
    }

    #[tokio::test]
    async fn test_empty_body_is_valid_gzip() {
        let inner = boxed(service_fn(|_req: Request| async {
            Ok::<_, Infallible>(StatusCode::OK.into_response())
        }));
        let service = GzipLayer.layer(inner);

        let response = service.oneshot(request(Some("gzip"))).await.unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(!body.is_empty());
        assert_eq!(gunzip(&body).await, "");
    }
}
