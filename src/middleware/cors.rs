//! Allowlist CORS.
//!
//! Echoes the request origin only when it is on a fixed allowlist; never
//! emits a wildcard. Preflight requests are answered here and never reach
//! the wrapped service.

use std::collections::HashSet;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::Request;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ORIGIN, VARY,
};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use tower::{Layer, Service};

/// Value of `Access-Control-Allow-Methods`.
pub const ALLOWED_METHODS: &str = "GET, OPTIONS";

/// Value of `Access-Control-Allow-Headers`.
pub const ALLOWED_HEADERS: &str = "Content-Type";

/// Layer applying [`Cors`] with a fixed origin allowlist.
#[derive(Debug, Clone)]
pub struct CorsLayer {
    allowed: Arc<HashSet<String>>,
}

impl CorsLayer {
    pub fn new<I, O>(origins: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<String>,
    {
        Self {
            allowed: Arc::new(origins.into_iter().map(Into::into).collect()),
        }
    }
}

impl<S> Layer<S> for CorsLayer {
    type Service = Cors<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Cors {
            inner,
            allowed: self.allowed.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cors<S> {
    inner: S,
    allowed: Arc<HashSet<String>>,
}

impl<S> Cors<S> {
    /// The request's Origin, if it is on the allowlist.
    fn allowed_origin(&self, req: &Request) -> Option<HeaderValue> {
        let origin = req.headers().get(ORIGIN)?;
        let origin_str = origin.to_str().ok()?;
        self.allowed.contains(origin_str).then(|| origin.clone())
    }
}

impl<S> Service<Request> for Cors<S>
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
        let origin = self.allowed_origin(&req);

        if req.method() == Method::OPTIONS {
            let mut response = StatusCode::OK.into_response();
            apply_headers(&mut response, origin);
            return Box::pin(async move { Ok(response) });
        }

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let mut response = inner.call(req).await?;
            apply_headers(&mut response, origin);
            Ok(response)
        })
    }
}

fn apply_headers(response: &mut Response, origin: Option<HeaderValue>) {
    let headers = response.headers_mut();

    if let Some(origin) = origin {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.append(VARY, HeaderValue::from_static("Origin"));
    }
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
}
