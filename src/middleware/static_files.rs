//! Static file handler.
//!
//! Resolves request paths under a root directory with this precedence:
//! exact file, directory `index.html`, `<path>.html`, then the custom
//! `404.html`. Paths that would climb above the root are not found.
//! Directory listings are never produced.

use std::convert::Infallible;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{CONTENT_TYPE, LOCATION, X_CONTENT_TYPE_OPTIONS};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use tower::{Service, ServiceExt};
use tower_http::services::ServeFile;
use tracing::debug;

const NOT_FOUND_PAGE: &str = "404.html";
const INDEX_PAGE: &str = "index.html";

/// Terminal service serving files from a root directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: Arc<PathBuf>,
}

enum Resolved {
    File(PathBuf),
    /// Directory with an index, requested without the trailing slash
    Redirect(String),
    NotFound,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
        }
    }

    async fn resolve(&self, raw_path: &str, query: Option<&str>) -> Resolved {
        let Some(relative) = normalize(raw_path) else {
            debug!(path = raw_path, "rejected static path");
            return Resolved::NotFound;
        };

        let full = self.root.join(&relative);

        if let Ok(meta) = tokio::fs::metadata(&full).await {
            if meta.is_file() {
                return Resolved::File(full);
            }
            if meta.is_dir() {
                let index = full.join(INDEX_PAGE);
                if is_file(&index).await {
                    if !raw_path.ends_with('/') {
                        return Resolved::Redirect(redirect_target(&relative, query));
                    }
                    return Resolved::File(index);
                }
            }
        }

        // The root itself has no `.html` sibling to fall back to
        if relative.as_os_str().is_empty() {
            return Resolved::NotFound;
        }

        let html = with_html_suffix(&full);
        if is_file(&html).await {
            return Resolved::File(html);
        }

        Resolved::NotFound
    }
}

impl Service<Request> for StaticFiles {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let this = self.clone();
        let path = req.uri().path().to_owned();
        let query = req.uri().query().map(str::to_owned);

        Box::pin(async move {
            let response = match this.resolve(&path, query.as_deref()).await {
                Resolved::File(path) => {
                    // ServeFile picks the Content-Type from the extension
                    let served = ServeFile::new(path).oneshot(req).await?;
                    served.map(Body::new)
                }
                Resolved::Redirect(location) => {
                    (StatusCode::MOVED_PERMANENTLY, [(LOCATION, location)]).into_response()
                }
                Resolved::NotFound => not_found(&this.root).await,
            };
            Ok(response)
        })
    }
}

/// The custom `404.html` from `root`, or a plain-text fallback.
pub async fn not_found(root: &Path) -> Response {
    match tokio::fs::read(root.join(NOT_FOUND_PAGE)).await {
        Ok(page) => (
            StatusCode::NOT_FOUND,
            [(CONTENT_TYPE, "text/html; charset=utf-8")],
            page,
        )
            .into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            [
                (CONTENT_TYPE, "text/plain; charset=utf-8"),
                (X_CONTENT_TYPE_OPTIONS, "nosniff"),
            ],
            "404 page not found\n",
        )
            .into_response(),
    }
}

/// Decodes and normalizes a URL path into a root-relative filesystem path.
///
/// `.` segments and empty segments are dropped and `..` pops one segment.
/// Returns `None` if the path climbs above the root or contains a backslash
/// or NUL.
fn normalize(raw_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(raw_path).ok()?;
    let mut segments: Vec<&str> = Vec::new();

    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s if s.contains('\\') || s.contains('\0') => return None,
            s => segments.push(s),
        }
    }

    Some(segments.into_iter().collect())
}

fn with_html_suffix(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".html");
    PathBuf::from(name)
}

/// Slash-terminated absolute path for `relative`, re-encoded segment by
/// segment so the target always stays on this host.
fn redirect_target(relative: &Path, query: Option<&str>) -> String {
    let mut target = String::from("/");
    for segment in relative.iter() {
        target.push_str(&urlencoding::encode(&segment.to_string_lossy()));
        target.push('/');
    }
    if let Some(query) = query {
        target.push('?');
        target.push_str(query);
    }
    target
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}
