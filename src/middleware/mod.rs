//! Middleware Module
//!
//! Response compression, origin-restricted CORS and static file serving,
//! composed with [`chain`].
//!
//! Every stage is a type-erased [`Handler`], so wrappers of different concrete
//! types can be stacked in a plain list.

mod chain;
mod cors;
mod gzip;
mod static_files;

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::Request;
use axum::response::Response;
use tower::util::BoxCloneService;
use tower::{Layer, Service};

pub use chain::chain;
pub use cors::{Cors, CorsLayer, ALLOWED_HEADERS, ALLOWED_METHODS};
pub use gzip::{Gzip, GzipLayer};
pub use static_files::{not_found, StaticFiles};

/// A cloneable, type-erased request handler.
pub type Handler = BoxCloneService<Request, Response, Infallible>;

/// A function wrapping one handler in another.
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Erases the type of `service`.
pub fn boxed<S>(service: S) -> Handler
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    BoxCloneService::new(service)
}

/// Turns a tower [`Layer`] into a [`Middleware`].
pub fn from_layer<L>(layer: L) -> Middleware
where
    L: Layer<Handler> + Send + Sync + 'static,
    L::Service: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    <L::Service as Service<Request>>::Future: Send + 'static,
{
    Arc::new(move |inner: Handler| boxed(layer.layer(inner)))
}
