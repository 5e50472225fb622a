//! API Routes
//!
//! Assembles the terminal router and wraps it in the middleware chain.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{health_handler, AppState};
use crate::middleware::{boxed, chain, from_layer, CorsLayer, GzipLayer, StaticFiles};

/// Creates the application router.
///
/// # Request path
/// `TraceLayer` → CORS → gzip → router (`/health`, static fallback)
///
/// CORS is outermost so preflight requests are answered before any
/// compression work.
pub fn create_router(state: AppState) -> Router {
    let static_files = StaticFiles::new(state.static_root.clone());
    let cors = CorsLayer::new(state.allowed_origins.iter().cloned());

    let terminal = Router::new()
        .route("/health", get(health_handler))
        .fallback_service(static_files)
        .with_state(state);

    let handler = chain(boxed(terminal), [from_layer(cors), from_layer(GzipLayer)]);

    Router::new()
        .fallback_service(handler)
        .layer(TraceLayer::new_for_http())
}
