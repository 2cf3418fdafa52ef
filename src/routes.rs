use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

/// Catch-all browsing routes. `/*path` does not match the bare root, so it
/// gets its own route.
pub fn doc_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::serve_path))
        .route("/*path", get(handlers::serve_path))
}

/// Complete application with request tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(doc_routes())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
