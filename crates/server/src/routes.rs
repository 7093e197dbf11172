//! Route configuration.

use crate::handlers;
use crate::state::ServiceContext;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use cairn_core::api;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(ctx: ServiceContext) -> Router {
    // Bulk JSON bodies are bounded; the streamed and raw surfaces accept
    // arbitrarily large payloads.
    let bulk_routes = Router::new()
        .route(api::BLOBS_GET, post(handlers::blobs_get))
        .route(api::BLOBS_PUT, post(handlers::blobs_put))
        .route(api::TAGS_GET, post(handlers::tags_get))
        .route(api::TAGS_SET, post(handlers::tags_set))
        .layer(DefaultBodyLimit::max(ctx.config.server.max_body_bytes));

    let stream_routes = Router::new()
        .route(api::ENTRIES, post(handlers::entry_put))
        .route("/api/v1/entries/{digest}", get(handlers::entry_get))
        .route(
            "/api/v1/entries/{digest}/metadata",
            get(handlers::entry_metadata),
        )
        .route("/raw/{digest}", get(handlers::raw_get))
        .route("/raw", put(handlers::raw_put))
        .layer(DefaultBodyLimit::disable());

    // One per-request deadline covers both the read and the write phase; the
    // longer of the two configured timeouts wins.
    let deadline = Duration::from_secs(
        ctx.config
            .server
            .read_timeout_secs
            .max(ctx.config.server.write_timeout_secs),
    );

    Router::new()
        .merge(bulk_routes)
        .merge(stream_routes)
        .layer(TimeoutLayer::new(deadline))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
