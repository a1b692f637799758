//! Deployhook HTTP surface.
//!
//! Binds one port and serves:
//!
//! | Route | Auth | Purpose |
//! |-------|------|---------|
//! | `GET /`, `GET /index.html` | none | HTML status page |
//! | `GET /status.json` | none | JSON map of repository → deployment status |
//! | `GET /healthz` | none | liveness probe |
//! | `POST /{repository-id}` | HMAC-SHA256 | webhook delivery |
//!
//! Any other GET is 404; any method other than GET or POST is 405.
//!
//! ## Webhook responses
//!
//! | Status | Meaning |
//! |--------|---------|
//! | 202 | accepted; deployment running in the background (async mode) |
//! | 200 | deployed (sync mode), or ignored because the push targets another branch |
//! | 500 | deployment command failed (sync mode) |
//! | 400 | signed body is not a valid push payload |
//! | 403 | signature missing or wrong |
//! | 404 | unknown repository |
//! | 413 | body larger than [`MAX_BODY_BYTES`] |
//! | 503 | a deployment for this repository is already running |
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP routing, header extraction, and response encoding
//! live here. Every decision about whether and how to deploy is delegated to
//! [`coordinator::Deployer`].

mod error;
mod handlers;
mod page;

use std::future::Future;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use coordinator::Deployer;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Largest accepted webhook body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Builds the application router around a shared [`Deployer`].
pub fn router(deployer: Deployer) -> Router {
    Router::new()
        .route("/", get(handlers::status_page))
        .route("/index.html", get(handlers::status_page))
        .route("/status.json", get(handlers::status_feed))
        .route("/healthz", get(handlers::healthz))
        .route(
            "/{repository_id}",
            post(handlers::webhook).get(handlers::not_found),
        )
        .fallback(handlers::unmatched_path)
        .method_not_allowed_fallback(handlers::unmatched_method)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(deployer)
}

/// Serves the router on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, deployer: Deployer, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(deployer))
        .with_graceful_shutdown(shutdown)
        .await
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
