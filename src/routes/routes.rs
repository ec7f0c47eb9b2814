//! Defines routes for the gallery API and the front-end bundle.
//!
//! ## Structure
//! - **API endpoints** (rate limited)
//!   - `GET /api/images?lastKey=` — one month of images, newest first
//!
//! - **Probes**
//!   - `GET /healthz` — liveness
//!   - `GET /readyz`  — object store reachability
//!
//! Every other path is served from the static directory.

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        image_handlers::list_images,
    },
    middleware::rate_limit::{RateLimiter, rate_limit},
    services::gallery_service::GalleryService,
};
use axum::{Router, middleware, routing::get};
use std::path::Path;
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Build and return the router for the gallery.
///
/// The router carries shared state (`GalleryService`) to all handlers; the
/// rate limiter only guards the API routes.
pub fn routes(limiter: RateLimiter, static_dir: &Path) -> Router<GalleryService> {
    let api = Router::new()
        .route("/api/images", get(list_images))
        .route_layer(middleware::from_fn_with_state(limiter, rate_limit));

    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .merge(api)
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
}
