//! HTTP application assembly.
//!
//! Merges the checker and engine-ingest routers, then optionally serves the
//! front-end build for every other path and adds a permissive CORS layer.

use std::path::Path;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

use dash_checker::{SharedCheckerState, create_checker_router};
use dash_market::{IngestState, create_ingest_router};

use crate::config::HttpConfig;

/// Build the full HTTP application.
pub fn build_app(checker: SharedCheckerState, ingest: IngestState, http: &HttpConfig) -> Router {
    let app = Router::new()
        .merge(create_checker_router(checker))
        .merge(create_ingest_router(ingest));

    let app = match &http.static_dir {
        Some(static_dir) => with_static_fallback(app, static_dir),
        None => app,
    };

    if http.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app.layer(cors)
    } else {
        app
    }
}

/// Serve files from `static_dir`, falling back to its `index.html` so the
/// front end can route client-side.
fn with_static_fallback(app: Router, static_dir: &Path) -> Router {
    info!(static_dir = %static_dir.display(), "Serving static files");
    let index_path = static_dir.join("index.html");
    app.fallback_service(ServeDir::new(static_dir).not_found_service(ServeFile::new(index_path)))
}
