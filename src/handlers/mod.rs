mod health;
mod metrics;
mod sim;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use sim::sim_handler;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use crate::state::AppState;

// Browser UIs on another origin need to read the x-* headers
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any)
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/sim", get(sim_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state)
}
