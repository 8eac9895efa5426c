use axum::{
    extract::{Query, State},
    http::{HeaderMap, Uri},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use crate::dispatcher::dispatch;
use crate::error::SimError;
use crate::metrics::{REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{SimQuery, SimulationRequest};
use crate::state::AppState;

// GET /api/sim - resolve the mode, run it, log start and end
pub async fn sim_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SimQuery>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, SimError> {
    let req = SimulationRequest::resolve(&query, &headers);
    let started = Instant::now();

    info!(
        at = "request.start",
        id = %req.request_id,
        mode = %req.mode_label,
        ip = %req.client_ip,
        path = uri.path(),
        qs = uri.query().unwrap_or(""),
        "request.start"
    );

    let result = dispatch(&state, &req).await;
    let ms = started.elapsed().as_millis() as u64;
    REQUEST_LATENCY.observe(started.elapsed().as_secs_f64());

    match result {
        Ok(res) => {
            let status = res.status.to_string();
            REQUEST_TOTAL.with_label_values(&[req.mode.as_str(), status.as_str()]).inc();
            info!(
                at = "request.end",
                id = %req.request_id,
                mode = %req.mode_label,
                ms,
                status = res.status,
                failure = res.is_failure,
                "request.end"
            );
            Ok(res.into_response())
        }
        Err(err) => {
            REQUEST_TOTAL.with_label_values(&[req.mode.as_str(), "crash"]).inc();
            error!(
                at = "request.crash",
                id = %req.request_id,
                mode = %req.mode_label,
                ms,
                error = %err,
                "request.crash"
            );
            Err(err)
        }
    }
}
