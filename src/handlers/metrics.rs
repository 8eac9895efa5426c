use axum::http::header;
use axum::response::IntoResponse;
use prometheus::{Encoder, TextEncoder};
use crate::error::SimError;

pub async fn metrics_handler() -> Result<impl IntoResponse, SimError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| SimError::Metrics(e.to_string()))?;
    let body = String::from_utf8(buffer).map_err(|e| SimError::Metrics(e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, encoder.format_type().to_string())], body))
}
