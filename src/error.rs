use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    // mode=reset: a bare 500 without the simulated response headers
    #[error("Simulated crash / connection reset")]
    SimulatedReset,

    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Metrics error: {0}")]
    Metrics(String),
}

impl IntoResponse for SimError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
