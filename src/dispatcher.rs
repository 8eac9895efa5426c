use chrono::Utc;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::SimError;
use crate::metrics::RATE_LIMITED;
use crate::models::{Mode, REQUEST_ID_HEADER, SimBody, SimulationRequest, SimulationResponse};
use crate::state::AppState;

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

// Turn a resolved request into the response (or deliberate failure) its mode emulates
pub async fn dispatch(
    state: &AppState,
    req: &SimulationRequest,
) -> Result<SimulationResponse, SimError> {
    let settings = &state.settings;

    match req.mode {
        Mode::Ok => json_ok(req, SimBody::new(req)),

        Mode::Slow => {
            let delay = Duration::from_millis(req.delay_ms).min(settings.max_delay);
            sleep(delay).await;
            let body = SimBody {
                delay_ms: Some(delay.as_millis() as u64),
                ..SimBody::new(req)
            };
            json_ok(req, body)
        }

        Mode::Timeout => {
            let delay = Duration::from_millis(req.delay_ms)
                .max(settings.timeout_floor)
                .min(settings.max_delay);
            sleep(delay).await;
            let body = SimBody {
                note: Some("This should have timed out client-side.".to_string()),
                ..SimBody::new(req)
            };
            json_ok(req, body)
        }

        Mode::Error500 | Mode::Error503 => {
            let status = if req.mode == Mode::Error503 { 503 } else { req.error_status };
            Ok(SimulationResponse {
                status,
                headers: vec![
                    (REQUEST_ID_HEADER, req.request_id.clone()),
                    ("content-type", TEXT.to_string()),
                ],
                body: format!("Simulated error ({status})"),
                is_failure: true,
            })
        }

        Mode::CorruptJson => Ok(SimulationResponse {
            status: 200,
            headers: vec![
                (REQUEST_ID_HEADER, req.request_id.clone()),
                ("content-type", JSON.to_string()),
            ],
            body: "{ invalid json".to_string(),
            is_failure: true,
        }),

        Mode::Reset => Err(SimError::SimulatedReset),

        Mode::RateLimit => rate_limited(state, req),
    }
}

fn rate_limited(
    state: &AppState,
    req: &SimulationRequest,
) -> Result<SimulationResponse, SimError> {
    let decision = state.limiter.check(
        &req.rate_limit_key,
        req.limit,
        Duration::from_millis(req.window_ms),
    );

    let mut headers = vec![
        (REQUEST_ID_HEADER, req.request_id.clone()),
        ("x-ratelimit-limit", req.limit.to_string()),
        ("x-ratelimit-remaining", decision.remaining.to_string()),
        ("x-ratelimit-reset", decision.reset_at.timestamp().to_string()),
    ];

    if !decision.allowed {
        RATE_LIMITED.inc();
        headers.push(("retry-after", decision.retry_after_secs(Utc::now()).to_string()));
        headers.push(("content-type", TEXT.to_string()));
        return Ok(SimulationResponse {
            status: 429,
            headers,
            body: "Too Many Requests".to_string(),
            is_failure: true,
        });
    }

    let body = SimBody {
        message: Some(format!("Allowed ({} remaining)", decision.remaining)),
        ..SimBody::new(req)
    };
    let mut res = json_ok(req, body)?;
    // keep x-request-id first, then the rate limit headers
    res.headers.splice(0..1, headers);
    Ok(res)
}

fn json_ok(req: &SimulationRequest, body: SimBody) -> Result<SimulationResponse, SimError> {
    let body = serde_json::to_string(&body)?;
    Ok(SimulationResponse {
        status: 200,
        headers: vec![
            (REQUEST_ID_HEADER, req.request_id.clone()),
            ("content-type", JSON.to_string()),
        ],
        body,
        is_failure: false,
    })
}
