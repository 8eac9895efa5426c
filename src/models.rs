use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

pub const DEFAULT_DELAY_MS: u64 = 1500;
pub const DEFAULT_ERROR_STATUS: u16 = 500;
pub const DEFAULT_LIMIT: u32 = 5;
pub const DEFAULT_WINDOW_MS: u64 = 60_000;
pub const MIN_WINDOW_MS: u64 = 1000;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

// Failure behaviour selected by `?mode=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Ok,
    Slow,
    Timeout,
    Error500,
    Error503,
    CorruptJson,
    Reset,
    RateLimit,
}

impl Mode {
    // Unrecognised values select `Ok` rather than being rejected
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("slow") => Mode::Slow,
            Some("timeout") => Mode::Timeout,
            Some("error500") => Mode::Error500,
            Some("error503") => Mode::Error503,
            Some("corruptJson") => Mode::CorruptJson,
            Some("reset") => Mode::Reset,
            Some("ratelimit") => Mode::RateLimit,
            _ => Mode::Ok,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Ok => "ok",
            Mode::Slow => "slow",
            Mode::Timeout => "timeout",
            Mode::Error500 => "error500",
            Mode::Error503 => "error503",
            Mode::CorruptJson => "corruptJson",
            Mode::Reset => "reset",
            Mode::RateLimit => "ratelimit",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Raw query string - every field kept as text so bad numbers fall back to defaults
#[derive(Deserialize, Debug, Default)]
pub struct SimQuery {
    pub mode: Option<String>,
    #[serde(rename = "delayMs")]
    pub delay_ms: Option<String>,
    pub status: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "windowMs")]
    pub window_ms: Option<String>,
}

// One request's resolved mode and parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationRequest {
    pub mode: Mode,
    pub mode_label: String, // as sent, echoed in bodies and logs
    pub delay_ms: u64,
    pub error_status: u16,
    pub rate_limit_key: String,
    pub client_ip: String,
    pub limit: u32,
    pub window_ms: u64,
    pub request_id: String,
}

impl SimulationRequest {
    pub fn resolve(query: &SimQuery, headers: &HeaderMap) -> Self {
        let client_ip = client_identity(headers);
        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| String::from_utf8(v.as_bytes().to_vec()).ok())
            .unwrap_or_else(generate_request_id);
        let mode = Mode::parse(query.mode.as_deref());

        Self {
            mode,
            mode_label: query
                .mode
                .clone()
                .unwrap_or_else(|| mode.as_str().to_string()),
            // negative delays mean "no delay"
            delay_ms: parse_or(&query.delay_ms, DEFAULT_DELAY_MS as i64).max(0) as u64,
            error_status: Some(parse_or(&query.status, DEFAULT_ERROR_STATUS))
                .filter(|s| (400..=599).contains(s))
                .unwrap_or(DEFAULT_ERROR_STATUS),
            rate_limit_key: format!("{client_ip}::ratelimit"),
            client_ip,
            limit: parse_or(&query.limit, DEFAULT_LIMIT).max(1),
            window_ms: parse_or(&query.window_ms, DEFAULT_WINDOW_MS).max(MIN_WINDOW_MS),
            request_id,
        }
    }
}

fn parse_or<T: std::str::FromStr>(raw: &Option<String>, default: T) -> T {
    raw.as_deref()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

// First `x-forwarded-for` hop, then `x-real-ip`, then `"unknown"`
pub fn client_identity(headers: &HeaderMap) -> String {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
        .unwrap_or("unknown")
        .to_string()
}

pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

// JSON body for the success paths
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SimBody {
    pub ok: bool,
    pub id: String,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SimBody {
    pub fn new(req: &SimulationRequest) -> Self {
        Self {
            ok: true,
            id: req.request_id.clone(),
            mode: req.mode_label.clone(),
            delay_ms: None,
            note: None,
            message: None,
        }
    }
}

// What the dispatcher hands back to the transport. Headers keep insertion
// order, `is_failure` marks the intentionally broken responses.
#[derive(Debug, Clone)]
pub struct SimulationResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
    pub is_failure: bool,
}

impl SimulationResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl IntoResponse for SimulationResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut res = (status, self.body).into_response();
        let out = res.headers_mut();

        for (name, value) in self.headers {
            let name = HeaderName::from_static(name);
            match HeaderValue::from_str(&value) {
                Ok(v) if name == header::CONTENT_TYPE => {
                    out.insert(name, v);
                }
                Ok(v) => {
                    out.append(name, v);
                }
                Err(_) => warn!(header = %name, "Dropping unrepresentable header value"),
            }
        }
        res
    }
}
