//! Fault simulator
//!
//! A single HTTP endpoint, `GET /api/sim`, that emulates common API
//! failure modes so client code can be exercised against them:
//!
//! - `ok`, `slow`, `timeout`: success, optionally after an artificial delay
//! - `error500`, `error503`: server errors with a plain-text body
//! - `corruptJson`: a JSON content type over a body that does not parse
//! - `reset`: a simulated crash surfaced as a bare 500
//! - `ratelimit`: a per-client fixed-window limiter with the usual headers

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod state;

pub use config::{Args, SimSettings};
pub use error::SimError;
pub use handlers::router;
pub use models::{Mode, SimulationRequest, SimulationResponse};
pub use rate_limit::{RateLimitDecision, RateLimiter};
pub use state::AppState;
