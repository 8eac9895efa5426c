use std::sync::Arc;
use crate::config::SimSettings;
use crate::rate_limit::RateLimiter;
// app's shared state

pub struct AppState {
    pub limiter: Arc<RateLimiter>, // shared with the sweeper task
    pub settings: SimSettings,
}

impl AppState {
    pub fn new(settings: SimSettings) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::new()),
            settings,
        }
    }
}
