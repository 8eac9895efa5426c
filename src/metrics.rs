use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, Histogram, register_counter, register_counter_vec,
    register_gauge, register_histogram,
};


lazy_static! {
    pub static ref REQUEST_TOTAL: CounterVec = register_counter_vec!(
        "sim_requests_total",
        "Total simulated requests by mode and final status",
        &["mode", "status"]
    )
    .unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "sim_request_latency_seconds",
        "Time spent producing a simulated response, including artificial delay"
    )
    .unwrap();
    pub static ref RATE_LIMITED: Counter =
        register_counter!("sim_rate_limited_total", "Requests denied by the rate limiter").unwrap();
    pub static ref RATE_LIMIT_KEYS: Gauge =
        register_gauge!("sim_rate_limit_keys", "Current number of keys in the rate limit table").unwrap();
}
