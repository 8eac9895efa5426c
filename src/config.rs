use clap::{Parser, ValueEnum};
use std::time::Duration;

// Log output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "fault-sim")]
#[command(about = "Simulates common API failure modes for client testing")]
pub struct Args {
    // Address to bind on
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Minimum time the timeout mode holds a request (ms)
    #[arg(long, default_value_t = 12_000)]
    pub timeout_floor_ms: u64,

    // Upper clamp for any requested delay (ms)
    #[arg(long, default_value_t = 120_000)]
    pub max_delay_ms: u64,

    // Seconds between sweeps of expired rate limit entries, 0 disables
    #[arg(long, default_value_t = 60)]
    pub sweep_interval: u64,

    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

// Knobs the dispatcher needs at request time
#[derive(Debug, Clone, Copy)]
pub struct SimSettings {
    pub timeout_floor: Duration,
    pub max_delay: Duration,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            timeout_floor: Duration::from_millis(12_000),
            max_delay: Duration::from_millis(120_000),
        }
    }
}

impl Args {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn sim_settings(&self) -> SimSettings {
        SimSettings {
            timeout_floor: Duration::from_millis(self.timeout_floor_ms),
            // the floor must stay reachable even when the clamp is set lower
            max_delay: Duration::from_millis(self.max_delay_ms.max(self.timeout_floor_ms)),
        }
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval > 0).then(|| Duration::from_secs(self.sweep_interval))
    }
}
