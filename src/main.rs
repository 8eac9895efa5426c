use clap::Parser; // for cli
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use fault_sim::config::{Args, LogFormat};
use fault_sim::rate_limit::sweeper;
use fault_sim::{AppState, router};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
    }
}

// this is main async function with tokio
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // parse cli arguments
    let args = Args::parse();
    init_tracing(args.log_format);

    // creating shared state
    let state = Arc::new(AppState::new(args.sim_settings()));

    // spawn the sweeper
    if let Some(every) = args.sweep_interval() {
        let limiter = Arc::clone(&state.limiter);
        tokio::spawn(async move {
            sweeper(limiter, every).await;
        });
    }

    let app = router(state);

    let addr = args.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        addr = %addr,
        timeout_floor_ms = args.timeout_floor_ms,
        max_delay_ms = args.max_delay_ms,
        sweep_interval_secs = args.sweep_interval,
        "Fault simulator listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
