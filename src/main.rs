use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use snbroker::broker::liveness::{drain_queues, keepalive};
use snbroker::broker::{Broker, BrokerOptions};
use snbroker::config::{Settings, load_config};
use snbroker::store;
use snbroker::transport::{self, FrameSink};
use snbroker::utils::{BrokerError, Clock, SystemClock, logging};

/// MQTT-SN gateway broker.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file (defaults to config/default.* if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("failed to read .env: {e}");
        }
    }

    let settings = match load_config(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&settings.logging) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match run(settings).await {
        Ok(()) => {
            info!("shut down");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "broker failed to start");
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: Settings) -> Result<(), BrokerError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = store::open(&settings.store, clock.clone()).await?;
    info!(backend = ?settings.store.backend, "state store ready");

    let options = BrokerOptions::from_settings(&settings);
    info!(broker_id = %options.broker_id, "starting broker");
    let broker = Arc::new(Broker::new(store, clock, options));

    let socket = transport::bind(&settings.gateway).await?;
    let sink: Arc<dyn FrameSink> = socket.clone();

    let liveness = tokio::spawn(keepalive(
        broker.clone(),
        Duration::from_secs(settings.broker.keepalive_secs),
    ));
    let drain = tokio::spawn(drain_queues(
        broker.clone(),
        sink,
        Duration::from_millis(settings.broker.drain_interval_ms),
    ));

    tokio::select! {
        _ = transport::serve(socket, broker) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "cannot listen for shutdown signal");
            }
            info!("shutdown requested");
        }
    }

    liveness.abort();
    drain.abort();
    Ok(())
}
