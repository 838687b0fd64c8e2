//! Tour optimizer - command-line driver
//!
//! Reads a tour request, runs it through the engine and prints the result.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tour_optimizer::cli::{Cli, Command};
use tour_optimizer::config::Config;
use tour_optimizer::services::geocoding::create_geocoder;
use tour_optimizer::services::routing::create_routing_service_with_fallback;
use tour_optimizer::{RouteSettings, TourAssembler, TourRequest};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs directory - use LOGS_DIR env var or default to ./logs
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "./logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "tour-optimizer.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // stdout carries the JSON result, so console logs go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tour_optimizer=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Optimize { input, pretty } => optimize(&input, pretty).await,
        Command::CheckSettings { input } => check_settings(&input),
    }
}

async fn optimize(input: &Path, pretty: bool) -> Result<()> {
    let config = Config::from_env()?;
    info!("Configuration loaded");

    let request: TourRequest = read_json(input)?;
    info!("Loaded {} packages from {}", request.packages.len(), input.display());

    let geocoder = Arc::from(create_geocoder(&config));
    let routing = Arc::from(create_routing_service_with_fallback(config.valhalla_url.clone()).await);
    let assembler = TourAssembler::from_config(&config, geocoder, routing);

    // Ctrl-C abandons the request
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let result = match assembler.optimize(request, &cancel).await {
        Ok(result) => result,
        Err(e) => {
            error!("Optimization failed: {}", e);
            return Err(e.into());
        }
    };

    let output = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", output);

    Ok(())
}

fn check_settings(input: &Path) -> Result<()> {
    let settings: RouteSettings = read_json(input)?;
    let params = settings.validate()?;

    println!(
        "Settings OK: start {}, {} km/h, {} min per stop, return to depot: {}",
        settings.start_time.trim(),
        params.average_speed_kmh(),
        params.stop_time_minutes(),
        params.return_to_depot()
    );
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}
