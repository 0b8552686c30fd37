use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use monitoring_cell::WardMonitor;
use shared_config::AppConfig;
use telemetry_cell::{seed_demo_ward, DriverConfig, SimulatedVitalSource, TelemetryDriver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Ward Monitor API server");

    // Load configuration
    let config = AppConfig::from_env();
    let monitor = WardMonitor::new(&config);

    if config.seed_demo_ward {
        seed_demo_ward(&monitor)
            .await
            .context("failed to load demo ward")?;
    }

    let driver = if config.simulation_enabled {
        let driver = TelemetryDriver::new(
            monitor.clone(),
            Arc::new(SimulatedVitalSource::new()),
            DriverConfig::from_app_config(&config),
        );
        Some(driver.start())
    } else {
        warn!("Simulation disabled, vitals only arrive through the readings endpoint");
        None
    };

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(monitor)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let listener = TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    info!("Listening on {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(driver) = driver {
        driver.shutdown().await;
    }

    info!("Ward Monitor API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
