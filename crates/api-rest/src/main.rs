//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the CRS REST boundary on its own, for development and debugging.
//! The workspace's main `crs-run` binary is the intended entry point.

use api_rest::AppState;
use crs_core::{service_name_from_env_value, CoreConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Starts the REST server on `CRS_REST_ADDR` (default: "0.0.0.0:3000").
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CRS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let cfg = Arc::new(CoreConfig::new(service_name_from_env_value(
        std::env::var("CRS_SERVICE_NAME").ok(),
    )));

    tracing::info!("-- Starting CRS REST API on {}", addr);

    let app = api_rest::router(AppState::new(cfg));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
