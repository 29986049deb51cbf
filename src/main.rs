//! Main entry point for the CRS service.
//!
//! Resolves configuration from the environment once, initialises tracing, and
//! runs the REST boundary over a fresh in-memory datastore.
//!
//! # Environment Variables
//! - `CRS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
//! - `CRS_SERVICE_NAME`: service name stamped onto audit events (default: "crs")
//!
//! # Returns
//! * `Ok(())` - If the server starts and runs successfully
//! * `Err(anyhow::Error)` - If startup or runtime fails

use api_rest::AppState;
use crs_core::{service_name_from_env_value, CoreConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("crs=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CRS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let cfg = Arc::new(CoreConfig::new(service_name_from_env_value(
        std::env::var("CRS_SERVICE_NAME").ok(),
    )));

    tracing::info!("++ Starting CRS REST on {}", rest_addr);

    let app = api_rest::router(AppState::new(cfg));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
