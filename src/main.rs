//! MedRisk - medical device failure and recall risk front end.
//!
//! Serves the device-risk and recall-risk forms and forwards submissions
//! to the two prediction services.

mod api;
mod config;
mod form;
mod metadata;
mod present;
mod session;
mod web;

use api::{DeviceRiskClient, RecallRiskClient};
use config::ServerConfig;
use web::{AppState, Server};

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("medrisk=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting MedRisk on port {}...", cfg.http_port);
    tracing::info!("Device risk service at {}", cfg.device_api_url);
    tracing::info!("Recall risk service at {}", cfg.recall_api_url);

    // Prediction service clients
    let device = Arc::new(DeviceRiskClient::new(&cfg.device_api_url, cfg.request_timeout)?);
    let recall = Arc::new(RecallRiskClient::new(&cfg.recall_api_url, cfg.request_timeout)?);

    // Start web server
    let server = Server::new(AppState::new(cfg, device, recall));
    server.start().await?;

    Ok(())
}
