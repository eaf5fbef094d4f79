//! Web front end.

mod assets;
mod charts;
mod handlers;
mod render;

pub use handlers::*;

use crate::api::PredictionService;
use crate::config::ServerConfig;
use crate::form::{DeviceRecord, RecallRecord};
use crate::metadata::MetadataSource;
use crate::session::FormSession;

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub device: Arc<FormSession<DeviceRecord>>,
    pub recall: Arc<FormSession<RecallRecord>>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        device_service: Arc<dyn PredictionService<DeviceRecord>>,
        recall_service: Arc<dyn PredictionService<RecallRecord>>,
    ) -> Self {
        Self {
            config,
            device: Arc::new(FormSession::new(MetadataSource::device(), device_service)),
            recall: Arc::new(FormSession::new(MetadataSource::recall(), recall_service)),
        }
    }
}

/// Web server for the risk prediction front end.
pub struct Server {
    state: AppState,
}

impl Server {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes.
    pub fn routes(&self) -> Router {
        Router::new()
            // Device failure risk
            .route("/", get(handlers::handle_device_page))
            .route("/home", get(handlers::handle_device_page))
            .route(
                "/device-risk",
                get(handlers::handle_device_page).post(handlers::handle_device_submit),
            )
            // Recall risk
            .route(
                "/predict",
                get(handlers::handle_recall_page).post(handlers::handle_recall_submit),
            )
            // Historical charts
            .route("/dashboard", get(handlers::handle_dashboard))
            .nest_service("/images", ServeDir::new(&self.state.config.charts_dir))
            // Static assets
            .route("/assets/{*path}", get(handlers::handle_asset))
            .route("/favicon.ico", get(handlers::handle_favicon))
            .route("/health", get(handlers::handle_health))
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(64 * 1024))
            .with_state(self.state.clone())
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
