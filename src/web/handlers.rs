//! HTTP request handlers.

use super::assets::serve_asset;
use super::charts::ALL_CATEGORIES;
use super::render;
use super::AppState;

use axum::{
    extract::{Form, Path, Query, State},
    response::{Html, IntoResponse},
};
use serde::Deserialize;

/// Query flags accepted by the form pages.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Reload metadata after a failed load.
    #[serde(default)]
    pub retry: Option<String>,
    /// Leave the current submission; a late response is dropped.
    #[serde(default)]
    pub reset: Option<String>,
}

/// Posted form body: field name/value pairs in submission order.
pub type PostedFields = Vec<(String, String)>;

// ============================================================================
// Device risk
// ============================================================================

pub async fn handle_device_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    if query.reset.is_some() {
        state.device.abandon().await;
    }

    let form = if query.retry.is_some() {
        state.device.load_metadata().await
    } else {
        state.device.open().await
    };

    Html(render::device_page(&form))
}

pub async fn handle_device_submit(
    State(state): State<AppState>,
    Form(fields): Form<PostedFields>,
) -> impl IntoResponse {
    state.device.open().await;
    let form = state.device.submit(&fields).await;
    Html(render::device_page(&form))
}

// ============================================================================
// Recall risk
// ============================================================================

pub async fn handle_recall_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    if query.reset.is_some() {
        state.recall.abandon().await;
    }

    let form = if query.retry.is_some() {
        state.recall.load_metadata().await
    } else {
        state.recall.open().await
    };

    Html(render::recall_page(&form))
}

pub async fn handle_recall_submit(
    State(state): State<AppState>,
    Form(fields): Form<PostedFields>,
) -> impl IntoResponse {
    state.recall.open().await;
    let form = state.recall.submit(&fields).await;
    Html(render::recall_page(&form))
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub category: Option<String>,
}

pub async fn handle_dashboard(Query(query): Query<DashboardQuery>) -> impl IntoResponse {
    let category = query.category.as_deref().unwrap_or(ALL_CATEGORIES);
    Html(render::dashboard_page(category))
}

// ============================================================================
// Static Assets
// ============================================================================

pub async fn handle_asset(Path(path): Path<String>) -> impl IntoResponse {
    serve_asset(&path)
}

pub async fn handle_favicon() -> impl IntoResponse {
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <circle cx="50" cy="50" r="45" fill="#1e3a8a"/>
        <path d="M50 25 V75 M25 50 H75" stroke="white" stroke-width="12" stroke-linecap="round"/>
    </svg>"##;

    (
        [(axum::http::header::CONTENT_TYPE, "image/svg+xml")],
        svg,
    )
}

pub async fn handle_health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use crate::api::{
        ApiError, MetadataResponse, PredictionResult, PredictionService, RecallPredictionResult,
    };
    use crate::config::ServerConfig;
    use crate::form::{DeviceRecord, RecallRecord};
    use crate::web::{AppState, Server};

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    #[derive(Default)]
    struct FakeDevice {
        metadata_down: bool,
        predict_calls: AtomicUsize,
    }

    #[async_trait]
    impl PredictionService<DeviceRecord> for FakeDevice {
        async fn metadata(&self) -> Result<MetadataResponse, ApiError> {
            if self.metadata_down {
                Err(ApiError::Network("connection refused".to_string()))
            } else {
                Ok(MetadataResponse::default())
            }
        }

        async fn predict(&self, _record: &DeviceRecord) -> Result<PredictionResult, ApiError> {
            self.predict_calls.fetch_add(1, Ordering::SeqCst);
            Ok(PredictionResult {
                failure_probability: 0.5,
                risk_category: "Moderate Risk".to_string(),
                error: None,
            })
        }
    }

    #[derive(Default)]
    struct FakeRecall {
        predict_calls: AtomicUsize,
    }

    #[async_trait]
    impl PredictionService<RecallRecord> for FakeRecall {
        async fn metadata(&self) -> Result<MetadataResponse, ApiError> {
            Err(ApiError::Network("connection refused".to_string()))
        }

        async fn predict(&self, _record: &RecallRecord) -> Result<RecallPredictionResult, ApiError> {
            self.predict_calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::Http {
                status: 500,
                body: "model crashed".to_string(),
            })
        }
    }

    fn router(config: ServerConfig, device: Arc<FakeDevice>, recall: Arc<FakeRecall>) -> Router {
        Server::new(AppState::new(config, device, recall)).routes()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn get(router: &Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        (status, body_text(response).await)
    }

    async fn post_form(router: &Router, uri: &str, body: &str) -> (StatusCode, String) {
        let response = router
            .clone()
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        (status, body_text(response).await)
    }

    #[tokio::test]
    async fn test_device_metadata_failure_blocks_page() {
        let device = Arc::new(FakeDevice {
            metadata_down: true,
            ..Default::default()
        });
        let router = router(ServerConfig::default(), device, Arc::default());

        let (status, html) = get(&router, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Failed to load metadata"));
        assert!(html.contains("Try Again"));
    }

    #[tokio::test]
    async fn test_recall_metadata_failure_uses_fallback() {
        let router = router(ServerConfig::default(), Arc::default(), Arc::default());

        let (_, html) = get(&router, "/predict").await;
        assert!(html.contains("Could not load live options, using defaults."));
        assert!(html.contains("Cardiovascular Devices"));
    }

    #[tokio::test]
    async fn test_invalid_device_submit_skips_service() {
        let device = Arc::new(FakeDevice::default());
        let router = router(ServerConfig::default(), device.clone(), Arc::default());

        let (_, html) = post_form(&router, "/device-risk", "device_age_years=51&manufacturer=").await;

        assert_eq!(device.predict_calls.load(Ordering::SeqCst), 0);
        assert!(html.contains("Device age cannot exceed 50 years"));
        assert!(html.contains("Manufacturer is required"));
    }

    #[tokio::test]
    async fn test_valid_device_submit_shows_result() {
        let device = Arc::new(FakeDevice::default());
        let router = router(ServerConfig::default(), device.clone(), Arc::default());

        let (_, html) = post_form(&router, "/device-risk", "device_age_years=10&failures_past_year=2").await;

        assert_eq!(device.predict_calls.load(Ordering::SeqCst), 1);
        assert!(html.contains("Moderate Risk"));
        assert!(html.contains("Schedule preventive maintenance"));
        assert!(html.contains(r#"value="10""#));
    }

    #[tokio::test]
    async fn test_recall_http_error_is_displayed() {
        let recall = Arc::new(FakeRecall::default());
        let router = router(ServerConfig::default(), Arc::default(), recall.clone());

        let (status, html) = post_form(&router, "/predict", "year_initiated=2021&determined_cause=Software").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(recall.predict_calls.load(Ordering::SeqCst), 1);
        assert!(html.contains("Error: HTTP 500 - model crashed"));
        assert!(html.contains(r#"value="Software""#));
    }

    #[tokio::test]
    async fn test_dashboard_and_assets() {
        let router = router(ServerConfig::default(), Arc::default(), Arc::default());

        let (_, html) = get(&router, "/dashboard?category=keywords").await;
        assert!(html.contains("Top Keywords"));
        assert!(!html.contains("Monthly Recall Trends"));

        let (status, css) = get(&router, "/assets/style.css").await;
        assert_eq!(status, StatusCode::OK);
        assert!(css.contains(".risk-badge"));

        let (status, body) = get(&router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_favicon_is_svg() {
        let router = router(ServerConfig::default(), Arc::default(), Arc::default());

        let response = router
            .oneshot(Request::get("/favicon.ico").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/svg+xml"
        );
        assert!(body_text(response).await.starts_with("<svg"));
    }

    #[tokio::test]
    async fn test_chart_images_served_from_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Processed")).unwrap();
        std::fs::write(dir.path().join("Processed/top_keywords.png"), b"png-bytes").unwrap();

        let config = ServerConfig {
            charts_dir: dir.path().to_string_lossy().to_string(),
            ..Default::default()
        };
        let router = router(config, Arc::default(), Arc::default());

        let (status, body) = get(&router, "/images/Processed/top_keywords.png").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "png-bytes");

        let (status, _) = get(&router, "/images/Processed/missing.png").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
