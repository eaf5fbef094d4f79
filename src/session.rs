//! Ownership of a form's state between requests.
//!
//! A [`FormSession`] is the only writer of its form state. Every change goes
//! through the reducer while the lock is held; the lock is released while a
//! network call is outstanding, so a concurrent submit sees the busy state.
//!
//! Network calls run on their own task and always dispatch their outcome,
//! even when the request that started them has gone away.

use crate::api::PredictionService;
use crate::form::{Action, FormRecord, FormState, Outcome, Phase};
use crate::metadata::MetadataSource;

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// One form, its metadata source and the service it submits to.
pub struct FormSession<R: FormRecord> {
    state: Arc<Mutex<FormState<R>>>,
    source: MetadataSource,
    service: Arc<dyn PredictionService<R>>,
}

async fn apply<R: FormRecord>(state: &Mutex<FormState<R>>, action: Action<R>) -> FormState<R> {
    let mut guard = state.lock().await;
    let next = guard.clone().reduce(action);
    *guard = next.clone();
    next
}

impl<R: FormRecord> FormSession<R> {
    pub fn new(source: MetadataSource, service: Arc<dyn PredictionService<R>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(FormState::new(source.fallback_options()))),
            source,
            service,
        }
    }

    /// Current state.
    pub async fn snapshot(&self) -> FormState<R> {
        self.state.lock().await.clone()
    }

    /// Apply an action and return the resulting state.
    pub async fn dispatch(&self, action: Action<R>) -> FormState<R> {
        apply(&self.state, action).await
    }

    /// State to render when the page is opened; loads metadata on first use.
    pub async fn open(&self) -> FormState<R> {
        let phase = self.state.lock().await.phase.clone();
        if phase == Phase::Idle {
            self.load_metadata().await
        } else {
            self.snapshot().await
        }
    }

    /// Fetch metadata and apply it according to the source's policy.
    ///
    /// Only loads from `Idle` or `Unavailable`; a load already under way is
    /// left alone.
    pub async fn load_metadata(&self) -> FormState<R> {
        {
            let mut guard = self.state.lock().await;
            if !matches!(guard.phase, Phase::Idle | Phase::Unavailable(_)) {
                return guard.clone();
            }
            *guard = guard.clone().reduce(Action::MetadataRequested);
        }

        let state = self.state.clone();
        let source = self.source;
        let service = self.service.clone();
        let task = tokio::spawn(async move {
            let result = source.load(service.as_ref()).await;
            apply(&state, source.resolve(result)).await
        });

        self.join(task).await
    }

    /// Apply posted field values, then submit if the form validates.
    ///
    /// Only fields whose value changed are applied, so unchanged fields keep
    /// their validation errors until the next submit re-validates them.
    /// While a request is outstanding the posted values are ignored and
    /// no second request is sent.
    pub async fn submit(&self, fields: &[(String, String)]) -> FormState<R> {
        let (request_id, record) = {
            let mut guard = self.state.lock().await;
            let outstanding = guard.in_flight();
            let mut next = guard.clone();

            if outstanding.is_none() {
                for (name, value) in fields {
                    if next.record.field_value(name).as_deref() != Some(value.as_str()) {
                        next = next.reduce(Action::SetField {
                            name: name.clone(),
                            value: value.clone(),
                        });
                    }
                }
            }

            next = next.reduce(Action::Submit);
            *guard = next.clone();

            match (outstanding, next.pending_submission()) {
                (None, Some(pending)) => pending,
                _ => return next,
            }
        };

        let state = self.state.clone();
        let service = self.service.clone();
        let name = self.source.name;
        let task = tokio::spawn(async move {
            tracing::info!("Submitting {} prediction request {}", name, request_id);

            let result = service.predict(&record).await.map_err(|e| {
                tracing::error!("{} prediction request {} failed: {}", name, request_id, e);
                e.to_string()
            });

            apply(
                &state,
                Action::Resolved {
                    request_id,
                    outcome: Outcome {
                        result,
                        received_at: Utc::now(),
                    },
                },
            )
            .await
        });

        self.join(task).await
    }

    /// Forget any outstanding request; its response will be dropped.
    pub async fn abandon(&self) -> FormState<R> {
        self.dispatch(Action::Abandon).await
    }

    async fn join(&self, task: JoinHandle<FormState<R>>) -> FormState<R> {
        match task.await {
            Ok(state) => state,
            Err(e) => {
                tracing::error!("{} background task failed: {}", self.source.name, e);
                self.snapshot().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, MetadataResponse, PredictionResult, RecallPredictionResult};
    use crate::form::{DeviceRecord, RecallRecord, BUSY_NOTICE};
    use crate::metadata::{OptionsOrigin, FALLBACK_WARNING};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingDevice {
        metadata_calls: AtomicUsize,
        predict_calls: AtomicUsize,
        metadata_down: bool,
    }

    #[async_trait]
    impl PredictionService<DeviceRecord> for CountingDevice {
        async fn metadata(&self) -> Result<MetadataResponse, ApiError> {
            self.metadata_calls.fetch_add(1, Ordering::SeqCst);
            if self.metadata_down {
                return Err(ApiError::Network("connection refused".to_string()));
            }
            Ok(serde_json::from_value(json!({
                "categorical_values": {"environment": ["ICU", "Ward"]},
                "numeric_cols": ["device_age_years"]
            }))
            .unwrap())
        }

        async fn predict(&self, record: &DeviceRecord) -> Result<PredictionResult, ApiError> {
            self.predict_calls.fetch_add(1, Ordering::SeqCst);
            Ok(PredictionResult {
                failure_probability: if record.failures_past_year > 10 { 0.85 } else { 0.1 },
                risk_category: "Safe".to_string(),
                error: None,
            })
        }
    }

    struct FailingRecall {
        predict_calls: AtomicUsize,
    }

    #[async_trait]
    impl PredictionService<RecallRecord> for FailingRecall {
        async fn metadata(&self) -> Result<MetadataResponse, ApiError> {
            Err(ApiError::Http {
                status: 502,
                body: String::new(),
            })
        }

        async fn predict(&self, _record: &RecallRecord) -> Result<RecallPredictionResult, ApiError> {
            self.predict_calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::Http {
                status: 500,
                body: "internal_server_error".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct SlowDevice {
        metadata_delay: Duration,
        predict_delay: Duration,
        metadata_calls: AtomicUsize,
        predict_calls: AtomicUsize,
    }

    #[async_trait]
    impl PredictionService<DeviceRecord> for SlowDevice {
        async fn metadata(&self) -> Result<MetadataResponse, ApiError> {
            self.metadata_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.metadata_delay).await;
            Ok(MetadataResponse::default())
        }

        async fn predict(&self, _record: &DeviceRecord) -> Result<PredictionResult, ApiError> {
            self.predict_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.predict_delay).await;
            Ok(PredictionResult {
                failure_probability: 0.5,
                risk_category: "Moderate Risk".to_string(),
                error: None,
            })
        }
    }

    fn field(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    #[tokio::test]
    async fn test_open_loads_metadata_once() {
        let service = Arc::new(CountingDevice::default());
        let session = FormSession::new(MetadataSource::device(), service.clone());

        let state = session.open().await;
        assert_eq!(state.phase, Phase::Ready);
        assert_eq!(state.options.origin, OptionsOrigin::Live);
        assert_eq!(state.options.choices_for("environment"), ["ICU", "Ward"]);

        session.open().await;
        assert_eq!(service.metadata_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_submit_makes_no_request() {
        let service = Arc::new(CountingDevice::default());
        let session = FormSession::new(MetadataSource::device(), service.clone());
        session.open().await;

        let state = session
            .submit(&[field("device_age_years", "51"), field("manufacturer", " ")])
            .await;

        assert_eq!(service.predict_calls.load(Ordering::SeqCst), 0);
        assert_eq!(state.phase, Phase::Ready);
        assert_eq!(state.errors.len(), 2);
        assert!(state.outcome.is_none());
    }

    #[tokio::test]
    async fn test_valid_submit_produces_outcome() {
        let service = Arc::new(CountingDevice::default());
        let session = FormSession::new(MetadataSource::device(), service.clone());
        session.open().await;

        let state = session.submit(&[field("failures_past_year", "12")]).await;

        assert_eq!(service.predict_calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.phase, Phase::Ready);
        let result = state.outcome.unwrap().result.unwrap();
        assert!((result.failure_probability - 0.85).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_blocking_metadata_failure_and_retry() {
        let service = Arc::new(CountingDevice {
            metadata_down: true,
            ..Default::default()
        });
        let session = FormSession::new(MetadataSource::device(), service.clone());

        let state = session.open().await;
        assert!(matches!(state.phase, Phase::Unavailable(_)));

        let state = session.submit(&[]).await;
        assert_eq!(service.predict_calls.load(Ordering::SeqCst), 0);
        assert!(matches!(state.phase, Phase::Unavailable(_)));

        session.load_metadata().await;
        assert_eq!(service.metadata_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_recall_falls_back_and_reports_http_error() {
        let service = Arc::new(FailingRecall {
            predict_calls: AtomicUsize::new(0),
        });
        let session = FormSession::new(MetadataSource::recall(), service.clone());

        let state = session.open().await;
        assert_eq!(state.phase, Phase::Ready);
        assert_eq!(state.options.warning.as_deref(), Some(FALLBACK_WARNING));

        let state = session.submit(&[field("year_initiated", "2021")]).await;
        assert_eq!(service.predict_calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.phase, Phase::Ready);
        assert_eq!(
            state.outcome.unwrap().result.unwrap_err(),
            "HTTP 500 - internal_server_error"
        );
        assert_eq!(state.record.year_initiated, Some(2021));
    }

    #[tokio::test]
    async fn test_overlapping_submit_is_refused() {
        let service = Arc::new(SlowDevice {
            predict_delay: Duration::from_millis(200),
            ..Default::default()
        });
        let session = Arc::new(FormSession::new(MetadataSource::device(), service.clone()));
        session.open().await;

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.submit(&[]).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = session.submit(&[field("device_age_years", "9")]).await;
        assert_eq!(second.notice.as_deref(), Some(BUSY_NOTICE));
        assert!(second.is_busy());
        assert_eq!(second.record.device_age_years, 5);

        let first = first.await.unwrap();
        assert_eq!(first.phase, Phase::Ready);
        assert!(first.outcome.is_some());
        assert_eq!(service.predict_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_open_still_finishes_loading() {
        let service = Arc::new(SlowDevice {
            metadata_delay: Duration::from_millis(300),
            ..Default::default()
        });
        let session = FormSession::new(MetadataSource::device(), service.clone());

        let cancelled = tokio::time::timeout(Duration::from_millis(50), session.open()).await;
        assert!(cancelled.is_err());

        tokio::time::sleep(Duration::from_millis(400)).await;

        let state = session.open().await;
        assert_eq!(state.phase, Phase::Ready);
        assert_eq!(service.metadata_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_submit_still_resolves() {
        let service = Arc::new(SlowDevice {
            predict_delay: Duration::from_millis(200),
            ..Default::default()
        });
        let session = FormSession::new(MetadataSource::device(), service.clone());
        session.open().await;

        let cancelled = tokio::time::timeout(Duration::from_millis(50), session.submit(&[])).await;
        assert!(cancelled.is_err());

        tokio::time::sleep(Duration::from_millis(300)).await;

        let state = session.snapshot().await;
        assert_eq!(state.phase, Phase::Ready);
        assert!(state.outcome.unwrap().result.is_ok());
        assert_eq!(service.predict_calls.load(Ordering::SeqCst), 1);
    }
}
