//! Form state and its reducer.
//!
//! All transitions of a form go through [`FormState::reduce`], which takes
//! the current state by value and returns the next one. The reducer is pure:
//! it never performs I/O, so every transition is testable without a network.
//!
//! ```text
//! Idle -> Loading -> Ready -> Submitting -> Ready (with outcome)
//!            \-> Unavailable -> Loading (retry)
//! ```

use super::{field_name, FieldErrors, FormRecord};
use crate::metadata::MetadataOptions;

use chrono::{DateTime, Utc};

/// Message shown when a submit arrives while another is outstanding.
pub const BUSY_NOTICE: &str = "A prediction is already in progress.";

/// Message shown when a submit arrives before options are loaded.
pub const NOT_READY_NOTICE: &str = "The form is not ready yet.";

/// Lifecycle phase of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    /// Metadata failed under the blocking policy.
    Unavailable(String),
    Ready,
    Submitting { request_id: u64 },
}

/// Result of a finished prediction request.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<P> {
    pub result: Result<P, String>,
    pub received_at: DateTime<Utc>,
}

/// An event applied to a form.
#[derive(Debug, Clone)]
pub enum Action<R: FormRecord> {
    MetadataRequested,
    MetadataLoaded(MetadataOptions),
    MetadataFailed(String),
    SetField { name: String, value: String },
    Submit,
    Resolved {
        request_id: u64,
        outcome: Outcome<R::Prediction>,
    },
    /// The user left the form; any in-flight response becomes stale.
    Abandon,
}

/// Everything a form knows at one point in time.
#[derive(Debug, Clone)]
pub struct FormState<R: FormRecord> {
    pub phase: Phase,
    pub record: R,
    pub options: MetadataOptions,
    pub errors: FieldErrors,
    pub outcome: Option<Outcome<R::Prediction>>,
    pub notice: Option<String>,
    last_request_id: u64,
}

impl<R: FormRecord> FormState<R> {
    /// A fresh form with default values and the given starting options.
    pub fn new(options: MetadataOptions) -> Self {
        Self {
            phase: Phase::Idle,
            record: R::default(),
            options,
            errors: FieldErrors::new(),
            outcome: None,
            notice: None,
            last_request_id: 0,
        }
    }

    /// Id of the request currently outstanding, if any.
    pub fn in_flight(&self) -> Option<u64> {
        match self.phase {
            Phase::Submitting { request_id } => Some(request_id),
            _ => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight().is_some()
    }

    /// The snapshot to send for the outstanding request.
    pub fn pending_submission(&self) -> Option<(u64, R)> {
        self.in_flight().map(|id| (id, self.record.clone()))
    }

    /// Apply one action and return the next state.
    pub fn reduce(mut self, action: Action<R>) -> Self {
        self.notice = None;

        match action {
            Action::MetadataRequested => {
                if matches!(self.phase, Phase::Idle | Phase::Unavailable(_)) {
                    self.phase = Phase::Loading;
                }
            }
            Action::MetadataLoaded(options) => {
                if self.phase == Phase::Loading {
                    self.conform_to(&options);
                    self.options = options;
                    self.phase = Phase::Ready;
                } else {
                    tracing::warn!("Ignoring metadata that arrived in phase {:?}", self.phase);
                }
            }
            Action::MetadataFailed(message) => {
                if self.phase == Phase::Loading {
                    self.phase = Phase::Unavailable(message);
                }
            }
            Action::SetField { name, value } => match field_name::<R>(&name) {
                Some(field) => {
                    self.record.set_field(field, &value);
                    self.errors.remove(field);
                    self.outcome = None;
                }
                None => tracing::warn!("Ignoring unknown form field {:?}", name),
            },
            Action::Submit => match self.phase {
                Phase::Ready => {
                    let errors = self.record.validate(&self.options);
                    if errors.is_empty() {
                        self.last_request_id += 1;
                        self.errors.clear();
                        self.outcome = None;
                        self.phase = Phase::Submitting {
                            request_id: self.last_request_id,
                        };
                    } else {
                        self.errors = errors;
                    }
                }
                Phase::Submitting { .. } => self.notice = Some(BUSY_NOTICE.to_string()),
                _ => self.notice = Some(NOT_READY_NOTICE.to_string()),
            },
            Action::Resolved {
                request_id,
                outcome,
            } => {
                if self.in_flight() == Some(request_id) {
                    self.outcome = Some(outcome);
                    self.phase = Phase::Ready;
                } else {
                    tracing::warn!("Dropping stale response for request {}", request_id);
                }
            }
            Action::Abandon => {
                if let Some(request_id) = self.in_flight() {
                    tracing::info!("Abandoning request {}", request_id);
                    self.phase = Phase::Ready;
                }
            }
        }

        self
    }

    // Replace choice values that the new options do not offer.
    fn conform_to(&mut self, options: &MetadataOptions) {
        for field in R::CHOICE_FIELDS {
            let allowed = options.choices_for(field);
            let current = self.record.field_value(field).unwrap_or_default();
            if let Some(first) = allowed.first() {
                if !allowed.contains(&current) {
                    self.record.set_field(field, first);
                }
            }
        }
    }
}
