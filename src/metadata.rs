//! Metadata loading for the prediction forms.
//!
//! Both services publish the option lists their model was trained on. A
//! [`MetadataSource`] describes how one form maps that response onto its
//! fields and what happens when the service cannot be reached.

use crate::api::{ApiError, MetadataResponse, PredictionService};
use crate::form::{Action, FormRecord};

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Note shown when the fallback option lists are in use.
pub const FALLBACK_WARNING: &str = "Could not load live options, using defaults.";

/// Where a set of options came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsOrigin {
    Live,
    Fallback,
}

/// What to do when the metadata service fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnError {
    /// Block the form behind an error page with a retry action.
    Block,
    /// Substitute the fallback option lists and show a warning.
    Fallback,
}

/// Option lists for a form's categorical fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataOptions {
    pub choices: BTreeMap<String, Vec<String>>,
    pub numeric_fields: Vec<String>,
    pub origin: OptionsOrigin,
    pub warning: Option<String>,
}

impl MetadataOptions {
    /// Allowed values for a field, or an empty slice when none are known.
    pub fn choices_for(&self, field: &str) -> &[String] {
        self.choices.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// How one form field is looked up in a metadata response.
#[derive(Debug)]
pub struct FieldSpec {
    pub field: &'static str,
    /// Response keys to try, first present wins.
    pub keys: &'static [&'static str],
    pub fallback: &'static [&'static str],
}

const DEVICE_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        field: "device_name",
        keys: &["device_name"],
        fallback: &[
            "Ventilator",
            "CT Scanner",
            "Ultrasound",
            "MRI Scanner",
            "X-Ray",
            "Infusion Pump",
            "ECG",
            "Patient Monitor",
        ],
    },
    FieldSpec {
        field: "manufacturer",
        keys: &["manufacturer"],
        fallback: &[
            "GE Healthcare",
            "Siemens",
            "Philips",
            "Canon Medical",
            "Medtronic",
            "Mindray",
            "Fujifilm",
        ],
    },
    FieldSpec {
        field: "environment",
        keys: &["environment"],
        fallback: &["ICU", "Ward", "Operating Room", "Lab", "Diagnostic Center"],
    },
    FieldSpec {
        field: "criticality_level",
        keys: &["criticality_level"],
        fallback: &["High", "Medium", "Low"],
    },
    FieldSpec {
        field: "spare_parts_availability",
        keys: &["spare_parts_availability"],
        fallback: &["Good", "Moderate", "Poor"],
    },
];

const RECALL_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        field: "classification",
        keys: &["classification", "classification_name"],
        fallback: &[
            "Orthopedic Devices",
            "Radiology Devices",
            "Dental Devices",
            "Cardiovascular Devices",
            "General Hospital and Personal Use Devices",
        ],
    },
    FieldSpec {
        field: "action_classification",
        keys: &["action_classification"],
        fallback: &["I", "II", "III", "Unclassified"],
    },
    FieldSpec {
        field: "type",
        keys: &["type", "recall_type"],
        fallback: &[
            "Recall",
            "Field Safety Notice",
            "Safety alert",
            "Recall / Field Safety Notice",
            "Safety alert / Field Safety Notice",
        ],
    },
    FieldSpec {
        field: "implanted",
        keys: &["implanted"],
        fallback: &["YES", "NO"],
    },
];

/// A metadata endpoint together with its field mapping and failure policy.
#[derive(Debug, Clone, Copy)]
pub struct MetadataSource {
    pub name: &'static str,
    fields: &'static [FieldSpec],
    on_error: OnError,
}

impl MetadataSource {
    /// Device-risk form: failures block the form.
    pub const fn device() -> Self {
        Self {
            name: "device-risk",
            fields: DEVICE_FIELDS,
            on_error: OnError::Block,
        }
    }

    /// Recall-risk form: failures fall back to the built-in lists.
    pub const fn recall() -> Self {
        Self {
            name: "recall-risk",
            fields: RECALL_FIELDS,
            on_error: OnError::Fallback,
        }
    }

    pub fn on_error(&self) -> OnError {
        self.on_error
    }

    /// The built-in option lists, without a warning.
    pub fn fallback_options(&self) -> MetadataOptions {
        let choices = self
            .fields
            .iter()
            .map(|spec| {
                let values = spec.fallback.iter().map(|v| v.to_string()).collect();
                (spec.field.to_string(), values)
            })
            .collect();

        MetadataOptions {
            choices,
            numeric_fields: Vec::new(),
            origin: OptionsOrigin::Fallback,
            warning: None,
        }
    }

    /// Normalize a metadata response into options for this form.
    ///
    /// A field whose list is missing or empty keeps its fallback list.
    pub fn map_response(&self, response: MetadataResponse) -> MetadataOptions {
        let categorical = response.categorical_values.unwrap_or_default();

        let choices = self
            .fields
            .iter()
            .map(|spec| {
                let values = spec
                    .keys
                    .iter()
                    .find_map(|key| categorical.get(*key).filter(|v| !v.is_null()))
                    .map(option_list)
                    .filter(|values| !values.is_empty())
                    .unwrap_or_else(|| spec.fallback.iter().map(|v| v.to_string()).collect());
                (spec.field.to_string(), values)
            })
            .collect();

        let numeric_fields = response
            .numeric_cols
            .unwrap_or_default()
            .iter()
            .map(scalar_to_string)
            .collect();

        MetadataOptions {
            choices,
            numeric_fields,
            origin: OptionsOrigin::Live,
            warning: None,
        }
    }

    /// Fetch and normalize the options. Failures are returned, not hidden.
    pub async fn load<R: FormRecord>(
        &self,
        service: &dyn PredictionService<R>,
    ) -> Result<MetadataOptions, ApiError> {
        let response = service.metadata().await?;
        let options = self.map_response(response);
        tracing::info!(
            "Loaded {} metadata: {} option lists, {} numeric fields",
            self.name,
            options.choices.len(),
            options.numeric_fields.len()
        );
        Ok(options)
    }

    /// Turn a load outcome into the form action prescribed by the policy.
    pub fn resolve<R: FormRecord>(&self, result: Result<MetadataOptions, ApiError>) -> Action<R> {
        match result {
            Ok(options) => Action::MetadataLoaded(options),
            Err(e) => match self.on_error {
                OnError::Block => {
                    tracing::error!("Failed to load {} metadata: {}", self.name, e);
                    Action::MetadataFailed(e.to_string())
                }
                OnError::Fallback => {
                    tracing::warn!(
                        "Failed to load {} metadata, using defaults: {}",
                        self.name,
                        e
                    );
                    let mut options = self.fallback_options();
                    options.warning = Some(FALLBACK_WARNING.to_string());
                    Action::MetadataLoaded(options)
                }
            },
        }
    }
}

fn option_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(scalar_to_string).collect(),
        Value::Object(map) => object_values(map),
        _ => Vec::new(),
    }
}

fn object_values(map: &Map<String, Value>) -> Vec<String> {
    map.values().map(scalar_to_string).collect()
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
