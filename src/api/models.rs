//! Wire types exchanged with the prediction services.

use crate::form::DeviceRecord;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `GET /metadata` on either service.
///
/// Option lists are kept as raw JSON values: the services are not strict
/// about list shapes and the metadata loader normalizes them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataResponse {
    #[serde(default)]
    pub categorical_values: Option<Map<String, Value>>,
    #[serde(default)]
    pub numeric_cols: Option<Vec<Value>>,
}

/// Body of `POST /predict` on the device-risk service.
#[derive(Debug, Serialize)]
pub struct DevicePredictRequest<'a> {
    pub device: &'a DeviceRecord,
}

/// Device failure prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub failure_probability: f64,
    #[serde(default)]
    pub risk_category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Recall risk prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecallPredictionResult {
    pub risk_binary: String,
    pub probability_high: f64,
    #[serde(default)]
    pub features_fired_sample: Vec<String>,
}
