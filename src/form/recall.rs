//! Recall-risk form.

use super::{FieldErrors, FormRecord};
use crate::api::RecallPredictionResult;
use crate::metadata::MetadataOptions;

use serde::{Deserialize, Serialize};

/// Recall attributes submitted to the recall-risk service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecallRecord {
    pub classification: String,
    pub action_classification: String,
    pub determined_cause: String,
    #[serde(rename = "type")]
    pub recall_type: String,
    pub implanted: String,
    /// `None` when the posted value is not a whole number.
    pub year_initiated: Option<i32>,
}

impl Default for RecallRecord {
    fn default() -> Self {
        Self {
            classification: "Orthopedic Devices".to_string(),
            action_classification: "II".to_string(),
            determined_cause: "Device Design".to_string(),
            recall_type: "Recall".to_string(),
            implanted: "YES".to_string(),
            year_initiated: Some(2023),
        }
    }
}

impl FormRecord for RecallRecord {
    type Prediction = RecallPredictionResult;

    const FIELDS: &'static [&'static str] = &[
        "classification",
        "action_classification",
        "determined_cause",
        "type",
        "implanted",
        "year_initiated",
    ];

    const CHOICE_FIELDS: &'static [&'static str] =
        &["classification", "action_classification", "type", "implanted"];

    fn set_field(&mut self, name: &str, value: &str) -> bool {
        match name {
            "classification" => self.classification = value.to_string(),
            "action_classification" => self.action_classification = value.to_string(),
            "determined_cause" => self.determined_cause = value.to_string(),
            "type" => self.recall_type = value.to_string(),
            "implanted" => self.implanted = value.to_string(),
            "year_initiated" => self.year_initiated = value.trim().parse().ok(),
            _ => return false,
        }
        true
    }

    fn field_value(&self, name: &str) -> Option<String> {
        let value = match name {
            "classification" => self.classification.clone(),
            "action_classification" => self.action_classification.clone(),
            "determined_cause" => self.determined_cause.clone(),
            "type" => self.recall_type.clone(),
            "implanted" => self.implanted.clone(),
            "year_initiated" => self.year_initiated.map(|y| y.to_string()).unwrap_or_default(),
            _ => return None,
        };
        Some(value)
    }

    // The recall service does its own validation; only type coercion is
    // checked here.
    fn validate(&self, _options: &MetadataOptions) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.year_initiated.is_none() {
            errors.insert(
                "year_initiated",
                "Year initiated must be a whole number".to_string(),
            );
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataSource;

    #[test]
    fn test_serializes_type_key() {
        let body = serde_json::to_value(RecallRecord::default()).unwrap();
        assert_eq!(body["type"], "Recall");
        assert!(body.get("recall_type").is_none());
        assert_eq!(body["year_initiated"], 2023);
    }

    #[test]
    fn test_year_coercion() {
        let options = MetadataSource::recall().fallback_options();
        let mut record = RecallRecord::default();

        assert!(record.set_field("year_initiated", " 2019 "));
        assert_eq!(record.year_initiated, Some(2019));
        assert!(record.validate(&options).is_empty());

        record.set_field("year_initiated", "");
        assert_eq!(record.year_initiated, None);
        assert!(record.validate(&options).contains_key("year_initiated"));

        record.set_field("year_initiated", "20.5");
        assert!(record.validate(&options).contains_key("year_initiated"));
    }

    #[test]
    fn test_no_bounds_on_year() {
        let options = MetadataSource::recall().fallback_options();
        let mut record = RecallRecord::default();
        record.set_field("year_initiated", "1990");
        assert!(record.validate(&options).is_empty());
    }

    #[test]
    fn test_free_text_cause() {
        let mut record = RecallRecord::default();
        record.set_field("determined_cause", "Software design change");
        assert_eq!(
            record.field_value("determined_cause").as_deref(),
            Some("Software design change")
        );
    }
}
