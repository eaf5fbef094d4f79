//! Device failure-risk form.

use super::{check_range, FieldErrors, FormRecord, RangeRule};
use crate::api::PredictionResult;
use crate::metadata::MetadataOptions;

use serde::{Deserialize, Serialize};

/// Allowed values for `maintenance_frequency_per_year`.
pub const MAINTENANCE_FREQUENCIES: [i64; 6] = [0, 1, 2, 4, 6, 12];

/// Device attributes submitted to the device-risk service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub device_name: String,
    pub manufacturer: String,
    pub device_age_years: i64,
    pub usage_hours_per_week: i64,
    pub maintenance_frequency_per_year: i64,
    pub last_maintenance_gap_days: i64,
    pub error_logs_past_month: i64,
    pub environment: String,
    pub criticality_level: String,
    pub spare_parts_availability: String,
    pub failures_past_year: i64,
    pub manufacturer_support_rating: i64,
}

impl Default for DeviceRecord {
    fn default() -> Self {
        Self {
            device_name: "Ventilator".to_string(),
            manufacturer: "GE Healthcare".to_string(),
            device_age_years: 5,
            usage_hours_per_week: 60,
            maintenance_frequency_per_year: 2,
            last_maintenance_gap_days: 90,
            error_logs_past_month: 5,
            environment: "ICU".to_string(),
            criticality_level: "High".to_string(),
            spare_parts_availability: "Good".to_string(),
            failures_past_year: 0,
            manufacturer_support_rating: 3,
        }
    }
}

/// Human label for a device field, used in messages and form labels.
pub fn device_field_label(field: &str) -> &'static str {
    match field {
        "device_name" => "Device Name",
        "manufacturer" => "Manufacturer",
        "device_age_years" => "Device Age (years)",
        "usage_hours_per_week" => "Usage Hours per Week",
        "maintenance_frequency_per_year" => "Maintenance Frequency per Year",
        "last_maintenance_gap_days" => "Days Since Last Maintenance",
        "error_logs_past_month" => "Error Logs (Past Month)",
        "environment" => "Environment",
        "criticality_level" => "Criticality Level",
        "spare_parts_availability" => "Spare Parts Availability",
        "failures_past_year" => "Failures in Past Year",
        "manufacturer_support_rating" => "Manufacturer Support Rating",
        _ => "Field",
    }
}

// Unparsable numbers become zero, the same as an emptied number input.
fn coerce_int(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}

/// Inclusive bounds of the free numeric device fields.
pub const RANGE_RULES: &[RangeRule] = &[
    RangeRule {
        field: "device_age_years",
        min: 0,
        max: 50,
        below: "Device age cannot be negative",
        above: "Device age cannot exceed 50 years",
    },
    RangeRule {
        field: "usage_hours_per_week",
        min: 0,
        max: 168,
        below: "Usage hours cannot be negative",
        above: "Usage hours cannot exceed 168 per week",
    },
    RangeRule {
        field: "last_maintenance_gap_days",
        min: 0,
        max: 365,
        below: "Days since maintenance cannot be negative",
        above: "Days since maintenance cannot exceed 365",
    },
    RangeRule {
        field: "error_logs_past_month",
        min: 0,
        max: 100,
        below: "Error logs cannot be negative",
        above: "Error logs cannot exceed 100",
    },
    RangeRule {
        field: "failures_past_year",
        min: 0,
        max: 50,
        below: "Failures cannot be negative",
        above: "Failures cannot exceed 50",
    },
    RangeRule {
        field: "manufacturer_support_rating",
        min: 1,
        max: 5,
        below: "Support rating must be between 1 and 5",
        above: "Support rating must be between 1 and 5",
    },
];

/// Bounds for a device field, if it has any.
pub fn device_field_bounds(field: &str) -> Option<&'static RangeRule> {
    RANGE_RULES.iter().find(|r| r.field == field)
}

impl DeviceRecord {
    fn number(&self, field: &str) -> Option<i64> {
        let value = match field {
            "device_age_years" => self.device_age_years,
            "usage_hours_per_week" => self.usage_hours_per_week,
            "maintenance_frequency_per_year" => self.maintenance_frequency_per_year,
            "last_maintenance_gap_days" => self.last_maintenance_gap_days,
            "error_logs_past_month" => self.error_logs_past_month,
            "failures_past_year" => self.failures_past_year,
            "manufacturer_support_rating" => self.manufacturer_support_rating,
            _ => return None,
        };
        Some(value)
    }

    fn choice(&self, field: &str) -> Option<&String> {
        match field {
            "device_name" => Some(&self.device_name),
            "manufacturer" => Some(&self.manufacturer),
            "environment" => Some(&self.environment),
            "criticality_level" => Some(&self.criticality_level),
            "spare_parts_availability" => Some(&self.spare_parts_availability),
            _ => None,
        }
    }
}

impl FormRecord for DeviceRecord {
    type Prediction = PredictionResult;

    const FIELDS: &'static [&'static str] = &[
        "device_name",
        "manufacturer",
        "device_age_years",
        "usage_hours_per_week",
        "maintenance_frequency_per_year",
        "last_maintenance_gap_days",
        "error_logs_past_month",
        "environment",
        "criticality_level",
        "spare_parts_availability",
        "failures_past_year",
        "manufacturer_support_rating",
    ];

    const CHOICE_FIELDS: &'static [&'static str] = &[
        "device_name",
        "manufacturer",
        "environment",
        "criticality_level",
        "spare_parts_availability",
    ];

    fn set_field(&mut self, name: &str, value: &str) -> bool {
        match name {
            "device_name" => self.device_name = value.to_string(),
            "manufacturer" => self.manufacturer = value.to_string(),
            "device_age_years" => self.device_age_years = coerce_int(value),
            "usage_hours_per_week" => self.usage_hours_per_week = coerce_int(value),
            "maintenance_frequency_per_year" => {
                self.maintenance_frequency_per_year = coerce_int(value)
            }
            "last_maintenance_gap_days" => self.last_maintenance_gap_days = coerce_int(value),
            "error_logs_past_month" => self.error_logs_past_month = coerce_int(value),
            "environment" => self.environment = value.to_string(),
            "criticality_level" => self.criticality_level = value.to_string(),
            "spare_parts_availability" => self.spare_parts_availability = value.to_string(),
            "failures_past_year" => self.failures_past_year = coerce_int(value),
            "manufacturer_support_rating" => self.manufacturer_support_rating = coerce_int(value),
            _ => return false,
        }
        true
    }

    fn field_value(&self, name: &str) -> Option<String> {
        match self.choice(name) {
            Some(choice) => Some(choice.clone()),
            None => self.number(name).map(|n| n.to_string()),
        }
    }

    fn validate(&self, options: &MetadataOptions) -> FieldErrors {
        let mut errors = FieldErrors::new();

        let required = [
            ("device_name", "Device name is required"),
            ("manufacturer", "Manufacturer is required"),
            ("environment", "Environment is required"),
            ("criticality_level", "Criticality level is required"),
            ("spare_parts_availability", "Spare parts availability is required"),
        ];
        for (field, message) in required {
            let value = self.choice(field).map(|v| v.trim()).unwrap_or_default();
            if value.is_empty() {
                errors.insert(field, message.to_string());
                continue;
            }
            let allowed = options.choices_for(field);
            if !allowed.is_empty() && !allowed.iter().any(|o| o == value) {
                errors.insert(
                    field,
                    format!("{} must be one of the available options", device_field_label(field)),
                );
            }
        }

        for rule in RANGE_RULES {
            if let Some(value) = self.number(rule.field) {
                check_range(&mut errors, rule, value);
            }
        }
        if !MAINTENANCE_FREQUENCIES.contains(&self.maintenance_frequency_per_year) {
            errors.insert(
                "maintenance_frequency_per_year",
                "Maintenance frequency must be one of 0, 1, 2, 4, 6, 12".to_string(),
            );
        }

        errors
    }
}
