//! HTML rendering for the front end pages.
//!
//! Pages are built from the templates under `templates/` by plain string
//! replacement. Every value that did not originate in this file goes
//! through [`escape_html`] first.

use super::charts::{sections_for, CATEGORIES};
use crate::api::{PredictionResult, RecallPredictionResult};
use crate::form::{
    device_field_bounds, device_field_label, DeviceRecord, FormRecord, FormState, Outcome, Phase,
    RecallRecord, MAINTENANCE_FREQUENCIES,
};
use crate::present::{present, present_recall};

const LAYOUT_TEMPLATE: &str = include_str!("templates/layout.html");
const DEVICE_TEMPLATE: &str = include_str!("templates/device.html");
const RECALL_TEMPLATE: &str = include_str!("templates/recall.html");
const DASHBOARD_TEMPLATE: &str = include_str!("templates/dashboard.html");
const LOADING_TEMPLATE: &str = include_str!("templates/loading.html");
const UNAVAILABLE_TEMPLATE: &str = include_str!("templates/unavailable.html");

/// Navigation entry highlighted in the page header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Device,
    Recall,
    Dashboard,
}

/// Escape text for use in HTML content and attribute values.
///
/// Braces are escaped too so posted text can never be mistaken for a
/// template placeholder.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
        .replace('{', "&#123;")
        .replace('}', "&#125;")
}

fn layout(title: &str, nav: Nav, head: &str, content: &str) -> String {
    let active = |n: Nav| if n == nav { "active" } else { "" };

    LAYOUT_TEMPLATE
        .replace("{{title}}", title)
        .replace("{{head}}", head)
        .replace("{{nav_device}}", active(Nav::Device))
        .replace("{{nav_recall}}", active(Nav::Recall))
        .replace("{{nav_dashboard}}", active(Nav::Dashboard))
        .replace("{{content}}", content)
}

// ============================================================================
// Form controls
// ============================================================================

enum Control<'a> {
    Select(Vec<(String, String)>),
    Number { min: i64, max: i64 },
    Rating { min: i64, max: i64 },
    Text { placeholder: &'a str },
}

fn form_group(label: &str, name: &str, value: &str, control: Control, error: Option<&String>) -> String {
    let error_class = if error.is_some() { " error" } else { "" };
    let value_html = escape_html(value);

    let input = match control {
        Control::Select(options) => {
            let mut html = String::new();
            // Keep an out-of-list value visible so its error makes sense.
            if !options.iter().any(|(v, _)| v == value) {
                html.push_str(&format!(
                    r#"<option value="{0}" selected>{0}</option>"#,
                    value_html
                ));
            }
            for (v, label) in &options {
                let selected = if v == value { " selected" } else { "" };
                html.push_str(&format!(
                    r#"<option value="{}"{}>{}</option>"#,
                    escape_html(v),
                    selected,
                    escape_html(label)
                ));
            }
            format!(
                r#"<select id="{0}" name="{0}" class="form-select{1}">{2}</select>"#,
                name, error_class, html
            )
        }
        Control::Number { min, max } => format!(
            r#"<input id="{0}" name="{0}" type="number" min="{1}" max="{2}" value="{3}" class="form-input{4}">"#,
            name, min, max, value_html, error_class
        ),
        Control::Rating { min, max } => {
            let labels: String = (min..=max).map(|i| format!("<span>{}</span>", i)).collect();
            format!(
                r#"<div class="rating-input"><input id="{0}" name="{0}" type="range" min="{1}" max="{2}" step="1" value="{3}" class="rating-slider{4}"><div class="rating-labels">{5}</div><div class="rating-value">{3}/{2}</div></div>"#,
                name, min, max, value_html, error_class, labels
            )
        }
        Control::Text { placeholder } => format!(
            r#"<input id="{0}" name="{0}" type="text" value="{1}" placeholder="{2}" class="form-input{3}">"#,
            name,
            value_html,
            escape_html(placeholder),
            error_class
        ),
    };

    let error_html = error
        .map(|e| format!(r#"<div class="error-message">{}</div>"#, escape_html(e)))
        .unwrap_or_default();

    format!(
        r#"                    <div class="form-group"><label class="form-label" for="{}">{}</label>{}{}</div>"#,
        name,
        escape_html(label),
        input,
        error_html
    )
}

fn choice_options(values: &[String]) -> Vec<(String, String)> {
    values.iter().map(|v| (v.clone(), v.clone())).collect()
}

fn notice_html(notice: Option<&String>) -> String {
    notice
        .map(|n| format!(r#"<div class="notice">{}</div>"#, escape_html(n)))
        .unwrap_or_default()
}

fn assessed_at<P>(outcome: &Outcome<P>) -> String {
    format!(
        r#"<p class="assessed-at">Assessed at {}</p>"#,
        outcome.received_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

fn loading_page(title: &str, nav: Nav) -> String {
    layout(
        title,
        nav,
        r#"<meta http-equiv="refresh" content="2">"#,
        LOADING_TEMPLATE,
    )
}

fn unavailable_page(title: &str, nav: Nav, message: &str, retry_href: &str) -> String {
    let content = UNAVAILABLE_TEMPLATE
        .replace("{{retry_href}}", retry_href)
        .replace("{{message}}", &escape_html(message));
    layout(title, nav, "", &content)
}

fn submit_button(busy: bool) -> (&'static str, &'static str) {
    if busy {
        ("disabled", "Analyzing...")
    } else {
        ("", "Predict Risk Level")
    }
}

// ============================================================================
// Device risk page
// ============================================================================

const DEVICE_TITLE: &str = "Device Failure Risk";

fn device_group(form: &FormState<DeviceRecord>, field: &'static str) -> String {
    let value = form.record.field_value(field).unwrap_or_default();

    let control = if DeviceRecord::CHOICE_FIELDS.contains(&field) {
        Control::Select(choice_options(form.options.choices_for(field)))
    } else if field == "maintenance_frequency_per_year" {
        Control::Select(
            MAINTENANCE_FREQUENCIES
                .iter()
                .map(|f| (f.to_string(), format!("{} times", f)))
                .collect(),
        )
    } else if field == "manufacturer_support_rating" {
        let (min, max) = device_field_bounds(field).map(|r| (r.min, r.max)).unwrap_or((1, 5));
        Control::Rating { min, max }
    } else {
        let (min, max) = device_field_bounds(field).map(|r| (r.min, r.max)).unwrap_or((0, 0));
        Control::Number { min, max }
    };

    form_group(device_field_label(field), field, &value, control, form.errors.get(field))
}

fn device_groups(form: &FormState<DeviceRecord>, fields: &[&'static str]) -> String {
    fields
        .iter()
        .map(|&f| device_group(form, f))
        .collect::<Vec<_>>()
        .join("\n")
}

fn device_result(outcome: Option<&Outcome<PredictionResult>>) -> String {
    let outcome = match outcome {
        Some(o) => o,
        None => return String::new(),
    };

    let body = match &outcome.result {
        Err(message) => format!(
            r#"<div class="error-result"><div class="error-icon">❌</div><div class="error-message">{}</div></div>"#,
            escape_html(message)
        ),
        Ok(result) => {
            let p = present(result);
            let recommendations: String = p
                .recommendations
                .iter()
                .map(|r| format!("<li>{}</li>", r))
                .collect();
            format!(
                r#"<div class="success-result">
            <div class="risk-badge" style="background-color: {color}"><span class="risk-icon">{icon}</span><span class="risk-label">{label}</span></div>
            <div class="probability-section">
                <div class="probability-header"><h4>Failure Probability</h4><div class="probability-value">{probability}</div></div>
                <div class="probability-bar"><div class="probability-fill" style="width: {width:.1}%; background-color: {color}"></div></div>
                <div class="probability-description">{description}</div>
            </div>
            <div class="recommendations"><h4>Recommendations</h4><ul>{recommendations}</ul></div>
            {assessed}
        </div>"#,
                color = p.badge_color,
                icon = p.badge_icon,
                label = escape_html(&p.badge_label),
                probability = p.probability_text,
                width = p.bar_width,
                description = p.description,
                recommendations = recommendations,
                assessed = assessed_at(outcome),
            )
        }
    };

    format!(
        r#"        <div class="results-section"><div class="results-header"><h3>Risk Assessment Results</h3></div>{}</div>"#,
        body
    )
}

/// Render the device-risk page for the current form state.
pub fn device_page(form: &FormState<DeviceRecord>) -> String {
    match &form.phase {
        Phase::Idle | Phase::Loading => return loading_page(DEVICE_TITLE, Nav::Device),
        Phase::Unavailable(message) => {
            return unavailable_page(DEVICE_TITLE, Nav::Device, message, "/device-risk?retry=1")
        }
        Phase::Ready | Phase::Submitting { .. } => {}
    }

    let (disabled, button_label) = submit_button(form.is_busy());

    let model_inputs = if form.options.numeric_fields.is_empty() {
        String::new()
    } else {
        format!(
            r#"<p class="model-inputs">Numeric model inputs: {}</p>"#,
            escape_html(&form.options.numeric_fields.join(", "))
        )
    };

    let content = DEVICE_TEMPLATE
        .replace("{{notice}}", &notice_html(form.notice.as_ref()))
        .replace("{{disabled}}", disabled)
        .replace("{{button_label}}", button_label)
        .replace("{{model_inputs}}", &model_inputs)
        .replace("{{result}}", &device_result(form.outcome.as_ref()))
        .replace(
            "{{device_details}}",
            &device_groups(
                form,
                &[
                    "device_name",
                    "manufacturer",
                    "device_age_years",
                    "usage_hours_per_week",
                    "maintenance_frequency_per_year",
                ],
            ),
        )
        .replace(
            "{{maintenance_environment}}",
            &device_groups(
                form,
                &[
                    "last_maintenance_gap_days",
                    "error_logs_past_month",
                    "environment",
                    "criticality_level",
                    "spare_parts_availability",
                ],
            ),
        )
        .replace(
            "{{performance_support}}",
            &device_groups(form, &["failures_past_year", "manufacturer_support_rating"]),
        );

    layout(DEVICE_TITLE, Nav::Device, "", &content)
}

// ============================================================================
// Recall risk page
// ============================================================================

const RECALL_TITLE: &str = "Recall Risk Predictor";

fn recall_label(field: &str) -> &'static str {
    match field {
        "classification" => "Device Classification",
        "action_classification" => "Action Classification",
        "determined_cause" => "Determined Cause",
        "type" => "Recall Type",
        "implanted" => "Implanted Device",
        "year_initiated" => "Year Initiated",
        _ => "Field",
    }
}

fn recall_result(outcome: Option<&Outcome<RecallPredictionResult>>) -> String {
    let outcome = match outcome {
        Some(o) => o,
        None => return String::new(),
    };

    match &outcome.result {
        Err(message) => format!(
            r#"        <div class="error-message"><span class="error-icon">❌</span> Error: {}</div>"#,
            escape_html(message)
        ),
        Ok(result) => {
            let p = present_recall(result);
            let factors = if p.key_factors.is_empty() {
                String::new()
            } else {
                let tags: String = p
                    .key_factors
                    .iter()
                    .map(|f| format!(r#"<span class="feature-tag">{}</span>"#, escape_html(f)))
                    .collect();
                format!(
                    r#"<div class="features-section"><h4>Key Factors</h4><div class="features-list">{}</div></div>"#,
                    tags
                )
            };
            format!(
                r#"        <div class="result-container">
            <div class="result-header"><h3>Prediction Results</h3></div>
            <div class="result-main">
                <div class="risk-badge" style="background-color: {color}"><span class="risk-icon">{icon}</span><span class="risk-label">{label}</span></div>
                <div class="probability-section">
                    <div class="probability-label">Confidence Level</div>
                    <div class="probability-bar"><div class="probability-fill" style="width: {width:.1}%; background-color: {color}"></div></div>
                    <div class="probability-value">{confidence}</div>
                </div>
            </div>
            {factors}
            {assessed}
        </div>"#,
                color = p.badge_color,
                icon = p.badge_icon,
                label = escape_html(&p.badge_label),
                width = p.bar_width,
                confidence = p.confidence_text,
                factors = factors,
                assessed = assessed_at(outcome),
            )
        }
    }
}

/// Render the recall-risk page for the current form state.
pub fn recall_page(form: &FormState<RecallRecord>) -> String {
    match &form.phase {
        Phase::Idle | Phase::Loading => return loading_page(RECALL_TITLE, Nav::Recall),
        Phase::Unavailable(message) => {
            return unavailable_page(RECALL_TITLE, Nav::Recall, message, "/predict?retry=1")
        }
        Phase::Ready | Phase::Submitting { .. } => {}
    }

    let fields = RecallRecord::FIELDS
        .iter()
        .map(|&field| {
            let value = form.record.field_value(field).unwrap_or_default();
            let control = match field {
                "determined_cause" => Control::Text {
                    placeholder: "e.g., Device Design",
                },
                "year_initiated" => Control::Number { min: 2000, max: 2030 },
                _ => Control::Select(choice_options(form.options.choices_for(field))),
            };
            form_group(recall_label(field), field, &value, control, form.errors.get(field))
        })
        .collect::<Vec<_>>()
        .join("\n");

    let warning = form
        .options
        .warning
        .as_ref()
        .map(|w| format!(r#"<small class="meta-error">{}</small>"#, escape_html(w)))
        .unwrap_or_default();

    let (disabled, button_label) = submit_button(form.is_busy());

    let content = RECALL_TEMPLATE
        .replace("{{notice}}", &notice_html(form.notice.as_ref()))
        .replace("{{warning}}", &warning)
        .replace("{{disabled}}", disabled)
        .replace("{{button_label}}", button_label)
        .replace("{{result}}", &recall_result(form.outcome.as_ref()))
        .replace("{{fields}}", &fields);

    layout(RECALL_TITLE, Nav::Recall, "", &content)
}

// ============================================================================
// Historical dashboard
// ============================================================================

/// Render the chart dashboard filtered to one category.
pub fn dashboard_page(category: &str) -> String {
    let filters = CATEGORIES
        .iter()
        .map(|c| {
            let active = if c.id == category { " active" } else { "" };
            format!(
                r#"            <a href="/dashboard?category={}" class="filter-tab{}"><span class="filter-icon">{}</span> <span class="filter-text">{}</span></a>"#,
                c.id, active, c.icon, c.name
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let sections = sections_for(category);
    let sections_html = if sections.is_empty() {
        r#"        <div class="no-results"><h3>No Analysis Found</h3><p>Try selecting a different category.</p></div>"#
            .to_string()
    } else {
        sections
            .iter()
            .map(|section| {
                let charts: String = section
                    .charts
                    .iter()
                    .map(|chart| {
                        format!(
                            r#"<div class="chart-card"><div class="chart-header"><h3 class="chart-title">{0}</h3><p class="chart-description">{1}</p></div><div class="chart-container"><img src="{2}" alt="{0}" class="chart-image" loading="lazy"></div></div>"#,
                            chart.title, chart.description, chart.image
                        )
                    })
                    .collect();
                format!(
                    r#"        <div class="analysis-section"><h2 class="section-title">{}</h2><div class="charts-grid">{}</div></div>"#,
                    section.title, charts
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let content = DASHBOARD_TEMPLATE
        .replace("{{filters}}", &filters)
        .replace("{{sections}}", &sections_html);

    layout("Historical Data Analysis", Nav::Dashboard, "", &content)
}
