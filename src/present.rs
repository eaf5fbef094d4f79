//! Mapping of prediction results to what the result panel shows.

use crate::api::{PredictionResult, RecallPredictionResult};

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Probability above which a device needs immediate attention.
pub const URGENT_THRESHOLD: f64 = 0.7;

/// Probability above which a device needs preventive maintenance.
pub const MODERATE_THRESHOLD: f64 = 0.4;

/// Number of fired features shown for a recall prediction.
pub const MAX_KEY_FACTORS: usize = 6;

const RED: &str = "#ef4444";
const AMBER: &str = "#f59e0b";
const GREEN: &str = "#10b981";

/// Device risk tier derived from the failure probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTier {
    Urgent,
    Moderate,
    Normal,
}

impl RiskTier {
    /// Upper bounds are inclusive: exactly 0.7 is moderate, exactly 0.4 normal.
    pub fn from_probability(probability: f64) -> Self {
        if probability > URGENT_THRESHOLD {
            RiskTier::Urgent
        } else if probability > MODERATE_THRESHOLD {
            RiskTier::Moderate
        } else {
            RiskTier::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Urgent => "High Risk",
            RiskTier::Moderate => "Moderate Risk",
            RiskTier::Normal => "Safe",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RiskTier::Urgent => RED,
            RiskTier::Moderate => AMBER,
            RiskTier::Normal => GREEN,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            RiskTier::Urgent => "🚨",
            RiskTier::Moderate => "⚠️",
            RiskTier::Normal => "✅",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RiskTier::Urgent => "High probability of device failure - immediate attention required",
            RiskTier::Moderate => "Moderate risk - schedule maintenance soon",
            RiskTier::Normal => "Low risk - device operating normally",
        }
    }

    pub fn recommendations(&self) -> &'static [&'static str] {
        match self {
            RiskTier::Urgent => &[
                "Schedule immediate maintenance",
                "Consider device replacement",
                "Increase monitoring frequency",
                "Check spare parts availability",
            ],
            RiskTier::Moderate => &[
                "Schedule preventive maintenance",
                "Monitor error logs closely",
                "Check manufacturer support options",
            ],
            RiskTier::Normal => &[
                "Continue regular maintenance schedule",
                "Monitor for any changes in performance",
            ],
        }
    }
}

/// Display values for a device prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub tier: RiskTier,
    pub badge_label: String,
    pub badge_color: &'static str,
    pub badge_icon: &'static str,
    /// Probability as a percentage with one decimal, e.g. `"85.0%"`.
    pub probability_text: String,
    /// Width of the probability bar, clamped to 0..=100.
    pub bar_width: f64,
    pub description: &'static str,
    pub recommendations: &'static [&'static str],
}

/// Present a device prediction.
pub fn present(result: &PredictionResult) -> Presentation {
    let tier = RiskTier::from_probability(result.failure_probability);
    let badge_label = if result.risk_category.trim().is_empty() {
        tier.label().to_string()
    } else {
        result.risk_category.clone()
    };

    Presentation {
        tier,
        badge_label,
        badge_color: tier.color(),
        badge_icon: tier.icon(),
        probability_text: percent(result.failure_probability),
        bar_width: bar_width(result.failure_probability),
        description: tier.description(),
        recommendations: tier.recommendations(),
    }
}

/// Display values for a recall prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct RecallPresentation {
    pub high_risk: bool,
    pub badge_label: String,
    pub badge_color: &'static str,
    pub badge_icon: &'static str,
    pub confidence_text: String,
    pub bar_width: f64,
    pub key_factors: Vec<String>,
}

/// Present a recall prediction. Two tiers, keyed on the label alone.
pub fn present_recall(result: &RecallPredictionResult) -> RecallPresentation {
    let high_risk = result.risk_binary == "High";
    let (badge_color, badge_icon) = if high_risk { (RED, "⚠️") } else { (GREEN, "✅") };

    RecallPresentation {
        high_risk,
        badge_label: format!("{} Risk", result.risk_binary),
        badge_color,
        badge_icon,
        confidence_text: percent(result.probability_high),
        bar_width: bar_width(result.probability_high),
        key_factors: result
            .features_fired_sample
            .iter()
            .take(MAX_KEY_FACTORS)
            .map(|f| humanize_feature(f))
            .collect(),
    }
}

/// Turn a model feature name into a readable tag.
///
/// `implanted_YES` becomes `Implanted YES`, `device_design` becomes
/// `Device Design`.
pub fn humanize_feature(name: &str) -> String {
    static WORD_START: OnceLock<Regex> = OnceLock::new();
    let re = WORD_START.get_or_init(|| Regex::new(r"\b\w").expect("word start pattern"));

    let spaced = name.replace('_', " ");
    re.replace_all(&spaced, |caps: &Captures| caps[0].to_uppercase())
        .into_owned()
}

fn percent(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

fn bar_width(probability: f64) -> f64 {
    if probability.is_nan() {
        return 0.0;
    }
    (probability * 100.0).clamp(0.0, 100.0)
}
