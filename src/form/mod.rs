//! Form records, validation and the form state reducer.

mod device;
mod recall;
mod state;

pub use device::*;
pub use recall::*;
pub use state::*;

use crate::metadata::MetadataOptions;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Validation messages keyed by field name.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// A record collected by one of the prediction forms.
pub trait FormRecord: Clone + Debug + Default + Serialize + Send + Sync + 'static {
    /// What the backing service returns for this record.
    type Prediction: Clone + Debug + PartialEq + Send + Sync + 'static;

    /// Every field the form accepts, in display order.
    const FIELDS: &'static [&'static str];

    /// Fields whose value must come from a metadata option list.
    const CHOICE_FIELDS: &'static [&'static str];

    /// Apply a raw posted value to a field, coercing it to the field's type.
    ///
    /// Returns `false` for an unknown field.
    fn set_field(&mut self, name: &str, value: &str) -> bool;

    /// Current value of a field as it is shown in the form.
    fn field_value(&self, name: &str) -> Option<String>;

    /// Pure range and presence checks. Never touches the network.
    fn validate(&self, options: &MetadataOptions) -> FieldErrors;
}

/// Look up the static name of a field, if the record has it.
pub fn field_name<R: FormRecord>(name: &str) -> Option<&'static str> {
    R::FIELDS.iter().copied().find(|f| *f == name)
}

/// Inclusive numeric bounds for one field, with the message for each side.
#[derive(Debug)]
pub struct RangeRule {
    pub field: &'static str,
    pub min: i64,
    pub max: i64,
    pub below: &'static str,
    pub above: &'static str,
}

pub(crate) fn check_range(errors: &mut FieldErrors, rule: &RangeRule, value: i64) {
    if value < rule.min {
        errors.insert(rule.field, rule.below.to_string());
    } else if value > rule.max {
        errors.insert(rule.field, rule.above.to_string());
    }
}
