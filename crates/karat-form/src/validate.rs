use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::step::FormSchema;
use crate::value::FieldValue;

/// A single client-side validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub message: String,
}

/// Result of pre-submission completeness checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_required: Vec<String>,
}

/// Checks every required field for a non-empty value. Absent values count as
/// empty.
pub fn check_required(schema: &FormSchema, values: &BTreeMap<u64, FieldValue>) -> ValidationResult {
    let mut errors = Vec::new();
    let mut missing_required = Vec::new();

    for field in schema.fields() {
        if !field.required {
            continue;
        }
        let empty = values.get(&field.id).map(FieldValue::is_empty).unwrap_or(true);
        if empty {
            missing_required.push(field.label.clone());
            errors.push(ValidationError {
                field_id: Some(field.id),
                label: Some(field.label.clone()),
                message: format!("{} diperlukan", field.label),
            });
        }
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
        missing_required,
    }
}

/// Cross-field arithmetic check for payment-split style forms: the parts must
/// consume the total exactly. Re-evaluated after every contributing value
/// change, and again at submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceCheck {
    pub total: i64,
    pub parts: Vec<i64>,
}

impl BalanceCheck {
    pub fn remainder(&self) -> i64 {
        self.total - self.parts.iter().sum::<i64>()
    }

    pub fn balanced(&self) -> bool {
        self.remainder() == 0
    }
}
