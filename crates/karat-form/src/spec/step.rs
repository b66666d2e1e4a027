use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::serde_helpers;
use crate::spec::field::FieldDefinition;

/// An ordered group of fields shown as one page of a multi-step form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormStep {
    /// Display/navigation order; not necessarily contiguous.
    pub step_number: i64,
    pub step_name: String,
    #[serde(rename = "isDefaultStep", default, with = "serde_helpers::int_bool")]
    #[schemars(with = "u8")]
    pub default_step: bool,
    /// Marks an item-list step whose field set is instantiated per line item.
    #[serde(rename = "isRepeating", default, with = "serde_helpers::int_bool")]
    #[schemars(with = "u8")]
    pub repeating: bool,
    pub fields: Vec<FieldDefinition>,
}

/// Ordered sequence of steps, fetched once per form-editing session.
///
/// Read-only for the session's duration apart from option append on
/// individual fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormSchema {
    pub steps: Vec<FormStep>,
}

impl FormSchema {
    /// Builds a schema with steps sorted ascending by step number.
    pub fn new(mut steps: Vec<FormStep>) -> Self {
        steps.sort_by_key(|step| step.step_number);
        Self { steps }
    }

    /// Index of the step marked default, or 0 when none is marked.
    pub fn default_step_index(&self) -> usize {
        self.steps
            .iter()
            .position(|step| step.default_step)
            .unwrap_or(0)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.steps.iter().flat_map(|step| step.fields.iter())
    }

    pub fn field(&self, field_id: u64) -> Option<&FieldDefinition> {
        self.fields().find(|field| field.id == field_id)
    }

    pub fn field_mut(&mut self, field_id: u64) -> Option<&mut FieldDefinition> {
        self.steps
            .iter_mut()
            .flat_map(|step| step.fields.iter_mut())
            .find(|field| field.id == field_id)
    }
}
