use std::borrow::Cow;

use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};

use crate::serde_helpers;

/// Value types a field can hold, wire-encoded as the backend's numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ValueType {
    Text,
    Number,
    Option,
    Date,
}

impl TryFrom<u8> for ValueType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Text),
            2 => Ok(Self::Number),
            3 => Ok(Self::Option),
            4 => Ok(Self::Date),
            other => Err(format!("unknown value type code {other}")),
        }
    }
}

impl From<ValueType> for u8 {
    fn from(kind: ValueType) -> Self {
        match kind {
            ValueType::Text => 1,
            ValueType::Number => 2,
            ValueType::Option => 3,
            ValueType::Date => 4,
        }
    }
}

impl JsonSchema for ValueType {
    fn schema_name() -> Cow<'static, str> {
        "ValueType".into()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        u8::json_schema(generator)
    }
}

/// One selectable option of an option-typed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldOption {
    pub option_id: u64,
    pub text: String,
}

/// Explicit semantic role tag, replacing label-keyword sniffing where the
/// schema author supplies it. Absent on older backends, in which case role
/// resolution falls back to the label key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SemanticRole {
    #[default]
    None,
    Title,
    Date,
    Description,
}

impl SemanticRole {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Definition of a single input inside a form step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub id: u64,
    pub label: String,
    pub value_type: ValueType,
    /// Advisory text cap; 0 means unlimited.
    #[serde(default)]
    pub max_length: u32,
    #[serde(rename = "isRequired", default, with = "serde_helpers::int_bool")]
    #[schemars(with = "u8")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default, skip_serializing_if = "SemanticRole::is_none")]
    pub semantic_role: SemanticRole,
}

impl FieldDefinition {
    /// Lower-cased, whitespace-stripped label, used as the semantic key for
    /// autofill mapping and role fallback.
    pub fn label_key(&self) -> String {
        self.label
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect()
    }

    /// The id the wire payload carries for a selected option text, 0 when the
    /// text matches none of the field's options (freeform fallback).
    pub fn option_id_for(&self, text: &str) -> u64 {
        self.options
            .iter()
            .find(|option| option.text == text)
            .map(|option| option.option_id)
            .unwrap_or(0)
    }

    /// Appends a server-confirmed new option. Callers must only invoke this
    /// after the backend acknowledged the create-option request.
    pub fn push_option(&mut self, option: FieldOption) {
        self.options.push(option);
    }
}
