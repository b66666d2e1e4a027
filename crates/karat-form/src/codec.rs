use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use time::Date;
use time::macros::format_description;

use crate::spec::field::{FieldDefinition, ValueType};
use crate::value::{FieldValue, OptionChoice};

const DATE_WIRE: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Errors raised while converting between wire and typed field values.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("value shape does not match field '{label}' ({expected:?})")]
    Shape { label: String, expected: ValueType },
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    Date(String),
    #[error("number out of range: '{0}'")]
    Number(String),
}

/// One `{optionValueId, value}` pair carried per field in submission payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WireOptionValue {
    pub option_value_id: u64,
    pub value: String,
}

/// Decodes a field's wire value into its typed in-memory form.
pub fn decode(field: &FieldDefinition, wire: &str) -> Result<FieldValue, CodecError> {
    match field.value_type {
        ValueType::Text => Ok(FieldValue::Text(wire.to_string())),
        ValueType::Number => {
            let digits = digits_only(wire);
            if digits.is_empty() {
                Ok(FieldValue::Number(None))
            } else {
                digits
                    .parse::<i64>()
                    .map(|number| FieldValue::Number(Some(number)))
                    .map_err(|_| CodecError::Number(wire.to_string()))
            }
        }
        ValueType::Date => {
            if wire.trim().is_empty() {
                Ok(FieldValue::Date(None))
            } else {
                Date::parse(wire.trim(), DATE_WIRE)
                    .map(|date| FieldValue::Date(Some(date)))
                    .map_err(|_| CodecError::Date(wire.to_string()))
            }
        }
        ValueType::Option => Ok(decode_option(wire)),
    }
}

fn decode_option(wire: &str) -> FieldValue {
    if wire.trim().is_empty() {
        return FieldValue::Single(None);
    }
    match serde_json::from_str::<Value>(wire) {
        Ok(Value::Array(entries)) => {
            FieldValue::Multi(entries.iter().map(choice_from_entry).collect())
        }
        Ok(entry @ Value::Object(_)) => FieldValue::Single(Some(choice_from_entry(&entry))),
        // Malformed JSON decodes to the raw string; a fallback, not an error.
        _ => FieldValue::Single(Some(OptionChoice::freeform(wire))),
    }
}

fn choice_from_entry(entry: &Value) -> OptionChoice {
    let text = entry
        .get("value")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| entry.to_string());
    let option_id = entry
        .get("form_detail_value_id")
        .or_else(|| entry.get("field_value_id"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    OptionChoice { option_id, text }
}

/// Encodes a typed value back to its wire form. Option ids are looked up by
/// text against the field's options, defaulting to 0 for freeform entries.
pub fn encode(field: &FieldDefinition, value: &FieldValue) -> Result<String, CodecError> {
    if !value.shape_matches(field.value_type) {
        return Err(CodecError::Shape {
            label: field.label.clone(),
            expected: field.value_type,
        });
    }
    match value {
        FieldValue::Text(text) => Ok(text.clone()),
        FieldValue::Number(None) => Ok(String::new()),
        // The wire form never carries a sign; decode strips one, so a
        // negative could not round-trip.
        FieldValue::Number(Some(number)) if *number < 0 => {
            Err(CodecError::Number(number.to_string()))
        }
        FieldValue::Number(Some(number)) => Ok(number.to_string()),
        FieldValue::Date(None) => Ok(String::new()),
        FieldValue::Date(Some(date)) => date
            .format(DATE_WIRE)
            .map_err(|_| CodecError::Date(format!("{date:?}"))),
        FieldValue::Single(None) => Ok(String::new()),
        FieldValue::Single(Some(choice)) => Ok(serde_json::json!({
            "field_value_id": resolved_id(field, choice),
            "value": choice.text,
        })
        .to_string()),
        FieldValue::Multi(choices) => {
            let entries: Vec<Value> = choices
                .iter()
                .map(|choice| {
                    serde_json::json!({
                        "form_detail_value_id": resolved_id(field, choice),
                        "value": choice.text,
                    })
                })
                .collect();
            Ok(Value::Array(entries).to_string())
        }
    }
}

fn resolved_id(field: &FieldDefinition, choice: &OptionChoice) -> u64 {
    match field.option_id_for(&choice.text) {
        0 => choice.option_id,
        id => id,
    }
}

/// The `{optionValueId, value}` pairs the submission payload carries for one
/// field. Scalar types emit a single pair with id 0.
pub fn wire_values(
    field: &FieldDefinition,
    value: &FieldValue,
) -> Result<Vec<WireOptionValue>, CodecError> {
    if !value.shape_matches(field.value_type) {
        return Err(CodecError::Shape {
            label: field.label.clone(),
            expected: field.value_type,
        });
    }
    let pairs = match value {
        FieldValue::Single(Some(choice)) => vec![WireOptionValue {
            option_value_id: resolved_id(field, choice),
            value: choice.text.clone(),
        }],
        FieldValue::Multi(choices) => choices
            .iter()
            .map(|choice| WireOptionValue {
                option_value_id: resolved_id(field, choice),
                value: choice.text.clone(),
            })
            .collect(),
        other => vec![WireOptionValue {
            option_value_id: 0,
            value: encode(field, other)?,
        }],
    };
    Ok(pairs)
}

/// Strips everything but ASCII digits, tolerating pre-formatted "1.234" input.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Regroups a digit string with dot thousands separators ("1234" -> "1.234").
pub fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (idx + 3 - offset) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Dot-grouped display form of a number ("1234567" -> "1.234.567").
pub fn group_thousands(number: i64) -> String {
    if number < 0 {
        format!("-{}", group_digits(&number.unsigned_abs().to_string()))
    } else {
        group_digits(&number.to_string())
    }
}
