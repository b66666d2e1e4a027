use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{self, CodecError, WireOptionValue};
use crate::items::RepeatingItem;
use crate::spec::field::{FieldDefinition, SemanticRole};
use crate::spec::step::{FormSchema, FormStep};
use crate::value::FieldValue;

/// Errors blocking payload assembly. The title/date messages are surfaced to
/// the user verbatim.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("Judul diperlukan")]
    MissingTitle,
    #[error("Tanggal diperlukan")]
    MissingDate,
    /// A line item's value count disagrees with the step's field count.
    #[error("item {local_id} carries {got} values, expected {expected}")]
    ItemShape {
        local_id: u64,
        expected: usize,
        got: usize,
    },
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// One field's entry in the generic detail array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetailEntry {
    pub step: i64,
    pub step_name: String,
    pub field_id: u64,
    pub label: String,
    pub value: Vec<WireOptionValue>,
}

/// The wire document for a flat (non-repeating) form: root attributes the
/// backend requires outside the detail array, plus one entry per field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubmissionPayload {
    pub name: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub detail: Vec<DetailEntry>,
}

/// One flattened line item of an item-list submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ItemEntry {
    /// Back-reference to the record's existing line item; absent when the
    /// submission appends a new one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_item_id: Option<u64>,
    pub detail: Vec<DetailEntry>,
}

/// The wire document for a repeating-item form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ItemSubmission {
    pub items: Vec<ItemEntry>,
}

/// The semantic role a field plays for root-attribute hoisting. The explicit
/// schema tag wins; the label-key fallback covers backends that do not send
/// one yet.
pub fn resolved_role(field: &FieldDefinition) -> SemanticRole {
    if !field.semantic_role.is_none() {
        return field.semantic_role;
    }
    let key = field.label_key();
    if is_title_key(&key) {
        SemanticRole::Title
    } else if is_date_key(&key) {
        SemanticRole::Date
    } else if is_note_key(&key) {
        SemanticRole::Description
    } else {
        SemanticRole::None
    }
}

fn is_title_key(key: &str) -> bool {
    ["judul", "title", "nama", "name"]
        .iter()
        .any(|marker| key.contains(marker))
}

fn is_date_key(key: &str) -> bool {
    let date_like = ["tanggal", "date"].iter().any(|marker| key.contains(marker));
    // Birth/anniversary dates are ordinary fields, never the record date.
    let excluded = ["lahir", "birth", "ulangtahun", "anniversary"]
        .iter()
        .any(|marker| key.contains(marker));
    date_like && !excluded
}

fn is_note_key(key: &str) -> bool {
    ["catatan", "description", "notes", "keterangan"]
        .iter()
        .any(|marker| key.contains(marker))
}

/// Builds the flat-form wire payload: steps in schema order, fields in step
/// order, with title/date/description hoisted into root attributes. Missing
/// title or date is a hard failure that builds no payload.
pub fn assemble_flat(
    schema: &FormSchema,
    values: &BTreeMap<u64, FieldValue>,
) -> Result<SubmissionPayload, AssembleError> {
    let mut detail = Vec::new();
    let mut name = String::new();
    let mut date = String::new();
    let mut description = String::new();

    for step in &schema.steps {
        for field in &step.fields {
            let empty = FieldValue::empty(field.value_type);
            let value = values.get(&field.id).unwrap_or(&empty);
            detail.push(DetailEntry {
                step: step.step_number,
                step_name: step.step_name.clone(),
                field_id: field.id,
                label: field.label.clone(),
                value: codec::wire_values(field, value)?,
            });
            if value.is_empty() {
                continue;
            }
            match resolved_role(field) {
                SemanticRole::Title if name.is_empty() => name = value.display_text(),
                SemanticRole::Date if date.is_empty() => date = value.display_text(),
                SemanticRole::Description if description.is_empty() => {
                    description = value.display_text();
                }
                _ => {}
            }
        }
    }

    if name.is_empty() {
        return Err(AssembleError::MissingTitle);
    }
    if date.is_empty() {
        return Err(AssembleError::MissingDate);
    }
    Ok(SubmissionPayload {
        name,
        date,
        description: (!description.is_empty()).then_some(description),
        detail,
    })
}

/// Builds the item-list wire payload: one flattened entry per repeating item,
/// carrying its back-reference id when the submission edits an existing
/// record.
pub fn assemble_items(
    step: &FormStep,
    items: &[RepeatingItem],
) -> Result<ItemSubmission, AssembleError> {
    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        if item.values.len() != step.fields.len() {
            return Err(AssembleError::ItemShape {
                local_id: item.local_id,
                expected: step.fields.len(),
                got: item.values.len(),
            });
        }
        let mut detail = Vec::with_capacity(step.fields.len());
        for (field, value) in step.fields.iter().zip(&item.values) {
            detail.push(DetailEntry {
                step: step.step_number,
                step_name: step.step_name.clone(),
                field_id: field.id,
                label: field.label.clone(),
                value: codec::wire_values(field, value)?,
            });
        }
        entries.push(ItemEntry {
            order_item_id: item.backref_id,
            detail,
        });
    }
    Ok(ItemSubmission { items: entries })
}
