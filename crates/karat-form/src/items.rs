use thiserror::Error;

use crate::codec::{self, CodecError};
use crate::spec::step::FormStep;
use crate::value::FieldValue;

/// Errors raised while reconstructing repeating items from recorded values.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("expected {expected} value arrays for step '{step_name}', got {got}")]
    FieldCount {
        step_name: String,
        expected: usize,
        got: usize,
    },
    /// Fields in an item-list step disagree on how many values they recorded.
    /// Positional reconstruction would silently misalign items, so this is an
    /// explicit refusal instead.
    #[error("field {field_id} recorded {got} values, expected {expected}")]
    RaggedValues {
        field_id: u64,
        expected: usize,
        got: usize,
    },
    #[error("expected {expected} back-reference ids, got {got}")]
    BackrefCount { expected: usize, got: usize },
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// One instance of a repeating step's field set. The local id keys UI rows
/// and routes edits; it is never sent to the server.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatingItem {
    pub local_id: u64,
    /// `order_item_id`-style back-reference, present when editing an
    /// existing record's line item.
    pub backref_id: Option<u64>,
    /// Parallel to the step's field order.
    pub values: Vec<FieldValue>,
}

/// Allocator for ephemeral item row ids, monotonic per session.
#[derive(Debug, Default)]
pub struct LocalIds {
    next: u64,
}

impl LocalIds {
    pub fn alloc(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

/// Rebuilds line items from the server's per-field wire value arrays by
/// positional zip: item `i` takes the `i`-th recorded value of every field.
///
/// `recorded` is parallel to `step.fields`; `backrefs`, when present, is
/// parallel to the items and carries their `order_item_id`s for edit flows.
pub fn reconstruct_items(
    step: &FormStep,
    recorded: &[Vec<String>],
    backrefs: Option<&[u64]>,
    ids: &mut LocalIds,
) -> Result<Vec<RepeatingItem>, ItemError> {
    if recorded.len() != step.fields.len() {
        return Err(ItemError::FieldCount {
            step_name: step.step_name.clone(),
            expected: step.fields.len(),
            got: recorded.len(),
        });
    }

    let item_count = recorded.first().map(Vec::len).unwrap_or(0);
    for (field, values) in step.fields.iter().zip(recorded) {
        if values.len() != item_count {
            return Err(ItemError::RaggedValues {
                field_id: field.id,
                expected: item_count,
                got: values.len(),
            });
        }
    }
    if let Some(backrefs) = backrefs
        && backrefs.len() != item_count
    {
        return Err(ItemError::BackrefCount {
            expected: item_count,
            got: backrefs.len(),
        });
    }

    let mut items = Vec::with_capacity(item_count);
    for row in 0..item_count {
        let mut values = Vec::with_capacity(step.fields.len());
        for (field, recorded_values) in step.fields.iter().zip(recorded) {
            values.push(codec::decode(field, &recorded_values[row])?);
        }
        items.push(RepeatingItem {
            local_id: ids.alloc(),
            backref_id: backrefs.map(|ids| ids[row]),
            values,
        });
    }
    Ok(items)
}
