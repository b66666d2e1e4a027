use time::Date;

use crate::codec::{digits_only, group_digits};
use crate::spec::field::{FieldDefinition, FieldOption, ValueType};
use crate::value::FieldValue;

/// Month-in-view cursor for a date picker. Each date field keeps its own
/// cursor so navigating months in one field never resets another's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    pub year: i32,
    pub month: u8,
}

impl MonthCursor {
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()),
        }
    }
}

/// The concrete input control selected for a field and its current value.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    /// Free text input. The cap is advisory and not enforced client-side.
    TextInput { max_length: Option<u32> },
    /// Digits-only input; `grouped` adds dot thousands separators on display.
    NumberInput { grouped: bool },
    /// Option select. `multiple` follows the current value's shape: an empty
    /// initial value renders single-select.
    Select {
        multiple: bool,
        options: Vec<FieldOption>,
        allow_create: bool,
    },
    /// Calendar popup seeded from the current value, else today.
    DatePicker { month_cursor: MonthCursor },
}

/// Selects the input control for one field. This is the single dispatch point
/// over value types; every variant is handled here and nowhere else.
pub fn render_control(field: &FieldDefinition, value: &FieldValue, today: Date) -> Control {
    match field.value_type {
        ValueType::Text => Control::TextInput {
            max_length: (field.max_length > 0).then_some(field.max_length),
        },
        ValueType::Number => Control::NumberInput {
            grouped: !is_phone_label(&field.label_key()),
        },
        ValueType::Option => Control::Select {
            multiple: matches!(value, FieldValue::Multi(_)),
            options: field.options.clone(),
            allow_create: true,
        },
        ValueType::Date => Control::DatePicker {
            month_cursor: match value {
                FieldValue::Date(Some(date)) => MonthCursor::of(*date),
                _ => MonthCursor::of(today),
            },
        },
    }
}

/// Per-keystroke display text for a numeric input: non-digits stripped, then
/// regrouped with thousands separators unless the control opts out.
pub fn number_display(raw: &str, grouped: bool) -> String {
    let digits = digits_only(raw);
    if grouped { group_digits(&digits) } else { digits }
}

fn is_phone_label(label_key: &str) -> bool {
    ["telepon", "phone", "hp"]
        .iter()
        .any(|marker| label_key.contains(marker))
}
