use time::Date;
use time::macros::format_description;

use crate::spec::field::ValueType;

/// A selected option: display text plus the backing option id.
/// `option_id == 0` signals a freeform entry that matches no known option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionChoice {
    pub option_id: u64,
    pub text: String,
}

impl OptionChoice {
    pub fn freeform(text: impl Into<String>) -> Self {
        Self {
            option_id: 0,
            text: text.into(),
        }
    }
}

/// The in-memory typed value for one field. The shape must always match the
/// field definition's value type; a mismatch is a programming error, not a
/// user-facing validation failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    /// Digits-only amount; wire numbers are non-negative by construction.
    Number(Option<i64>),
    Date(Option<Date>),
    /// Single-select option state.
    Single(Option<OptionChoice>),
    /// Multi-select option state, order-preserving.
    Multi(Vec<OptionChoice>),
}

impl FieldValue {
    /// The empty value for a field of the given type. An empty option field
    /// defaults to single-select shape.
    pub fn empty(kind: ValueType) -> Self {
        match kind {
            ValueType::Text => Self::Text(String::new()),
            ValueType::Number => Self::Number(None),
            ValueType::Date => Self::Date(None),
            ValueType::Option => Self::Single(None),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Number(number) => number.is_none(),
            Self::Date(date) => date.is_none(),
            Self::Single(choice) => choice.is_none(),
            Self::Multi(choices) => choices.is_empty(),
        }
    }

    /// Whether this value's shape is legal for the given field type. Both
    /// option shapes are legal for option fields.
    pub fn shape_matches(&self, kind: ValueType) -> bool {
        match self {
            Self::Text(_) => kind == ValueType::Text,
            Self::Number(_) => kind == ValueType::Number,
            Self::Date(_) => kind == ValueType::Date,
            Self::Single(_) | Self::Multi(_) => kind == ValueType::Option,
        }
    }

    /// Human-readable rendition, used when hoisting root attributes.
    pub fn display_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(Some(number)) => number.to_string(),
            Self::Number(None) => String::new(),
            Self::Date(Some(date)) => date
                .format(format_description!("[year]-[month]-[day]"))
                .unwrap_or_default(),
            Self::Date(None) => String::new(),
            Self::Single(Some(choice)) => choice.text.clone(),
            Self::Single(None) => String::new(),
            Self::Multi(choices) => choices
                .iter()
                .map(|choice| choice.text.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}
