use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use karat_form::{FieldValue, FormSchema, OptionChoice, ValueType, digits_only};
use serde_json::Value;
use time::Date;
use time::macros::format_description;
use tokio::task::JoinHandle;

use crate::api::FormApi;

/// Maps one field label key onto a location inside the resolved record.
#[derive(Debug, Clone)]
pub struct AutofillRule {
    /// Label-derived key (lower-cased, whitespace-stripped).
    pub label_key: String,
    /// JSON pointer into the resolved record.
    pub pointer: String,
    /// Re-format the record value as an ISO date.
    pub date: bool,
}

/// Static label-key to record-field mapping. Only fields whose key appears
/// here are ever overwritten by autofill; everything else is left untouched.
#[derive(Debug, Clone, Default)]
pub struct AutofillMap {
    rules: Vec<AutofillRule>,
}

impl AutofillMap {
    pub fn new(rules: Vec<AutofillRule>) -> Self {
        Self { rules }
    }

    /// The mapping used by customer-keyed forms (member number lookups).
    pub fn customer() -> Self {
        let rule = |label_key: &str, pointer: &str, date: bool| AutofillRule {
            label_key: label_key.into(),
            pointer: pointer.into(),
            date,
        };
        Self::new(vec![
            rule("namapelanggan", "/name", false),
            rule("customername", "/name", false),
            rule("tanggallahir", "/date_of_birth", true),
            rule("dateofbirth", "/date_of_birth", true),
            rule("alamat", "/address", false),
            rule("address", "/address", false),
            rule("notelepon", "/phone", false),
            rule("phonenumber", "/phone", false),
        ])
    }

    /// Resolves which schema fields this map writes to.
    pub fn mapped_fields(&self, schema: &FormSchema) -> Vec<MappedField> {
        schema
            .fields()
            .filter_map(|field| {
                let key = field.label_key();
                self.rules
                    .iter()
                    .find(|rule| rule.label_key == key)
                    .map(|rule| MappedField {
                        field_id: field.id,
                        value_type: field.value_type,
                        pointer: rule.pointer.clone(),
                        date: rule.date,
                    })
            })
            .collect()
    }
}

/// A schema field bound to a record location.
#[derive(Debug, Clone)]
pub struct MappedField {
    pub field_id: u64,
    pub value_type: ValueType,
    pub pointer: String,
    pub date: bool,
}

/// Whether the lookup key currently resolves to an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupStatus {
    #[default]
    New,
    Found,
}

/// Shared resolver state the owning session reads after lookup events.
#[derive(Debug, Clone, Default)]
pub struct AutofillState {
    pub status: LookupStatus,
    pub record: Option<Value>,
    pub fields: BTreeMap<u64, FieldValue>,
}

/// Debounced related-record resolver.
///
/// Each keystroke cancels and restarts the single pending timer, so at most
/// one lookup is in flight per input. Empty input clears mapped fields
/// synchronously with no debounce wait. A lookup whose generation was
/// superseded by a newer edit is discarded on completion, closing the
/// slow-response-overtakes-newer-state path.
pub struct AutofillResolver<A: FormApi + 'static> {
    api: Arc<A>,
    mapped: Arc<Vec<MappedField>>,
    debounce: Duration,
    state: Arc<Mutex<AutofillState>>,
    generation: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
}

impl<A: FormApi + 'static> AutofillResolver<A> {
    pub fn new(api: Arc<A>, map: &AutofillMap, schema: &FormSchema, debounce: Duration) -> Self {
        Self {
            api,
            mapped: Arc::new(map.mapped_fields(schema)),
            debounce,
            state: Arc::new(Mutex::new(AutofillState::default())),
            generation: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }

    /// Feeds the latest raw search-box text into the resolver.
    pub fn input(&mut self, text: &str) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let key = text.trim().to_string();
        if key.is_empty() {
            clear(&mut lock(&self.state), &self.mapped);
            return;
        }

        let api = Arc::clone(&self.api);
        let mapped = Arc::clone(&self.mapped);
        let state = Arc::clone(&self.state);
        let generations = Arc::clone(&self.generation);
        let debounce = self.debounce;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let result = api.lookup(&key).await;
            if generations.load(Ordering::SeqCst) != generation {
                return;
            }
            let mut state = lock(&state);
            match result {
                Ok(Some(record)) => {
                    state.status = LookupStatus::Found;
                    for field in mapped.iter() {
                        state
                            .fields
                            .insert(field.field_id, value_from_record(field, &record));
                    }
                    state.record = Some(record);
                }
                Ok(None) => clear(&mut state, &mapped),
                Err(err) => {
                    // Failure behaves exactly like "no match"; no retry.
                    tracing::warn!(key, error = %err, "autofill lookup failed");
                    clear(&mut state, &mapped);
                }
            }
        }));
    }

    /// Snapshot of the current lookup status and resolved field values.
    pub fn snapshot(&self) -> AutofillState {
        lock(&self.state).clone()
    }
}

impl<A: FormApi + 'static> Drop for AutofillResolver<A> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

fn lock(state: &Mutex<AutofillState>) -> MutexGuard<'_, AutofillState> {
    // Poisoning only means a lookup task panicked; the state stays usable.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn clear(state: &mut AutofillState, mapped: &[MappedField]) {
    state.status = LookupStatus::New;
    state.record = None;
    for field in mapped {
        state
            .fields
            .insert(field.field_id, FieldValue::empty(field.value_type));
    }
}

fn value_from_record(field: &MappedField, record: &Value) -> FieldValue {
    let raw = record.pointer(&field.pointer);
    let text = match raw {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    if field.date {
        return FieldValue::Date(parse_iso_date(&text));
    }
    match field.value_type {
        ValueType::Text => FieldValue::Text(text),
        ValueType::Number => {
            let digits = digits_only(&text);
            FieldValue::Number(digits.parse::<i64>().ok())
        }
        ValueType::Date => FieldValue::Date(parse_iso_date(&text)),
        ValueType::Option => {
            FieldValue::Single((!text.is_empty()).then(|| OptionChoice::freeform(text)))
        }
    }
}

fn parse_iso_date(text: &str) -> Option<Date> {
    // Tolerates full timestamps by taking the date prefix.
    let prefix = text.get(..10).unwrap_or(text);
    Date::parse(prefix, format_description!("[year]-[month]-[day]")).ok()
}
