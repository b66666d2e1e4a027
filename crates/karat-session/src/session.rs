use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use karat_form::{
    BalanceCheck, FieldValue, FormSchema, FormStep, LocalIds, OptionChoice, RepeatingItem,
    StepNavigator, assemble_flat, assemble_items, check_required, group_thousands,
    reconstruct_items, wire_values,
};
use tokio::task::JoinHandle;

use crate::api::{FieldPatch, FormApi, PatchValue};
use crate::error::{ApiError, SessionError};

/// Which fields participate in a payment-split balance check.
#[derive(Debug, Clone)]
pub struct BalanceSpec {
    pub total_field: u64,
    pub part_fields: Vec<u64>,
}

/// One form-editing session: the fetched schema, the per-field values, and
/// the flows that mutate them. All field state dies with the session;
/// submission is the only path by which it persists.
pub struct FormSession<A: FormApi + 'static> {
    api: Arc<A>,
    schema: FormSchema,
    values: BTreeMap<u64, FieldValue>,
    navigator: StepNavigator,
    items: Vec<RepeatingItem>,
    /// The step the current `items` were created under; item operations
    /// against any other step are refused.
    items_step: Option<usize>,
    local_ids: LocalIds,
    balance: Option<BalanceSpec>,
    is_submitting: Cell<bool>,
    autosave_debounce: Duration,
    autosave: HashMap<u64, JoinHandle<()>>,
}

impl<A: FormApi + 'static> FormSession<A> {
    /// Fetches the schema and opens a fresh session. A load failure is
    /// blocking; the form cannot render without its schema.
    pub async fn load(api: Arc<A>, code: &str) -> Result<Self, SessionError> {
        let schema = api
            .fetch_schema(code)
            .await
            .map_err(SessionError::SchemaLoad)?;
        Ok(Self::with_schema(api, schema))
    }

    pub fn with_schema(api: Arc<A>, schema: FormSchema) -> Self {
        let values = schema
            .fields()
            .map(|field| (field.id, FieldValue::empty(field.value_type)))
            .collect();
        let navigator = StepNavigator::new(&schema);
        Self {
            api,
            schema,
            values,
            navigator,
            items: Vec::new(),
            items_step: None,
            local_ids: LocalIds::default(),
            balance: None,
            is_submitting: Cell::new(false),
            autosave_debounce: Duration::from_millis(800),
            autosave: HashMap::new(),
        }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn navigator(&self) -> &StepNavigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut StepNavigator {
        &mut self.navigator
    }

    pub fn value(&self, field_id: u64) -> Option<&FieldValue> {
        self.values.get(&field_id)
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting.get()
    }

    pub fn items(&self) -> &[RepeatingItem] {
        &self.items
    }

    pub fn set_balance(&mut self, spec: BalanceSpec) {
        self.balance = Some(spec);
    }

    pub fn set_autosave_debounce(&mut self, debounce: Duration) {
        self.autosave_debounce = debounce;
    }

    /// Writes one field's value. The shape must match the field's type; a
    /// mismatch is a programming error, not user input to tolerate. Returns
    /// the balance remainder so callers re-check it after every change.
    pub fn set_value(
        &mut self,
        field_id: u64,
        value: FieldValue,
    ) -> Result<Option<i64>, SessionError> {
        let field = self
            .schema
            .field(field_id)
            .ok_or(SessionError::UnknownField(field_id))?;
        if !value.shape_matches(field.value_type) {
            return Err(SessionError::Shape(field_id));
        }
        self.values.insert(field_id, value);
        Ok(self.balance_check().map(|check| check.remainder()))
    }

    /// Copies resolved autofill values in. Only fields the map produced are
    /// overwritten; everything else stays as entered.
    pub fn merge_autofill(&mut self, fields: &BTreeMap<u64, FieldValue>) {
        for (field_id, value) in fields {
            if let Some(field) = self.schema.field(*field_id)
                && value.shape_matches(field.value_type)
            {
                self.values.insert(*field_id, value.clone());
            }
        }
    }

    /// The current payment-split arithmetic, when one is configured.
    pub fn balance_check(&self) -> Option<BalanceCheck> {
        let spec = self.balance.as_ref()?;
        Some(BalanceCheck {
            total: self.number_of(spec.total_field),
            parts: spec
                .part_fields
                .iter()
                .map(|field_id| self.number_of(*field_id))
                .collect(),
        })
    }

    fn number_of(&self, field_id: u64) -> i64 {
        match self.values.get(&field_id) {
            Some(FieldValue::Number(Some(number))) => *number,
            _ => 0,
        }
    }

    /// Creates a new option for a select field, server-first: the field
    /// definition and the selection are only touched after the backend
    /// confirms. On failure the previous selection stays in place.
    pub async fn create_option(&mut self, field_id: u64, text: &str) -> Result<(), SessionError> {
        self.schema
            .field(field_id)
            .ok_or(SessionError::UnknownField(field_id))?;
        let option = match self.api.create_option(field_id, text).await {
            Ok(option) => option,
            Err(err) => {
                tracing::warn!(field_id, text, error = %err, "option create failed");
                return Err(SessionError::OptionCreate(err));
            }
        };
        let choice = OptionChoice {
            option_id: option.option_id,
            text: option.text.clone(),
        };
        if let Some(field) = self.schema.field_mut(field_id) {
            field.push_option(option);
        }
        match self.values.get_mut(&field_id) {
            Some(FieldValue::Multi(choices)) => choices.push(choice),
            _ => {
                self.values.insert(field_id, FieldValue::Single(Some(choice)));
            }
        }
        Ok(())
    }

    /// Debounced per-field autosave for edit flows, independent of full
    /// submit. A new call for the same field supersedes the pending one.
    pub fn autosave_field(
        &mut self,
        transaction_detail_id: u64,
        field_id: u64,
    ) -> Result<(), SessionError> {
        let field = self
            .schema
            .field(field_id)
            .ok_or(SessionError::UnknownField(field_id))?;
        let empty = FieldValue::empty(field.value_type);
        let value = self.values.get(&field_id).unwrap_or(&empty);
        let patch = FieldPatch {
            transaction_detail_id,
            field_id,
            value: wire_values(field, value)?
                .into_iter()
                .map(PatchValue::from)
                .collect(),
        };

        if let Some(pending) = self.autosave.remove(&field_id) {
            pending.abort();
        }
        let api = Arc::clone(&self.api);
        let debounce = self.autosave_debounce;
        self.autosave.insert(
            field_id,
            tokio::spawn(async move {
                tokio::time::sleep(debounce).await;
                if let Err(err) = api.update_field(&patch).await {
                    tracing::warn!(field_id, error = %err, "field autosave failed");
                }
            }),
        );
        Ok(())
    }

    /// Validates and submits the flat form. While the call is in flight the
    /// session refuses duplicate submits; on failure every entered value is
    /// preserved, on success they are discarded.
    pub async fn submit(&mut self) -> Result<u64, SessionError> {
        if self.is_submitting.get() {
            return Err(SessionError::SubmitInFlight);
        }
        let required = check_required(&self.schema, &self.values);
        if let Some(error) = required.errors.first() {
            return Err(SessionError::Validation(error.message.clone()));
        }
        if let Some(check) = self.balance_check()
            && !check.balanced()
        {
            return Err(SessionError::Validation(format!(
                "Pembayaran belum seimbang (sisa {})",
                group_thousands(check.remainder())
            )));
        }
        let payload = assemble_flat(&self.schema, &self.values)?;

        self.is_submitting.set(true);
        let result = {
            // Clears the flag even when the future is dropped mid-await.
            let _reset = ResetOnDrop(&self.is_submitting);
            self.api.submit(&payload).await
        };
        match result {
            Ok(record_id) => {
                self.reset_values();
                Ok(record_id)
            }
            Err(err) => Err(submit_error(err)),
        }
    }

    fn reset_values(&mut self) {
        self.values = self
            .schema
            .fields()
            .map(|field| (field.id, FieldValue::empty(field.value_type)))
            .collect();
        self.items.clear();
        self.items_step = None;
    }

    /// Rebuilds line items for a repeating step from an existing record.
    pub fn load_items(
        &mut self,
        step_index: usize,
        recorded: &[Vec<String>],
        backrefs: Option<&[u64]>,
    ) -> Result<(), SessionError> {
        let step = self.repeating_step(step_index)?.clone();
        self.items = reconstruct_items(&step, recorded, backrefs, &mut self.local_ids)
            .map_err(|err| SessionError::Validation(err.to_string()))?;
        self.items_step = Some(step_index);
        Ok(())
    }

    /// Appends a blank line item and returns its local row id.
    pub fn add_item(&mut self, step_index: usize) -> Result<u64, SessionError> {
        self.check_items_step(step_index)?;
        let step = self.repeating_step(step_index)?;
        let values = step
            .fields
            .iter()
            .map(|field| FieldValue::empty(field.value_type))
            .collect();
        let local_id = self.local_ids.alloc();
        self.items_step = Some(step_index);
        self.items.push(RepeatingItem {
            local_id,
            backref_id: None,
            values,
        });
        Ok(local_id)
    }

    /// Routes an edit to the item row with the given local id.
    pub fn set_item_value(
        &mut self,
        step_index: usize,
        local_id: u64,
        field_index: usize,
        value: FieldValue,
    ) -> Result<(), SessionError> {
        self.check_items_step(step_index)?;
        let step = self.repeating_step(step_index)?;
        let field = step
            .fields
            .get(field_index)
            .ok_or(SessionError::UnknownField(field_index as u64))?;
        if !value.shape_matches(field.value_type) {
            return Err(SessionError::Shape(field.id));
        }
        let item = self
            .items
            .iter_mut()
            .find(|item| item.local_id == local_id)
            .ok_or_else(|| SessionError::Validation(format!("no item row {local_id}")))?;
        let slot = item
            .values
            .get_mut(field_index)
            .ok_or(SessionError::UnknownField(field_index as u64))?;
        *slot = value;
        Ok(())
    }

    pub fn remove_item(&mut self, local_id: u64) {
        self.items.retain(|item| item.local_id != local_id);
        if self.items.is_empty() {
            self.items_step = None;
        }
    }

    /// Submits the repeating step's line items, mirroring `submit`'s
    /// in-flight and preserve-on-failure behavior.
    pub async fn submit_items(&mut self, step_index: usize) -> Result<u64, SessionError> {
        if self.is_submitting.get() {
            return Err(SessionError::SubmitInFlight);
        }
        self.check_items_step(step_index)?;
        let step = self.repeating_step(step_index)?;
        let payload = assemble_items(step, &self.items)?;

        self.is_submitting.set(true);
        let result = {
            let _reset = ResetOnDrop(&self.is_submitting);
            self.api.submit_items(&payload).await
        };
        match result {
            Ok(record_id) => {
                self.items.clear();
                self.items_step = None;
                Ok(record_id)
            }
            Err(err) => Err(submit_error(err)),
        }
    }

    fn check_items_step(&self, step_index: usize) -> Result<(), SessionError> {
        if let Some(expected) = self.items_step
            && expected != step_index
        {
            return Err(SessionError::ItemStep {
                expected,
                got: step_index,
            });
        }
        Ok(())
    }

    fn repeating_step(&self, step_index: usize) -> Result<&FormStep, SessionError> {
        let step = self
            .schema
            .steps
            .get(step_index)
            .ok_or(SessionError::NotRepeating(step_index))?;
        if !step.repeating {
            return Err(SessionError::NotRepeating(step_index));
        }
        Ok(step)
    }
}

impl<A: FormApi + 'static> Drop for FormSession<A> {
    fn drop(&mut self) {
        for (_, pending) in self.autosave.drain() {
            pending.abort();
        }
    }
}

struct ResetOnDrop<'a>(&'a Cell<bool>);

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

fn submit_error(err: ApiError) -> SessionError {
    match err {
        ApiError::Backend(message) => SessionError::Submit(message),
        other => {
            tracing::warn!(error = %other, "submission failed");
            SessionError::Submit("Penyimpanan gagal, silakan coba lagi".into())
        }
    }
}
