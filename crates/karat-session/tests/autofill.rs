use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use karat_form::{
    FieldDefinition, FieldOption, FieldValue, FormSchema, FormStep, ItemSubmission, SemanticRole,
    SubmissionPayload, ValueType,
};
use karat_session::{ApiError, AutofillMap, AutofillResolver, FieldPatch, FormApi, LookupStatus};
use serde_json::{Value, json};
use time::macros::date;

struct FakeApi {
    lookups: Mutex<Vec<String>>,
    record: Option<Value>,
    fail_lookup: bool,
}

impl FakeApi {
    fn with_record(record: Value) -> Self {
        Self {
            lookups: Mutex::new(Vec::new()),
            record: Some(record),
            fail_lookup: false,
        }
    }

    fn not_found() -> Self {
        Self {
            lookups: Mutex::new(Vec::new()),
            record: None,
            fail_lookup: false,
        }
    }

    fn failing() -> Self {
        Self {
            lookups: Mutex::new(Vec::new()),
            record: None,
            fail_lookup: true,
        }
    }

    fn lookup_keys(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl FormApi for FakeApi {
    async fn fetch_schema(&self, _code: &str) -> Result<FormSchema, ApiError> {
        unimplemented!("not exercised here")
    }

    async fn lookup(&self, key: &str) -> Result<Option<Value>, ApiError> {
        self.lookups.lock().unwrap().push(key.to_string());
        if self.fail_lookup {
            return Err(ApiError::Backend("lookup unavailable".into()));
        }
        Ok(self.record.clone())
    }

    async fn create_option(&self, _field_id: u64, _text: &str) -> Result<FieldOption, ApiError> {
        unimplemented!("not exercised here")
    }

    async fn submit(&self, _payload: &SubmissionPayload) -> Result<u64, ApiError> {
        unimplemented!("not exercised here")
    }

    async fn submit_items(&self, _payload: &ItemSubmission) -> Result<u64, ApiError> {
        unimplemented!("not exercised here")
    }

    async fn update_field(&self, _patch: &FieldPatch) -> Result<(), ApiError> {
        unimplemented!("not exercised here")
    }
}

fn field(id: u64, label: &str, kind: ValueType) -> FieldDefinition {
    FieldDefinition {
        id,
        label: label.into(),
        value_type: kind,
        max_length: 0,
        required: false,
        options: vec![],
        semantic_role: SemanticRole::None,
    }
}

fn customer_schema() -> FormSchema {
    FormSchema::new(vec![FormStep {
        step_number: 1,
        step_name: "Pelanggan".into(),
        default_step: true,
        repeating: false,
        fields: vec![
            field(1, "Nama Pelanggan", ValueType::Text),
            field(2, "Tanggal Lahir", ValueType::Date),
            field(3, "Catatan", ValueType::Text),
        ],
    }])
}

fn resolver(api: Arc<FakeApi>, debounce_ms: u64) -> AutofillResolver<FakeApi> {
    AutofillResolver::new(
        api,
        &AutofillMap::customer(),
        &customer_schema(),
        Duration::from_millis(debounce_ms),
    )
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn rapid_keystrokes_coalesce_into_one_lookup() {
    let api = Arc::new(FakeApi::with_record(json!({
        "name": "Siti Rahma",
        "date_of_birth": "1990-01-01",
    })));
    let mut resolver = resolver(Arc::clone(&api), 500);

    resolver.input("A");
    tokio::time::sleep(Duration::from_millis(100)).await;
    resolver.input("AB");
    tokio::time::sleep(Duration::from_millis(100)).await;
    resolver.input("ABC");
    tokio::time::sleep(Duration::from_millis(700)).await;
    settle().await;

    assert_eq!(api.lookup_keys(), vec!["ABC".to_string()]);

    let state = resolver.snapshot();
    assert_eq!(state.status, LookupStatus::Found);
    assert_eq!(
        state.fields.get(&1),
        Some(&FieldValue::Text("Siti Rahma".into()))
    );
    assert_eq!(
        state.fields.get(&2),
        Some(&FieldValue::Date(Some(date!(1990 - 01 - 01))))
    );
    // Unmapped fields are never touched.
    assert!(!state.fields.contains_key(&3));
}

#[tokio::test(start_paused = true)]
async fn empty_input_clears_synchronously_without_a_request() {
    let api = Arc::new(FakeApi::with_record(json!({ "name": "Siti" })));
    let mut resolver = resolver(Arc::clone(&api), 500);

    resolver.input("AB");
    resolver.input("   ");

    let state = resolver.snapshot();
    assert_eq!(state.status, LookupStatus::New);
    assert!(state.record.is_none());
    assert_eq!(state.fields.get(&1), Some(&FieldValue::Text(String::new())));

    // The superseded keystroke's timer never fires.
    tokio::time::sleep(Duration::from_millis(2_000)).await;
    settle().await;
    assert!(api.lookup_keys().is_empty());
}

#[tokio::test(start_paused = true)]
async fn not_found_behaves_like_empty_input() {
    let api = Arc::new(FakeApi::not_found());
    let mut resolver = resolver(Arc::clone(&api), 500);

    resolver.input("M-404");
    tokio::time::sleep(Duration::from_millis(600)).await;
    settle().await;

    assert_eq!(api.lookup_keys().len(), 1);
    let state = resolver.snapshot();
    assert_eq!(state.status, LookupStatus::New);
    assert_eq!(state.fields.get(&1), Some(&FieldValue::Text(String::new())));
}

#[tokio::test(start_paused = true)]
async fn lookup_failure_behaves_like_no_match() {
    let api = Arc::new(FakeApi::failing());
    let mut resolver = resolver(Arc::clone(&api), 500);

    resolver.input("M-001");
    tokio::time::sleep(Duration::from_millis(600)).await;
    settle().await;

    let state = resolver.snapshot();
    assert_eq!(state.status, LookupStatus::New);
    assert!(state.record.is_none());
}

#[tokio::test(start_paused = true)]
async fn longer_debounce_delays_dispatch() {
    let api = Arc::new(FakeApi::with_record(json!({ "name": "Siti" })));
    let mut resolver = resolver(Arc::clone(&api), 1_500);

    resolver.input("M-001");
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    settle().await;
    assert!(api.lookup_keys().is_empty());

    tokio::time::sleep(Duration::from_millis(600)).await;
    settle().await;
    assert_eq!(api.lookup_keys().len(), 1);
}
