use async_trait::async_trait;
use karat_form::{
    FieldOption, FormSchema, ItemSubmission, SubmissionPayload, WireOptionValue,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::context::SessionContext;
use crate::error::ApiError;

/// One value entry of a per-field patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchValue {
    pub field_value_id: u64,
    pub value: String,
}

impl From<WireOptionValue> for PatchValue {
    fn from(pair: WireOptionValue) -> Self {
        Self {
            field_value_id: pair.option_value_id,
            value: pair.value,
        }
    }
}

/// A single field's patched value, used for per-field autosave in edit flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPatch {
    pub transaction_detail_id: u64,
    pub field_id: u64,
    pub value: Vec<PatchValue>,
}

/// The form engine's contract with the REST backend. All persistence and
/// business rules live behind it.
#[async_trait]
pub trait FormApi: Send + Sync {
    async fn fetch_schema(&self, code: &str) -> Result<FormSchema, ApiError>;
    /// Resolves a related record by lookup key; `None` means no match.
    async fn lookup(&self, key: &str) -> Result<Option<Value>, ApiError>;
    /// Persists a new option; the caller appends it locally only on success.
    async fn create_option(&self, field_id: u64, text: &str) -> Result<FieldOption, ApiError>;
    async fn submit(&self, payload: &SubmissionPayload) -> Result<u64, ApiError>;
    async fn submit_items(&self, payload: &ItemSubmission) -> Result<u64, ApiError>;
    async fn update_field(&self, patch: &FieldPatch) -> Result<(), ApiError>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedOption {
    id: u64,
    value: String,
}

#[derive(Debug, Deserialize)]
struct SubmitReceipt {
    id: u64,
}

/// reqwest-backed implementation speaking the backend's JSON envelope.
#[derive(Debug, Clone)]
pub struct HttpFormApi {
    http: reqwest::Client,
    ctx: SessionContext,
}

impl HttpFormApi {
    pub fn new(http: reqwest::Client, ctx: SessionContext) -> Self {
        Self { http, ctx }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.ctx
            .endpoint(path)
            .map_err(|err| ApiError::Backend(format!("invalid endpoint '{path}': {err}")))
    }

    async fn read<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let status = resp.status();
        if status.is_success() {
            let envelope: Envelope<T> = resp.json().await?;
            Ok(envelope.data)
        } else {
            let message = resp
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            Err(ApiError::Backend(message))
        }
    }
}

#[async_trait]
impl FormApi for HttpFormApi {
    async fn fetch_schema(&self, code: &str) -> Result<FormSchema, ApiError> {
        let mut url = self.endpoint("form-schema")?;
        url.query_pairs_mut().append_pair("code", code);
        tracing::debug!(%url, "fetching form schema");
        let resp = self.http.get(url).send().await?;
        let schema: FormSchema = Self::read(resp).await?;
        Ok(FormSchema::new(schema.steps))
    }

    async fn lookup(&self, key: &str) -> Result<Option<Value>, ApiError> {
        let mut url = self.endpoint("lookup")?;
        url.query_pairs_mut().append_pair("key", key);
        tracing::debug!(%url, "looking up related record");
        let resp = self.http.get(url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::read(resp).await
    }

    async fn create_option(&self, field_id: u64, text: &str) -> Result<FieldOption, ApiError> {
        let url = self.endpoint(&format!("fields/{field_id}/options"))?;
        tracing::debug!(%url, text, "creating option");
        let resp = self
            .http
            .post(url)
            .json(&serde_json::json!({ "value": text }))
            .send()
            .await?;
        let created: CreatedOption = Self::read(resp).await?;
        Ok(FieldOption {
            option_id: created.id,
            text: created.value,
        })
    }

    async fn submit(&self, payload: &SubmissionPayload) -> Result<u64, ApiError> {
        let url = self.endpoint("submissions")?;
        tracing::debug!(%url, "submitting form");
        let resp = self.http.post(url).json(payload).send().await?;
        let receipt: SubmitReceipt = Self::read(resp).await?;
        Ok(receipt.id)
    }

    async fn submit_items(&self, payload: &ItemSubmission) -> Result<u64, ApiError> {
        let url = self.endpoint("item-submissions")?;
        tracing::debug!(%url, items = payload.items.len(), "submitting line items");
        let resp = self.http.post(url).json(payload).send().await?;
        let receipt: SubmitReceipt = Self::read(resp).await?;
        Ok(receipt.id)
    }

    async fn update_field(&self, patch: &FieldPatch) -> Result<(), ApiError> {
        let url = self.endpoint("field-values")?;
        tracing::debug!(%url, field_id = patch.field_id, "patching field value");
        let resp = self.http.post(url).json(patch).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = resp
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            Err(ApiError::Backend(message))
        }
    }
}
