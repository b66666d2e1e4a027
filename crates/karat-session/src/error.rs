use karat_form::{AssembleError, CodecError};
use thiserror::Error;

/// Failures from the REST layer. Backend-provided messages are preserved so
/// the UI can surface them verbatim.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Backend(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Session-level error taxonomy. No error escapes a session operation
/// un-converted into one of these, and nothing is retried automatically.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The form cannot render at all; the caller must reload.
    #[error("form schema could not be loaded: {0}")]
    SchemaLoad(#[source] ApiError),
    /// Non-fatal: the attempted option was not added and the previous
    /// selection is still in place.
    #[error("option could not be created: {0}")]
    OptionCreate(#[source] ApiError),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Submit(String),
    #[error("submission already in flight")]
    SubmitInFlight,
    #[error("unknown field {0}")]
    UnknownField(u64),
    #[error("step {0} is not an item-list step")]
    NotRepeating(usize),
    /// The session's line items were created under a different step.
    #[error("line items belong to step {expected}, not step {got}")]
    ItemStep { expected: usize, got: usize },
    #[error("value shape does not match field {0}")]
    Shape(u64),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}
