#![allow(missing_docs)]

pub mod api;
pub mod autofill;
pub mod context;
pub mod error;
pub mod session;

pub use api::{FieldPatch, FormApi, HttpFormApi, PatchValue};
pub use autofill::{
    AutofillMap, AutofillResolver, AutofillRule, AutofillState, LookupStatus, MappedField,
};
pub use context::{Role, SessionContext};
pub use error::{ApiError, SessionError};
pub use session::{BalanceSpec, FormSession};
