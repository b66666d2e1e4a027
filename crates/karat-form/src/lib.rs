#![allow(missing_docs)]

pub mod assemble;
pub mod codec;
pub mod control;
pub mod items;
pub mod navigator;
pub mod serde_helpers;
pub mod spec;
pub mod validate;
pub mod value;

pub use assemble::{
    AssembleError, DetailEntry, ItemEntry, ItemSubmission, SubmissionPayload, assemble_flat,
    assemble_items, resolved_role,
};
pub use codec::{
    CodecError, WireOptionValue, decode, digits_only, encode, group_digits, group_thousands,
    wire_values,
};
pub use control::{Control, MonthCursor, number_display, render_control};
pub use items::{ItemError, LocalIds, RepeatingItem, reconstruct_items};
pub use navigator::StepNavigator;
pub use spec::{FieldDefinition, FieldOption, FormSchema, FormStep, SemanticRole, ValueType};
pub use validate::{BalanceCheck, ValidationError, ValidationResult, check_required};
pub use value::{FieldValue, OptionChoice};
