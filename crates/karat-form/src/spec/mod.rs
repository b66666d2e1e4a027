pub mod field;
pub mod step;

pub use field::{FieldDefinition, FieldOption, SemanticRole, ValueType};
pub use step::{FormSchema, FormStep};
