//! Schema descriptor and few-shot examples used to ground query generation

mod descriptor;
mod examples;

pub use descriptor::{FieldDescriptor, FieldType, SchemaDescriptor, PHONES_RELATION};
pub use examples::{FewShotExample, FewShotExamples};
