//! Common types for all farm record entities

pub mod farm_record;
pub mod schema;

// Re-exports
pub use farm_record::{FarmRecord, RecordPayload};
pub use schema::{DerivedFieldRule, EntitySchema, FieldDef, FieldKind};
