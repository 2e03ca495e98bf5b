//! Generic access to farm records
//!
//! One service parameterized by a `'static` [`EntitySchema`] serves every
//! entity type of the catalog.
//!
//! [`EntitySchema`]: contracts::domain::common::EntitySchema

pub mod ownership;
pub mod registry;
pub mod service;

pub use registry::{registry, SchemaRegistry};
pub use service::{FullList, ListResult, RecordAccessService};
