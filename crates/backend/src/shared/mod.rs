pub mod aggregation;
pub mod config;
pub mod errors;
pub mod filter;
pub mod format;
pub mod store;
