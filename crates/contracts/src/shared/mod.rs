pub mod analytics;
pub mod export;
pub mod filter;
pub mod response;
