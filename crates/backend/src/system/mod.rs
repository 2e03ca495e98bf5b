pub mod app_state;
pub mod auth;
pub mod middleware;
pub mod tracing;
