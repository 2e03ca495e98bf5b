pub mod service;

pub use service::FarmAnalytics;
