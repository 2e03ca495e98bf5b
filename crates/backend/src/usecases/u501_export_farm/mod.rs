pub mod coordinator;
pub mod csv_writer;

pub use coordinator::ExportCoordinator;
pub use csv_writer::{file_name, to_csv};
