pub mod config;
pub mod input;
pub mod report;

pub use config::{Algorithm, ConfigError, GroupingConfig};
pub use input::{load_items, scan_file_names, InputError, InputFormat};
pub use report::{GroupingReport, ReportError};
