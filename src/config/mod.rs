//! Configuration loading and management.

mod file;
mod types;
mod validate;

pub use file::load_config_file;
pub use types::{Config, DetectionConfig, FilterConfig, Polarity, config_path_from_args};
pub use validate::validate_config;
