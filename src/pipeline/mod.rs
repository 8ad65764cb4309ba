//! Processing pipeline components.

mod coordinator;
mod processor;

pub use coordinator::{output_path_for, probe_file_for};
pub use processor::{TetrodeResult, process_tetrode};
