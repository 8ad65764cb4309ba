//! Pipeline coordination: output and probe file selection.

use crate::constants::{output, probe_files};
use std::path::{Path, PathBuf};

/// Output MAT file path for a tetrode (1-based number, as on the drive).
pub fn output_path_for(output_dir: &Path, tetrode: u8) -> PathBuf {
    output_dir.join(format!(
        "{}{}.{}",
        output::FILE_PREFIX,
        tetrode,
        output::FILE_EXTENSION
    ))
}

/// Probe geometry file name for a good-wire count.
///
/// Only 3- and 4-wire layouts exist; callers have already excluded smaller
/// counts and the wiring map cannot produce larger ones.
pub fn probe_file_for(wire_count: usize) -> Option<&'static str> {
    match wire_count {
        4 => Some(probe_files::TET4),
        3 => Some(probe_files::TET3),
        _ => None,
    }
}
