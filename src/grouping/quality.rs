//! Channel quality table loading.

use crate::constants::quality_table;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Per-tetrode wire quality flags loaded from a delimited text file.
///
/// # File Format
/// - Comma-delimited numeric table, one row per tetrode (1-based on disk)
/// - 5 columns: the first carries the tetrode number and is ignored,
///   columns 2-5 are per-wire flags (0 = bad wire, nonzero = good)
/// - The table may have more rows than the wiring map has tetrodes;
///   extra rows are ignored
#[derive(Debug, Clone)]
pub struct QualityTable {
    path: PathBuf,
    rows: Vec<[f32; crate::constants::WIRES_PER_TETRODE]>,
}

impl QualityTable {
    /// Load a quality table from a comma-delimited file.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| Error::QualityTableRead {
                path: path.to_path_buf(),
                source: e,
            })?;

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|e| Error::QualityTableRead {
                path: path.to_path_buf(),
                source: e,
            })?;

            if record.len() < quality_table::COLUMNS {
                return Err(Error::QualityTableColumns {
                    path: path.to_path_buf(),
                    row: index + 1,
                    columns: record.len(),
                    expected: quality_table::COLUMNS,
                });
            }

            let mut flags = [0.0f32; crate::constants::WIRES_PER_TETRODE];
            for (wire, flag) in flags.iter_mut().enumerate() {
                let column = quality_table::FIRST_WIRE_COLUMN + wire;
                let cell = record.get(column).unwrap_or("");
                *flag = cell.parse().map_err(|_| Error::QualityTableValue {
                    path: path.to_path_buf(),
                    row: index + 1,
                    column: column + 1,
                })?;
            }
            rows.push(flags);
        }

        Ok(Self {
            path: path.to_path_buf(),
            rows,
        })
    }

    /// Whether the given wire of the given tetrode is flagged usable.
    ///
    /// A quality value of exactly zero marks a bad wire.
    pub fn wire_ok(&self, tetrode: usize, wire: usize) -> bool {
        self.rows
            .get(tetrode)
            .is_some_and(|flags| flags.get(wire).is_some_and(|&flag| flag != 0.0))
    }

    /// Number of tetrode rows in the table.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Path the table was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
