//! Error types for tetspike.

/// Result type alias for tetspike operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for tetspike.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to read the channel quality table.
    #[error("failed to read quality table '{path}'")]
    QualityTableRead {
        /// Path to the quality table file.
        path: std::path::PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// A quality table cell could not be parsed as a number.
    #[error("invalid value in quality table '{path}' at row {row}, column {column}")]
    QualityTableValue {
        /// Path to the quality table file.
        path: std::path::PathBuf,
        /// 1-based row number on disk.
        row: usize,
        /// 1-based column number on disk.
        column: usize,
    },

    /// A quality table row has too few columns.
    #[error("quality table '{path}' row {row} has {columns} columns, expected {expected}")]
    QualityTableColumns {
        /// Path to the quality table file.
        path: std::path::PathBuf,
        /// 1-based row number on disk.
        row: usize,
        /// Number of columns found.
        columns: usize,
        /// Number of columns required.
        expected: usize,
    },

    /// The quality table has fewer rows than the wiring map has tetrodes.
    #[error("quality table '{path}' has {rows} rows, need {required}")]
    QualityTableRows {
        /// Path to the quality table file.
        path: std::path::PathBuf,
        /// Number of rows found.
        rows: usize,
        /// Number of rows required.
        required: usize,
    },

    /// Failed to open the recording directory.
    #[error("failed to open recording directory '{path}'")]
    RecordingOpen {
        /// Path to the recording directory.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// No continuous channel files found in the recording directory.
    #[error("no .continuous channel files found in '{path}'")]
    NoContinuousFiles {
        /// Path to the recording directory.
        path: std::path::PathBuf,
    },

    /// A continuous file header is malformed.
    #[error("malformed continuous header in '{path}': {message}")]
    ContinuousHeader {
        /// Path to the continuous file.
        path: std::path::PathBuf,
        /// Description of the header problem.
        message: String,
    },

    /// A continuous file data record is malformed.
    #[error("malformed record in '{path}' at byte offset {offset}: {message}")]
    ContinuousRecord {
        /// Path to the continuous file.
        path: std::path::PathBuf,
        /// Byte offset of the bad record.
        offset: u64,
        /// Description of the record problem.
        message: String,
    },

    /// Channel files disagree on the sample rate.
    #[error("sample rate mismatch: '{path}' has {found} Hz, expected {expected} Hz")]
    SampleRateMismatch {
        /// Path of the disagreeing channel file.
        path: std::path::PathBuf,
        /// Sample rate found in that file.
        found: f32,
        /// Sample rate of the first channel file.
        expected: f32,
    },

    /// Recording channel count does not match the wiring map.
    #[error("recording has {found} channels, wiring map expects {expected}")]
    ChannelCountMismatch {
        /// Number of channels in the recording.
        found: usize,
        /// Number of entries in the wiring map.
        expected: usize,
    },

    /// Failed to read a probe geometry file.
    #[error("failed to read probe file '{path}'")]
    ProbeRead {
        /// Path to the probe file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a probe geometry file.
    #[error("failed to parse probe file '{path}': {message}")]
    ProbeParse {
        /// Path to the probe file.
        path: std::path::PathBuf,
        /// Description of the parse failure.
        message: String,
    },

    /// Probe geometry does not match the selected channel count.
    #[error("probe '{path}' describes {found} channels, tetrode has {expected}")]
    ProbeChannelMismatch {
        /// Path to the probe file.
        path: std::path::PathBuf,
        /// Number of channels in the probe file.
        found: usize,
        /// Number of selected tetrode wires.
        expected: usize,
    },

    /// Filter design failed.
    #[error("filter design failed: {reason}")]
    FilterDesign {
        /// Description of the design failure.
        reason: String,
    },

    /// Failed to create the output directory.
    #[error("failed to create output directory '{path}'")]
    OutputDirCreate {
        /// Path to the output directory.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a MAT output file.
    #[error("failed to write MAT file '{path}'")]
    MatWrite {
        /// Path to the MAT file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
