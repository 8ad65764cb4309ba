//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config files and user-facing messages.
pub const APP_NAME: &str = "tetspike";

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tetspike.toml";

/// Number of wires in a full tetrode.
pub const WIRES_PER_TETRODE: usize = 4;

/// Minimum number of good wires required to process a tetrode.
///
/// Tetrodes with fewer good wires are skipped without producing output.
pub const MIN_GOOD_WIRES: usize = 3;

/// Default hardware wiring map: physical channel index to tetrode index.
///
/// 32 channels, 4 contiguous channels per tetrode, tetrode indices 0-7.
pub const DEFAULT_WIRING_MAP: [u8; 32] = [
    0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, //
    4, 4, 4, 4, 5, 5, 5, 5, 6, 6, 6, 6, 7, 7, 7, 7,
];

/// Spike waveform window geometry.
///
/// The peak sits at sample offset 8 within a 32-sample window, matching the
/// Neuralynx acquisition convention so the exported blocks can be converted
/// to `.ntt` records downstream.
pub mod window {
    /// Total samples per waveform window.
    pub const SAMPLES: usize = 32;
    /// Samples before the peak.
    pub const PRE_PEAK: usize = 8;
    /// Samples from the peak onward.
    pub const POST_PEAK: usize = 24;
}

/// Bandpass filter defaults.
pub mod filter {
    /// Default high-pass cutoff in Hz.
    pub const DEFAULT_FREQ_MIN_HZ: f32 = 600.0;
    /// Default low-pass cutoff in Hz.
    pub const DEFAULT_FREQ_MAX_HZ: f32 = 6000.0;
}

/// Peak detection defaults.
pub mod detect {
    /// Default detection threshold as a multiple of the per-channel noise MAD.
    pub const DEFAULT_THRESHOLD: f32 = 5.0;
    /// Default temporal exclusion sweep in milliseconds.
    pub const DEFAULT_EXCLUDE_SWEEP_MS: f32 = 0.1;
    /// Default spatial exclusion radius in micrometers.
    ///
    /// The tetrode layout is a 10x10 um square; 30 um covers the whole group.
    pub const DEFAULT_RADIUS_UM: f32 = 30.0;
    /// Scale factor relating the median absolute deviation to the standard
    /// deviation of a Gaussian.
    pub const MAD_SCALE: f32 = 0.674_489_75;
}

/// Probe geometry file names, selected by good-wire count.
pub mod probe_files {
    /// Probe description for a 4-wire tetrode.
    pub const TET4: &str = "tet4_probe.prb";
    /// Probe description for a 3-wire tetrode.
    pub const TET3: &str = "tet3_probe.prb";
}

/// Quality table layout.
pub mod quality_table {
    /// Columns per row: tetrode number plus one flag per wire.
    pub const COLUMNS: usize = 1 + super::WIRES_PER_TETRODE;
    /// Index of the first wire-flag column.
    pub const FIRST_WIRE_COLUMN: usize = 1;
}

/// Output file naming and MAT variable names.
pub mod output {
    /// Output file name prefix, followed by the 1-based tetrode number.
    pub const FILE_PREFIX: &str = "tt";
    /// Output file extension.
    pub const FILE_EXTENSION: &str = "mat";
    /// MAT variable holding the peak sample indices.
    pub const TIMESTAMPS_VAR: &str = "Timestamps";
    /// MAT variable holding the waveform block stack.
    pub const SPIKES_VAR: &str = "Spikes";
}
