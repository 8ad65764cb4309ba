//! Configuration type definitions.

use crate::constants::{DEFAULT_WIRING_MAP, detect, filter};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete extraction run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Recording directory containing the `.continuous` channel files.
    pub input_dir: PathBuf,

    /// Directory receiving one MAT file per processed tetrode.
    pub output_dir: PathBuf,

    /// Directory containing the probe geometry files.
    pub probe_dir: PathBuf,

    /// Channel quality table file. Relative paths resolve against
    /// `input_dir`, matching where acquisition software drops the file.
    pub channel_quality_path: PathBuf,

    /// 1-based tetrode numbers to process, as labelled on the drive.
    pub tetrode_selection: Vec<u8>,

    /// Physical channel index to tetrode index wiring map.
    pub wiring_map: Vec<u8>,

    /// Peak detection settings.
    pub detection: DetectionConfig,

    /// Bandpass filter settings.
    pub filter: FilterConfig,

    /// Whether to draw progress bars during extraction.
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            output_dir: PathBuf::new(),
            probe_dir: PathBuf::new(),
            channel_quality_path: PathBuf::new(),
            tetrode_selection: Vec::new(),
            wiring_map: DEFAULT_WIRING_MAP.to_vec(),
            detection: DetectionConfig::default(),
            filter: FilterConfig::default(),
            progress: true,
        }
    }
}

impl Config {
    /// Quality table path with relative paths resolved against `input_dir`.
    pub fn quality_table_path(&self) -> PathBuf {
        if self.channel_quality_path.is_absolute() {
            self.channel_quality_path.clone()
        } else {
            self.input_dir.join(&self.channel_quality_path)
        }
    }

    /// Number of tetrodes described by the wiring map.
    pub fn num_tetrodes(&self) -> usize {
        self.wiring_map
            .iter()
            .max()
            .map_or(0, |&max| usize::from(max) + 1)
    }

    /// Probe geometry file path for a given probe file name.
    pub fn probe_path(&self, file_name: &str) -> PathBuf {
        self.probe_dir.join(file_name)
    }
}

/// Peak detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Detection threshold as a multiple of the per-channel noise MAD.
    pub threshold: f32,

    /// Which peak polarity to detect.
    pub polarity: Polarity,

    /// Temporal exclusion sweep in milliseconds.
    pub exclude_sweep_ms: f32,

    /// Spatial exclusion radius in micrometers.
    pub radius_um: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: detect::DEFAULT_THRESHOLD,
            polarity: Polarity::default(),
            exclude_sweep_ms: detect::DEFAULT_EXCLUDE_SWEEP_MS,
            radius_um: detect::DEFAULT_RADIUS_UM,
        }
    }
}

/// Peak polarity selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Detect negative-going peaks only.
    #[default]
    Neg,
    /// Detect positive-going peaks only.
    Pos,
    /// Detect peaks of either polarity.
    Both,
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Neg => write!(f, "neg"),
            Self::Pos => write!(f, "pos"),
            Self::Both => write!(f, "both"),
        }
    }
}

/// Bandpass filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// High-pass cutoff in Hz.
    pub freq_min_hz: f32,

    /// Low-pass cutoff in Hz.
    pub freq_max_hz: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            freq_min_hz: filter::DEFAULT_FREQ_MIN_HZ,
            freq_max_hz: filter::DEFAULT_FREQ_MAX_HZ,
        }
    }
}

/// Resolve the config file path from the process arguments.
///
/// The binary takes at most one argument, the config file path; everything
/// else lives in the file itself.
pub fn config_path_from_args<I>(mut args: I) -> PathBuf
where
    I: Iterator<Item = String>,
{
    args.next()
        .map_or_else(|| PathBuf::from(crate::constants::DEFAULT_CONFIG_FILE), PathBuf::from)
}
