//! Tetspike - tetrode spike waveform extraction.
//!
//! Extracts spike waveforms from Open Ephys legacy recordings, one MAT file
//! per tetrode, for downstream conversion to Neuralynx `.ntt` spike records.

#![warn(missing_docs)]

pub mod config;
pub mod constants;
pub mod error;
pub mod grouping;
pub mod output;
pub mod pipeline;
pub mod probe;
pub mod recording;
pub mod signal;
pub mod waveform;

use config::{Config, config_path_from_args, load_config_file, validate_config};
use grouping::{QualityTable, assign_groups};
use output::progress;
use pipeline::process_tetrode;
use recording::Recording;
use signal::{BandpassFilter, LocallyExclusiveDetector};
use tracing::info;

pub use error::{Error, Result};

/// Main entry point for the tetspike binary.
pub fn run() -> Result<()> {
    init_logging();

    let config_path = config_path_from_args(std::env::args().skip(1));
    info!("Loading config: {}", config_path.display());
    let config = load_config_file(&config_path)?;
    validate_config(&config)?;

    extract(&config)
}

/// Run a full extraction for every selected tetrode.
pub fn extract(config: &Config) -> Result<()> {
    use std::time::Instant;

    let start = Instant::now();

    let quality_path = config.quality_table_path();
    info!("Loading quality table: {}", quality_path.display());
    let table = QualityTable::load(&quality_path)?;
    let groups = assign_groups(&config.wiring_map, &table)?;

    let recording = Recording::open(&config.input_dir)?;
    if recording.num_channels() != config.wiring_map.len() {
        return Err(Error::ChannelCountMismatch {
            found: recording.num_channels(),
            expected: config.wiring_map.len(),
        });
    }
    info!(
        "Opened recording {}: {} channels, {} samples at {} Hz",
        recording.dir().display(),
        recording.num_channels(),
        recording.num_samples(),
        recording.sample_rate()
    );

    std::fs::create_dir_all(&config.output_dir).map_err(|e| Error::OutputDirCreate {
        path: config.output_dir.clone(),
        source: e,
    })?;

    let filter = BandpassFilter::new(&config.filter);
    let detector = LocallyExclusiveDetector::new(&config.detection);

    let bar = progress::create_tetrode_progress(config.tetrode_selection.len(), config.progress);

    let mut processed = 0usize;
    let mut skipped = 0usize;
    let mut total_peaks = 0usize;

    for &tetrode in &config.tetrode_selection {
        match process_tetrode(&recording, &groups, tetrode, config, &filter, &detector)? {
            Some(result) => {
                processed += 1;
                total_peaks += result.peaks;
            }
            None => skipped += 1,
        }
        progress::inc_progress(bar.as_ref());
    }

    progress::finish_progress(bar, "Complete");

    info!(
        "Complete: {} tetrode(s) processed, {} skipped, {} peaks in {:.2}s",
        processed,
        skipped,
        total_peaks,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}
