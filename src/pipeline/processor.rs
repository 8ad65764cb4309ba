//! Single tetrode processing pipeline.

use crate::config::Config;
use crate::constants::MIN_GOOD_WIRES;
use crate::error::{Error, Result};
use crate::grouping::{ChannelGroup, channels_for_tetrode};
use crate::output::{progress, write_spike_file};
use crate::pipeline::{output_path_for, probe_file_for};
use crate::probe::ProbeLayout;
use crate::recording::Recording;
use crate::signal::{Filter, PeakDetector};
use crate::waveform::collect_waveforms;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Result of processing one tetrode.
#[derive(Debug)]
pub struct TetrodeResult {
    /// 1-based tetrode number.
    pub tetrode: u8,
    /// Number of detected peaks.
    pub peaks: usize,
    /// Path of the written MAT file.
    pub output_path: PathBuf,
}

/// Process one tetrode and write its spike file.
///
/// Returns `Ok(None)` without writing anything when the tetrode has fewer
/// than 3 good wires left after grouping.
pub fn process_tetrode(
    recording: &Recording,
    groups: &[ChannelGroup],
    tetrode: u8,
    config: &Config,
    filter: &dyn Filter,
    detector: &dyn PeakDetector,
) -> Result<Option<TetrodeResult>> {
    // User-facing tetrode numbers are 1-based.
    let Some(label) = tetrode.checked_sub(1) else {
        debug!("Skipping tetrode 0: tetrode numbers start at 1");
        return Ok(None);
    };
    let selection = channels_for_tetrode(groups, label);

    if selection.len() < MIN_GOOD_WIRES {
        debug!(
            "Skipping tetrode {}: only {} good wire(s)",
            tetrode,
            selection.len()
        );
        return Ok(None);
    }

    let Some(probe_name) = probe_file_for(selection.len()) else {
        // Unreachable with a validated wiring map; skip rather than abort.
        warn!(
            "Skipping tetrode {}: no probe layout for {} wires",
            tetrode,
            selection.len()
        );
        return Ok(None);
    };

    info!(
        "Processing tetrode {} ({} wires, channels {:?})",
        tetrode, selection.len(), selection
    );

    let probe_path = config.probe_path(probe_name);
    let layout = ProbeLayout::load(&probe_path)?;
    if layout.num_channels() != selection.len() {
        return Err(Error::ProbeChannelMismatch {
            path: layout.path().to_path_buf(),
            found: layout.num_channels(),
            expected: selection.len(),
        });
    }

    let mut traces = recording.read_traces(&selection)?;
    filter.apply(&mut traces, recording.sample_rate())?;

    let positions = layout.positions();
    let peaks = detector.detect(traces.view(), &positions, recording.sample_rate())?;
    info!("Found {} peak(s) on tetrode {}", peaks.len(), tetrode);

    let bar = progress::create_waveform_progress(peaks.len(), tetrode, config.progress);
    let blocks = collect_waveforms(traces.view(), &peaks, bar.as_ref());
    progress::finish_progress(bar, "Waveforms collected");

    #[allow(clippy::cast_possible_wrap)]
    let timestamps: Vec<i64> = peaks.iter().map(|peak| peak.sample_index as i64).collect();

    let output_path = output_path_for(&config.output_dir, tetrode);
    write_spike_file(&output_path, &timestamps, blocks.view())?;
    info!("Wrote {}", output_path.display());

    Ok(Some(TetrodeResult {
        tetrode,
        peaks: peaks.len(),
        output_path,
    }))
}
