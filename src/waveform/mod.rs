//! Waveform windowing around detected peaks.

use crate::constants::window;
use crate::signal::Peak;
use indicatif::ProgressBar;
use ndarray::{Array3, ArrayView2};

/// Copy a fixed window around every peak into a waveform block stack.
///
/// Each block covers `[s - 8, s + 24)`: 32 samples with the peak at row 8,
/// stored as [sample, channel, peak]. Windows running past either end of the
/// recording leave their block all-zero; the peak keeps its slot (and its
/// timestamp downstream) but carries no samples.
pub fn collect_waveforms(
    traces: ArrayView2<'_, f32>,
    peaks: &[Peak],
    progress: Option<&ProgressBar>,
) -> Array3<i16> {
    let (frames, channels) = traces.dim();
    let mut blocks = Array3::zeros((window::SAMPLES, channels, peaks.len()));

    for (index, peak) in peaks.iter().enumerate() {
        #[allow(clippy::cast_possible_wrap)]
        let start = peak.sample_index as i64 - window::PRE_PEAK as i64;
        let end = peak.sample_index + window::POST_PEAK;

        if start >= 0 && end <= frames {
            #[allow(clippy::cast_sign_loss)]
            let start = start as usize;
            for (row, frame) in (start..end).enumerate() {
                for channel in 0..channels {
                    // f32 to i16 saturates at the ADC range edges.
                    #[allow(clippy::cast_possible_truncation)]
                    let value = traces[[frame, channel]] as i16;
                    blocks[[row, channel, index]] = value;
                }
            }
        }

        if let Some(bar) = progress {
            bar.inc(1);
        }
    }

    blocks
}
