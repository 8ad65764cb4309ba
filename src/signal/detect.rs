//! Locally exclusive threshold peak detection.

use crate::config::{DetectionConfig, Polarity};
use crate::constants::detect::MAD_SCALE;
use crate::error::Result;
use crate::signal::{Peak, PeakDetector};
use ndarray::ArrayView2;

/// Threshold detector with temporal and spatial duplicate suppression.
///
/// Per-channel noise is estimated as the median absolute deviation of the
/// filtered trace, scaled to a Gaussian sigma. A sample is a peak when it
/// crosses `threshold` times that noise level with the configured polarity
/// and is the extremum within the exclusion sweep across its own channel and
/// every channel within `radius_um` of it, so a spike spanning several
/// tetrode wires is reported once, on the wire where it is largest.
#[derive(Debug, Clone)]
pub struct LocallyExclusiveDetector {
    threshold: f32,
    polarity: Polarity,
    exclude_sweep_ms: f32,
    radius_um: f32,
}

impl LocallyExclusiveDetector {
    /// Create a detector from configuration.
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            threshold: config.threshold,
            polarity: config.polarity,
            exclude_sweep_ms: config.exclude_sweep_ms,
            radius_um: config.radius_um,
        }
    }

    fn score(&self, value: f32) -> f32 {
        match self.polarity {
            Polarity::Neg => -value,
            Polarity::Pos => value,
            Polarity::Both => value.abs(),
        }
    }
}

impl PeakDetector for LocallyExclusiveDetector {
    fn detect(
        &self,
        traces: ArrayView2<'_, f32>,
        positions: &[[f32; 2]],
        sample_rate: f32,
    ) -> Result<Vec<Peak>> {
        let (frames, channels) = traces.dim();
        debug_assert_eq!(positions.len(), channels);

        if frames == 0 || channels == 0 {
            return Ok(Vec::new());
        }

        let thresholds: Vec<f32> = (0..channels)
            .map(|channel| {
                let column: Vec<f32> = traces.column(channel).to_vec();
                self.threshold * mad_noise(column)
            })
            .collect();

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let sweep = (self.exclude_sweep_ms * sample_rate / 1000.0) as usize;
        let neighbors = neighbor_sets(positions, self.radius_um);

        let mut peaks = Vec::new();
        for t in sweep..frames.saturating_sub(sweep) {
            for channel in 0..channels {
                let score = self.score(traces[[t, channel]]);
                if score <= thresholds[channel] {
                    continue;
                }

                if self.is_local_extremum(traces, &neighbors[channel], t, channel, sweep, score) {
                    peaks.push(Peak {
                        sample_index: t,
                        channel,
                        amplitude: traces[[t, channel]],
                    });
                }
            }
        }

        Ok(peaks)
    }
}

impl LocallyExclusiveDetector {
    /// Whether the candidate is the extremum within the sweep window across
    /// all neighboring channels. Exact ties go to the earlier sample, then
    /// the lower channel, so one event never yields two peaks.
    #[allow(clippy::float_cmp)]
    fn is_local_extremum(
        &self,
        traces: ArrayView2<'_, f32>,
        neighbors: &[usize],
        t: usize,
        channel: usize,
        sweep: usize,
        score: f32,
    ) -> bool {
        for &other in neighbors {
            for k in t - sweep..=t + sweep {
                if k == t && other == channel {
                    continue;
                }
                let rival = self.score(traces[[k, other]]);
                if rival > score || (rival == score && (k, other) < (t, channel)) {
                    return false;
                }
            }
        }
        true
    }
}

/// Noise level of one channel: MAD scaled to Gaussian sigma.
fn mad_noise(mut samples: Vec<f32>) -> f32 {
    let center = median(&mut samples);
    for sample in &mut samples {
        *sample = (*sample - center).abs();
    }
    median(&mut samples) / MAD_SCALE
}

fn median(samples: &mut [f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.sort_by(f32::total_cmp);
    let mid = samples.len() / 2;
    if samples.len() % 2 == 0 {
        f32::midpoint(samples[mid - 1], samples[mid])
    } else {
        samples[mid]
    }
}

/// Channels within `radius_um` of each channel, self included.
fn neighbor_sets(positions: &[[f32; 2]], radius_um: f32) -> Vec<Vec<usize>> {
    let radius_sq = radius_um * radius_um;
    positions
        .iter()
        .map(|a| {
            positions
                .iter()
                .enumerate()
                .filter(|(_, b)| {
                    let dx = a[0] - b[0];
                    let dy = a[1] - b[1];
                    dx * dx + dy * dy <= radius_sq
                })
                .map(|(index, _)| index)
                .collect()
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use ndarray::Array2;

    const FS: f32 = 30_000.0;

    fn detector(polarity: Polarity, radius_um: f32) -> LocallyExclusiveDetector {
        LocallyExclusiveDetector::new(&DetectionConfig {
            threshold: 5.0,
            polarity,
            exclude_sweep_ms: 0.1,
            radius_um,
        })
    }

    /// Square tetrode, 10 um pitch.
    fn tetrode_positions() -> Vec<[f32; 2]> {
        vec![[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0]]
    }

    /// Background with MAD 10 plus injected impulses.
    fn background(frames: usize, channels: usize) -> Array2<f32> {
        Array2::from_shape_fn((frames, channels), |(t, _)| if t % 2 == 0 { 10.0 } else { -10.0 })
    }

    #[test]
    fn test_detects_injected_negative_impulse() {
        let mut traces = background(1000, 4);
        traces[[500, 2]] = -400.0;

        let peaks = detector(Polarity::Neg, 30.0)
            .detect(traces.view(), &tetrode_positions(), FS)
            .unwrap();

        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].sample_index, 500);
        assert_eq!(peaks[0].channel, 2);
        assert_eq!(peaks[0].amplitude, -400.0);
    }

    #[test]
    fn test_subthreshold_background_ignored() {
        let traces = background(1000, 4);
        let peaks = detector(Polarity::Neg, 30.0)
            .detect(traces.view(), &tetrode_positions(), FS)
            .unwrap();
        assert!(peaks.is_empty());
    }

    #[test]
    fn test_radius_suppresses_cross_channel_duplicate() {
        let mut traces = background(1000, 4);
        // Same event seen on two wires, larger on wire 0.
        traces[[500, 0]] = -500.0;
        traces[[501, 1]] = -300.0;

        let peaks = detector(Polarity::Neg, 30.0)
            .detect(traces.view(), &tetrode_positions(), FS)
            .unwrap();

        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].channel, 0);
    }

    #[test]
    fn test_distant_channels_detect_independently() {
        let mut traces = background(1000, 2);
        traces[[500, 0]] = -500.0;
        traces[[501, 1]] = -300.0;

        // Wires further apart than the exclusion radius.
        let positions = vec![[0.0, 0.0], [100.0, 0.0]];
        let peaks = detector(Polarity::Neg, 30.0)
            .detect(traces.view(), &positions, FS)
            .unwrap();

        assert_eq!(peaks.len(), 2);
    }

    #[test]
    fn test_sweep_suppresses_same_channel_duplicate() {
        let mut traces = background(1000, 1);
        traces[[500, 0]] = -500.0;
        traces[[502, 0]] = -300.0;

        let peaks = detector(Polarity::Neg, 30.0)
            .detect(traces.view(), &[[0.0, 0.0]], FS)
            .unwrap();

        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].sample_index, 500);
    }

    #[test]
    fn test_polarity_selects_sign() {
        let mut traces = background(1000, 1);
        traces[[300, 0]] = 400.0;
        traces[[600, 0]] = -400.0;

        let positions = [[0.0, 0.0]];

        let neg = detector(Polarity::Neg, 30.0)
            .detect(traces.view(), &positions, FS)
            .unwrap();
        assert_eq!(neg.len(), 1);
        assert_eq!(neg[0].sample_index, 600);

        let pos = detector(Polarity::Pos, 30.0)
            .detect(traces.view(), &positions, FS)
            .unwrap();
        assert_eq!(pos.len(), 1);
        assert_eq!(pos[0].sample_index, 300);

        let both = detector(Polarity::Both, 30.0)
            .detect(traces.view(), &positions, FS)
            .unwrap();
        assert_eq!(both.len(), 2);
        // Ascending sample order.
        assert!(both[0].sample_index < both[1].sample_index);
    }

    #[test]
    fn test_exact_tie_yields_single_peak() {
        let mut traces = background(1000, 2);
        traces[[500, 0]] = -400.0;
        traces[[500, 1]] = -400.0;

        let positions = vec![[0.0, 0.0], [10.0, 0.0]];
        let peaks = detector(Polarity::Neg, 30.0)
            .detect(traces.view(), &positions, FS)
            .unwrap();

        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].channel, 0);
    }

    #[test]
    fn test_mad_noise_matches_gaussian_scaling() {
        let samples: Vec<f32> = (0..1000)
            .map(|t| if t % 2 == 0 { 10.0 } else { -10.0 })
            .collect();
        approx::assert_abs_diff_eq!(
            mad_noise(samples),
            10.0 / crate::constants::detect::MAD_SCALE,
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_empty_traces() {
        let traces = Array2::<f32>::zeros((0, 0));
        let peaks = detector(Polarity::Neg, 30.0)
            .detect(traces.view(), &[], FS)
            .unwrap();
        assert!(peaks.is_empty());
    }
}
