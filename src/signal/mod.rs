//! Filtering and peak detection.
//!
//! Both stages sit behind capability traits so the windowing and export
//! logic downstream stays decoupled from the concrete signal processing and
//! can run against synthetic stand-ins in tests.

mod bandpass;
mod detect;

pub use bandpass::BandpassFilter;
pub use detect::LocallyExclusiveDetector;

use crate::error::Result;
use ndarray::{Array2, ArrayView2};

/// A detected peak.
///
/// Only `sample_index` is consumed by the windowing and export stages; the
/// channel and amplitude are carried for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Sample index of the peak within the recording.
    pub sample_index: usize,
    /// Renamed (0-based) channel the peak was detected on.
    pub channel: usize,
    /// Filtered amplitude at the peak.
    pub amplitude: f32,
}

/// In-place filtering of frames x channels traces.
pub trait Filter {
    /// Filter all channels of `traces`.
    fn apply(&self, traces: &mut Array2<f32>, sample_rate: f32) -> Result<()>;
}

/// Peak detection over filtered frames x channels traces.
pub trait PeakDetector {
    /// Detect peaks; `positions` holds one (x, y) position in micrometers
    /// per trace channel, in channel order.
    ///
    /// Returned peaks are ordered by ascending sample index.
    fn detect(
        &self,
        traces: ArrayView2<'_, f32>,
        positions: &[[f32; 2]],
        sample_rate: f32,
    ) -> Result<Vec<Peak>>;
}
