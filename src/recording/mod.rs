//! Recording access for Open Ephys legacy directories.

mod continuous;

pub use continuous::{ChannelFile, HEADER_BYTES, Header, channel_number};

use crate::error::{Error, Result};
use ndarray::Array2;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A multi-channel legacy recording, one `.continuous` file per channel.
///
/// Opening parses headers and sizes only; sample data is read on demand per
/// channel selection.
#[derive(Debug)]
pub struct Recording {
    dir: PathBuf,
    channels: Vec<ChannelFile>,
    sample_rate: f32,
    num_samples: usize,
}

impl Recording {
    /// Open a recording directory and index its neural channel files.
    ///
    /// Channels are ordered by the number in their file name, giving the
    /// physical channel indexing the wiring map refers to. AUX and ADC
    /// channels are ignored.
    pub fn open(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir).map_err(|e| Error::RecordingOpen {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut named: Vec<(u32, PathBuf)> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::RecordingOpen {
                path: dir.to_path_buf(),
                source: e,
            })?;
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(number) = channel_number(file_name) {
                named.push((number, path));
            }
        }

        if named.is_empty() {
            return Err(Error::NoContinuousFiles {
                path: dir.to_path_buf(),
            });
        }
        named.sort_by_key(|&(number, _)| number);

        let mut channels = Vec::with_capacity(named.len());
        for (number, path) in named {
            channels.push(ChannelFile::open(&path, number)?);
        }

        let sample_rate = channels[0].header.sample_rate;
        for channel in &channels[1..] {
            if (channel.header.sample_rate - sample_rate).abs() > f32::EPSILON {
                return Err(Error::SampleRateMismatch {
                    path: channel.path.clone(),
                    found: channel.header.sample_rate,
                    expected: sample_rate,
                });
            }
        }

        let num_samples = channels
            .iter()
            .map(|channel| channel.num_samples)
            .min()
            .unwrap_or(0);
        if channels
            .iter()
            .any(|channel| channel.num_samples != num_samples)
        {
            warn!(
                "channel files differ in length, truncating to {} samples",
                num_samples
            );
        }

        if let Some(bit_volts) = channels[0].header.bit_volts {
            debug!("recording scale: {} uV per ADC count", bit_volts);
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            channels,
            sample_rate,
            num_samples,
        })
    }

    /// Recording directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of neural channels.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Sampling rate in Hz, shared by all channels.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Samples per channel (shortest channel governs).
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Read raw traces for the selected channels as frames x channels.
    ///
    /// This is the channel-slice operation: the selected channels are
    /// renamed to the canonical 0-based sequence given by their position in
    /// `selection`, which is the indexing probe geometry files use.
    pub fn read_traces(&self, selection: &[usize]) -> Result<Array2<f32>> {
        let mut traces = Array2::zeros((self.num_samples, selection.len()));

        for (renamed, &channel) in selection.iter().enumerate() {
            let samples = self.channels[channel].read_samples()?;
            for (frame, &sample) in samples.iter().take(self.num_samples).enumerate() {
                traces[[frame, renamed]] = f32::from(sample);
            }
        }

        Ok(traces)
    }
}
