//! Progress bar utilities for the extraction loops.

use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar for the outer per-tetrode loop.
pub fn create_tetrode_progress(total_tetrodes: usize, enabled: bool) -> Option<ProgressBar> {
    if !enabled || total_tetrodes == 0 {
        return None;
    }

    let bar = ProgressBar::new(total_tetrodes as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tetrodes ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░ "),
    );
    Some(bar)
}

/// Create a progress bar for the per-peak waveform collection loop.
pub fn create_waveform_progress(
    total_peaks: usize,
    tetrode: u8,
    enabled: bool,
) -> Option<ProgressBar> {
    if !enabled || total_peaks == 0 {
        return None;
    }

    let bar = ProgressBar::new(total_peaks as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "[{{elapsed_precise}}] {{bar:40.cyan/blue}} {{pos}}/{{len}} waveforms - tetrode {tetrode}"
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░ "),
    );
    Some(bar)
}

/// Finish a progress bar with a message.
pub fn finish_progress(bar: Option<ProgressBar>, message: &str) {
    if let Some(bar) = bar {
        bar.finish_with_message(message.to_string());
    }
}

/// Increment a progress bar.
pub fn inc_progress(bar: Option<&ProgressBar>) {
    if let Some(bar) = bar {
        bar.inc(1);
    }
}
