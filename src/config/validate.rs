//! Configuration validation.

use crate::config::Config;
use crate::constants::WIRES_PER_TETRODE;
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_paths(config)?;
    validate_wiring_map(config)?;
    validate_selection(config)?;
    validate_detection(config)?;
    validate_filter(config)?;
    Ok(())
}

fn validate_paths(config: &Config) -> Result<()> {
    for (field, path) in [
        ("input_dir", &config.input_dir),
        ("output_dir", &config.output_dir),
        ("probe_dir", &config.probe_dir),
        ("channel_quality_path", &config.channel_quality_path),
    ] {
        if path.as_os_str().is_empty() {
            return Err(Error::ConfigValidation {
                message: format!("{field} must be set"),
            });
        }
    }
    Ok(())
}

fn validate_wiring_map(config: &Config) -> Result<()> {
    if config.wiring_map.is_empty() {
        return Err(Error::ConfigValidation {
            message: "wiring_map must not be empty".to_string(),
        });
    }

    let num_tetrodes = config.num_tetrodes();
    for tet in 0..num_tetrodes {
        let wires = config
            .wiring_map
            .iter()
            .filter(|&&t| usize::from(t) == tet)
            .count();
        if wires > WIRES_PER_TETRODE {
            return Err(Error::ConfigValidation {
                message: format!(
                    "wiring_map assigns {wires} wires to tetrode {tet}, at most {WIRES_PER_TETRODE} allowed"
                ),
            });
        }
    }
    Ok(())
}

fn validate_selection(config: &Config) -> Result<()> {
    if config.tetrode_selection.is_empty() {
        return Err(Error::ConfigValidation {
            message: "tetrode_selection must list at least one tetrode".to_string(),
        });
    }

    let num_tetrodes = config.num_tetrodes();
    for &tet in &config.tetrode_selection {
        // Tetrode numbers are 1-based as labelled on the drive.
        if tet == 0 || usize::from(tet) > num_tetrodes {
            return Err(Error::ConfigValidation {
                message: format!(
                    "tetrode_selection entry {tet} out of range 1..={num_tetrodes}"
                ),
            });
        }
    }
    Ok(())
}

fn validate_detection(config: &Config) -> Result<()> {
    let detection = &config.detection;

    if detection.threshold <= 0.0 {
        return Err(Error::ConfigValidation {
            message: format!(
                "detection.threshold must be positive, got {}",
                detection.threshold
            ),
        });
    }

    if detection.exclude_sweep_ms < 0.0 {
        return Err(Error::ConfigValidation {
            message: format!(
                "detection.exclude_sweep_ms must be non-negative, got {}",
                detection.exclude_sweep_ms
            ),
        });
    }

    if detection.radius_um < 0.0 {
        return Err(Error::ConfigValidation {
            message: format!(
                "detection.radius_um must be non-negative, got {}",
                detection.radius_um
            ),
        });
    }

    Ok(())
}

fn validate_filter(config: &Config) -> Result<()> {
    let filter = &config.filter;

    if filter.freq_min_hz <= 0.0 || filter.freq_max_hz <= 0.0 {
        return Err(Error::ConfigValidation {
            message: format!(
                "filter cutoffs must be positive, got {} and {}",
                filter.freq_min_hz, filter.freq_max_hz
            ),
        });
    }

    if filter.freq_min_hz >= filter.freq_max_hz {
        return Err(Error::ConfigValidation {
            message: format!(
                "filter.freq_min_hz ({}) must be below filter.freq_max_hz ({})",
                filter.freq_min_hz, filter.freq_max_hz
            ),
        });
    }

    Ok(())
}
