//! Probe geometry description files.
//!
//! Tetrode layouts ship as `.prb` files, a Python-literal convention shared
//! by several spike sorters: a `channel_groups` dict with a `channels` list
//! and a `geometry` dict of per-channel (x, y) positions in micrometers.
//! Only the first channel group is read; tetrode probes carry exactly one.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Channel layout parsed from a `.prb` file.
#[derive(Debug, Clone)]
pub struct ProbeLayout {
    path: PathBuf,
    channels: Vec<usize>,
    positions: HashMap<usize, [f32; 2]>,
}

impl ProbeLayout {
    /// Load and parse a probe file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ProbeRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(path, &contents)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self> {
        let parse_err = |message: &str| Error::ProbeParse {
            path: path.to_path_buf(),
            message: message.to_string(),
        };

        // Strip comments; the rest of the grammar is whitespace-insensitive.
        let text: String = contents
            .lines()
            .map(|line| line.split('#').next().unwrap_or(""))
            .collect::<Vec<_>>()
            .join("\n");

        let channels_body = keyed_block(&text, "channels", '[', ']')
            .ok_or_else(|| parse_err("missing 'channels' list"))?;
        let mut channels = Vec::new();
        for item in channels_body.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            channels.push(
                item.parse::<usize>()
                    .map_err(|_| parse_err("non-integer channel id in 'channels'"))?,
            );
        }
        if channels.is_empty() {
            return Err(parse_err("'channels' list is empty"));
        }

        let geometry_body = keyed_block(&text, "geometry", '{', '}')
            .ok_or_else(|| parse_err("missing 'geometry' dict"))?;
        let positions = parse_geometry(geometry_body)
            .map_err(|message| parse_err(&message))?;

        for &channel in &channels {
            if !positions.contains_key(&channel) {
                return Err(parse_err(&format!(
                    "geometry is missing channel {channel}"
                )));
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            channels,
            positions,
        })
    }

    /// Number of channels in the layout.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Path the layout was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Positions in renamed channel order (position `i` belongs to the
    /// channel listed at index `i` of the `channels` list).
    pub fn positions(&self) -> Vec<[f32; 2]> {
        self.channels
            .iter()
            .map(|channel| self.positions[channel])
            .collect()
    }
}

/// Find `'<key>' : <open>...<close>` and return the bracketed body.
fn keyed_block<'a>(text: &'a str, key: &str, open: char, close: char) -> Option<&'a str> {
    let quoted_single = format!("'{key}'");
    let quoted_double = format!("\"{key}\"");
    let key_at = text
        .find(&quoted_single)
        .or_else(|| text.find(&quoted_double))?;
    let after_key = &text[key_at..];
    let colon = after_key.find(':')?;
    let after_colon = &after_key[colon + 1..];

    let start = after_colon.find(open)?;
    let region = &after_colon[start..];
    let mut depth = 0usize;
    for (index, character) in region.char_indices() {
        if character == open {
            depth += 1;
        } else if character == close {
            depth -= 1;
            if depth == 0 {
                return Some(&region[open.len_utf8()..index]);
            }
        }
    }
    None
}

/// Parse `key: (x, y)` entries out of a geometry dict body.
fn parse_geometry(body: &str) -> std::result::Result<HashMap<usize, [f32; 2]>, String> {
    let mut positions = HashMap::new();
    let mut rest = body.trim();

    while !rest.is_empty() {
        // Entry key.
        let colon = rest
            .find(':')
            .ok_or_else(|| "geometry entry without ':'".to_string())?;
        let key = rest[..colon]
            .trim()
            .trim_matches(',')
            .trim()
            .parse::<usize>()
            .map_err(|_| "non-integer geometry key".to_string())?;
        rest = rest[colon + 1..].trim_start();

        // Coordinate pair, tuple or list syntax.
        let close = match rest.chars().next() {
            Some('(') => ')',
            Some('[') => ']',
            _ => return Err(format!("geometry entry {key} lacks a coordinate pair")),
        };
        let end = rest
            .find(close)
            .ok_or_else(|| format!("unterminated coordinates for channel {key}"))?;
        let pair = &rest[1..end];
        let mut coords = pair.split(',').map(str::trim).filter(|s| !s.is_empty());
        let x = coords
            .next()
            .and_then(|s| s.parse::<f32>().ok())
            .ok_or_else(|| format!("bad x coordinate for channel {key}"))?;
        let y = coords
            .next()
            .and_then(|s| s.parse::<f32>().ok())
            .ok_or_else(|| format!("bad y coordinate for channel {key}"))?;

        positions.insert(key, [x, y]);
        rest = rest[end + 1..].trim_start().trim_start_matches(',').trim_start();
    }

    Ok(positions)
}
