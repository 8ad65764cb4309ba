//! Tetrode group assignment.

use crate::error::{Error, Result};
use crate::grouping::QualityTable;

/// Group label of a single physical channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelGroup {
    /// Channel belongs to the given tetrode (0-based index).
    Assigned(u8),
    /// Channel is excluded: its wire is flagged bad in the quality table.
    Excluded,
}

/// Combine the hardware wiring map with the quality table into per-channel
/// group labels.
///
/// Wire positions within a tetrode follow ascending physical channel order.
/// Any wire whose quality flag is zero is relabelled [`ChannelGroup::Excluded`]
/// regardless of its wiring assignment; every channel ends up with exactly
/// one label.
pub fn assign_groups(wiring_map: &[u8], table: &QualityTable) -> Result<Vec<ChannelGroup>> {
    let num_tetrodes = wiring_map
        .iter()
        .max()
        .map_or(0, |&max| usize::from(max) + 1);

    if table.num_rows() < num_tetrodes {
        return Err(Error::QualityTableRows {
            path: table.path().to_path_buf(),
            rows: table.num_rows(),
            required: num_tetrodes,
        });
    }

    let mut groups: Vec<ChannelGroup> = wiring_map
        .iter()
        .map(|&tet| ChannelGroup::Assigned(tet))
        .collect();

    for tetrode in 0..num_tetrodes {
        let wires = wiring_map
            .iter()
            .enumerate()
            .filter(|&(_, &tet)| usize::from(tet) == tetrode)
            .map(|(channel, _)| channel);

        for (wire, channel) in wires.enumerate() {
            if !table.wire_ok(tetrode, wire) {
                groups[channel] = ChannelGroup::Excluded;
            }
        }
    }

    Ok(groups)
}

/// Physical channel indices labelled with the given tetrode, in ascending
/// order.
pub fn channels_for_tetrode(groups: &[ChannelGroup], tetrode: u8) -> Vec<usize> {
    groups
        .iter()
        .enumerate()
        .filter(|&(_, &group)| group == ChannelGroup::Assigned(tetrode))
        .map(|(channel, _)| channel)
        .collect()
}
