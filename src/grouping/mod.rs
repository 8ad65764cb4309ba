//! Channel grouping: wiring map plus quality table.

mod assign;
mod quality;

pub use assign::{ChannelGroup, assign_groups, channels_for_tetrode};
pub use quality::QualityTable;
