//! How much of a donor row's queue moves to an under-supplied row.

use serde::{Deserialize, Serialize};

/// Split policy applied when the table steals work from the maximal row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionPolicy {
    /// Move half of the donor's queue, rounding up so a single item still moves.
    #[default]
    Half,
    /// Move just enough that both rows end up within one item of each other.
    Equalize,
}

impl PartitionPolicy {
    /// Number of items to move from a donor holding `donor` items to a
    /// recipient holding `recipient` items.
    pub fn split_count(self, donor: usize, recipient: usize) -> usize {
        match self {
            PartitionPolicy::Half => donor.div_ceil(2),
            PartitionPolicy::Equalize => donor.saturating_sub(recipient).div_ceil(2),
        }
    }
}
