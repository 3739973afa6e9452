use crate::entities::{Bin, EnvelopeConfig, Item, ReserveZone};

/// Immutable description of a packing run: what to pack, and into what.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub bin: Bin,
    /// Items sorted by sequence index
    pub items: Vec<Item>,
    pub envelope: EnvelopeConfig,
    /// Zero, one or two reserve zones
    pub reserves: Vec<ReserveZone>,
}

impl Instance {
    pub fn new(
        bin: Bin,
        items: Vec<Item>,
        envelope: EnvelopeConfig,
        reserves: Vec<ReserveZone>,
    ) -> Self {
        Instance {
            bin,
            items,
            envelope,
            reserves,
        }
    }

    pub fn n_items(&self) -> usize {
        self.items.len()
    }
}
