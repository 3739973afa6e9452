use crate::collision_detection::ReserveSet;
use crate::entities::{Bin, Envelope, Tile};

/// Outcome of a successful packing run. Immutable: a new run produces a new result.
#[derive(Clone, Debug, PartialEq)]
pub struct PackingResult {
    envelope: Envelope,
    bin: Bin,
    tiles: Vec<Tile>,
    unplaced: usize,
    reserves: ReserveSet,
    grid: Option<GridLines>,
}

impl PackingResult {
    pub fn new(
        envelope: Envelope,
        bin: Bin,
        tiles: Vec<Tile>,
        unplaced: usize,
        reserves: ReserveSet,
        grid: Option<GridLines>,
    ) -> Self {
        PackingResult {
            envelope,
            bin,
            tiles,
            unplaced,
            reserves,
            grid,
        }
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn bin(&self) -> Bin {
        self.bin
    }

    /// Placed tiles, in sequence-index order
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn unplaced(&self) -> usize {
        self.unplaced
    }

    /// Reserve zones, resolved for the final envelope
    pub fn reserves(&self) -> &ReserveSet {
        &self.reserves
    }

    /// Grid geometry of square and rectangular envelopes
    pub fn grid(&self) -> Option<&GridLines> {
        self.grid.as_ref()
    }

    /// (placed items × bin area) / envelope area
    pub fn efficiency(&self) -> f64 {
        let used = self.tiles.len() as f64 * self.bin.area() as f64;
        used / self.envelope.area()
    }
}

/// Column and row layout of a grid envelope, for drawing cell boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridLines {
    pub cols: u32,
    pub rows: u32,
    pub cell_width: u32,
    pub cell_height: u32,
}

impl GridLines {
    /// x-coordinates of the vertical cell boundaries, left to right
    pub fn col_boundaries(&self) -> impl Iterator<Item = u32> + '_ {
        (0..=self.cols).map(|c| c * self.cell_width)
    }

    /// y-coordinates of the horizontal cell boundaries, top to bottom
    pub fn row_boundaries(&self) -> impl Iterator<Item = u32> + '_ {
        (0..=self.rows).map(|r| r * self.cell_height)
    }
}
