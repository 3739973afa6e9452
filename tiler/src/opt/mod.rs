use itertools::Either;
use nanofiche::collision_detection::ReserveSet;
use nanofiche::entities::{Bin, Envelope, EnvelopeShape, GridLines};

use crate::config::TilerConfig;
use crate::opt::grid::{GridPlacer, GridPlan};
use crate::opt::spiral::{SpiralPlacer, SpiralPlan};

pub mod grid;
pub mod orchestrator;
pub mod size_search;
pub mod spiral;

/// What a placer is asked to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementMode {
    /// Only count how many items fit, stopping as soon as all of them do
    CapacityCheck,
    /// Produce the layout of the items
    Full,
}

/// Outcome of a placer run.
#[derive(Clone, Debug)]
pub struct Placement {
    /// Number of items that could be placed
    pub placed: usize,
    /// Present in [`PlacementMode::Full`]
    pub plan: Option<LayoutPlan>,
}

impl Placement {
    pub fn fits(&self, n_items: usize) -> bool {
        self.placed >= n_items
    }
}

/// Strategy assigning tile positions to items inside an envelope.
pub trait Placer {
    fn place(
        &self,
        envelope: &Envelope,
        reserves: &ReserveSet,
        n_items: usize,
        mode: PlacementMode,
    ) -> Placement;
}

/// The positions of a layout, generated on demand.
#[derive(Clone, Debug)]
pub enum LayoutPlan {
    Grid(GridPlan),
    Spiral(SpiralPlan),
}

impl LayoutPlan {
    /// Tile origins in sequence order. Every call starts over from the first position.
    pub fn positions(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        match self {
            LayoutPlan::Grid(plan) => Either::Left(plan.positions()),
            LayoutPlan::Spiral(plan) => Either::Right(plan.positions()),
        }
    }

    pub fn placed(&self) -> usize {
        match self {
            LayoutPlan::Grid(plan) => plan.placed(),
            LayoutPlan::Spiral(plan) => plan.placed(),
        }
    }

    pub fn grid(&self) -> Option<GridLines> {
        match self {
            LayoutPlan::Grid(plan) => Some(plan.grid()),
            LayoutPlan::Spiral(_) => None,
        }
    }
}

/// Placer matching the shape of the envelope: grid for squares and rectangles, spiral for circles and ellipses.
#[derive(Clone, Copy, Debug)]
pub enum ShapePlacer {
    Grid(GridPlacer),
    Spiral(SpiralPlacer),
}

impl ShapePlacer {
    pub fn for_shape(shape: EnvelopeShape, bin: Bin, config: &TilerConfig) -> Self {
        match shape.is_grid() {
            true => ShapePlacer::Grid(GridPlacer {
                bin,
                bottom_row_pass: config.bottom_row_pass,
                parallel_rows: config.parallel_rows,
            }),
            false => ShapePlacer::Spiral(SpiralPlacer { bin }),
        }
    }
}

impl Placer for ShapePlacer {
    fn place(
        &self,
        envelope: &Envelope,
        reserves: &ReserveSet,
        n_items: usize,
        mode: PlacementMode,
    ) -> Placement {
        match self {
            ShapePlacer::Grid(p) => p.place(envelope, reserves, n_items, mode),
            ShapePlacer::Spiral(p) => p.place(envelope, reserves, n_items, mode),
        }
    }
}
