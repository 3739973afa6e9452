use itertools::Itertools;
use log::{debug, info};
use nanofiche::collision_detection::ReserveSet;
use nanofiche::entities::{
    Bin, Corner, Envelope, GridLines, Instance, Item, PackingResult, Sizing, Tile,
};
use nanofiche::util::assertions;
use nanofiche::{OversizedItem, PackError, PackResult};
use thousands::Separable;

use crate::config::{BatchConfig, TilerConfig};
use crate::opt::size_search::{EnvelopeSizeOptimizer, SearchReport};
use crate::opt::{LayoutPlan, PlacementMode, Placer, ShapePlacer};

/// Entry point of a packing run: validates the items, sizes the envelope and lays out the tiles.
///
/// The orchestrator has no side effects besides logging. It holds no state between runs,
/// packing the same instance twice yields the same result.
pub struct PackingOrchestrator {
    config: TilerConfig,
    cancellation_checker: Option<Box<dyn Fn() -> bool + Send + Sync>>,
}

impl PackingOrchestrator {
    pub fn new(config: TilerConfig) -> Self {
        Self {
            config,
            cancellation_checker: None,
        }
    }

    /// Lets the envelope size search stop early with the best size found so far once `checker` returns true.
    pub fn with_cancellation_checker(
        mut self,
        checker: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Self {
        self.cancellation_checker = Some(Box::new(checker));
        self
    }

    pub fn config(&self) -> &TilerConfig {
        &self.config
    }

    /// Rejects instances whose items cannot be packed: oversized items (all of them are reported),
    /// empty items, or sequence indices which are not strictly increasing.
    pub fn validate_items(instance: &Instance) -> PackResult<()> {
        let bin = instance.bin;
        if instance.items.is_empty() {
            return Err(PackError::InvalidItems("no items to pack".into()));
        }

        let oversized = instance
            .items
            .iter()
            .filter(|i| !bin.admits(i.width, i.height))
            .map(|i| OversizedItem {
                seq: i.seq,
                source: i.source.clone(),
                width: i.width,
                height: i.height,
            })
            .collect_vec();
        if !oversized.is_empty() {
            return Err(PackError::OversizedItems(oversized));
        }

        if let Some(item) = instance.items.iter().find(|i| i.width == 0 || i.height == 0) {
            return Err(PackError::InvalidItems(format!(
                "item #{} ({}) has no pixels: {}x{}",
                item.seq, item.source, item.width, item.height
            )));
        }

        if let Some((a, b)) = instance
            .items
            .iter()
            .tuple_windows()
            .find(|(a, b)| a.seq >= b.seq)
        {
            return Err(PackError::InvalidItems(format!(
                "sequence indices must be strictly increasing, #{} is followed by #{}",
                a.seq, b.seq
            )));
        }
        Ok(())
    }

    /// Sizes the envelope and computes the layout, without materializing the tiles.
    pub fn plan<'a>(&self, instance: &'a Instance) -> PackResult<PackingPlan<'a>> {
        let bin = Bin::try_new(instance.bin.width, instance.bin.height)?;
        Self::validate_items(instance)?;
        instance.envelope.validate()?;

        let n_items = instance.n_items();
        let shape = instance.envelope.shape;
        let placer = ShapePlacer::for_shape(shape, bin, &self.config);

        let (envelope, reserves, search) = match instance.envelope.sizing {
            Sizing::Optimal => {
                let outcome = EnvelopeSizeOptimizer::new(
                    &placer,
                    shape,
                    instance.envelope.effective_ratio(),
                    bin,
                    &instance.reserves,
                    self.config.search,
                )
                .with_cancellation_checker(self.cancellation_checker.as_deref())
                .find_minimal_envelope(n_items)?;
                (outcome.envelope, outcome.reserves, Some(outcome.report))
            }
            Sizing::Fixed { width, height } => {
                let envelope = Envelope::try_new(shape, width, height)?;
                let reserves = ReserveSet::resolve(&instance.reserves, &envelope)?;
                (envelope, reserves, None)
            }
        };

        if !reserves.corner_is_free(Corner::TopLeft, &envelope) {
            debug!("[PACK] top-left corner is reserved, the first tile moves away from the origin");
        }

        let placement = placer.place(&envelope, &reserves, n_items, PlacementMode::Full);
        let layout = match placement.plan {
            Some(plan) if plan.placed() >= n_items => plan,
            _ => {
                return Err(PackError::InsufficientSpace {
                    shape,
                    width: envelope.width,
                    height: envelope.height,
                    placed: placement.placed,
                    required: n_items,
                });
            }
        };

        Ok(PackingPlan {
            items: &instance.items,
            bin,
            envelope,
            reserves,
            layout,
            search,
        })
    }

    pub fn pack(&self, instance: &Instance) -> PackResult<PackingResult> {
        let result = self.plan(instance)?.into_result();
        debug_assert!(assertions::result_is_consistent(&result));

        let envelope = result.envelope();
        info!(
            "[PACK] placed {} items in a {}x{} {:?} envelope, efficiency: {:.3}%",
            result.tiles().len().separate_with_commas(),
            envelope.width,
            envelope.height,
            envelope.shape,
            result.efficiency() * 100.0
        );
        Ok(result)
    }
}

/// A computed layout whose tiles are generated on demand.
pub struct PackingPlan<'a> {
    items: &'a [Item],
    bin: Bin,
    envelope: Envelope,
    reserves: ReserveSet,
    layout: LayoutPlan,
    search: Option<SearchReport>,
}

impl<'a> PackingPlan<'a> {
    /// Tiles in sequence order. Every call starts over from the first tile.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        let bin = self.bin;
        self.items
            .iter()
            .zip(self.layout.positions())
            .map(move |(item, (x, y))| Tile::new(item.seq, x, y, bin))
    }

    /// The tiles in consecutive chunks of `batch_size` (the last one may be smaller).
    pub fn batches(&self, batch_size: usize) -> TileBatches<impl Iterator<Item = Tile> + '_> {
        TileBatches {
            tiles: self.tiles(),
            batch_size: batch_size.max(1),
        }
    }

    /// Size of the rendered fiche: items × bin area × bytes per pixel
    pub fn rendered_bytes(&self, bytes_per_pixel: u32) -> u64 {
        (self.items.len() as u64)
            .saturating_mul(self.bin.area())
            .saturating_mul(bytes_per_pixel as u64)
    }

    pub fn requires_batching(&self, config: &BatchConfig) -> bool {
        self.rendered_bytes(config.bytes_per_pixel) > config.memory_threshold_bytes
    }

    pub fn n_tiles(&self) -> usize {
        self.layout.placed()
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn reserves(&self) -> &ReserveSet {
        &self.reserves
    }

    pub fn grid(&self) -> Option<GridLines> {
        self.layout.grid()
    }

    /// Statistics of the envelope size search, absent for fixed envelopes
    pub fn search_report(&self) -> Option<SearchReport> {
        self.search
    }

    pub fn into_result(self) -> PackingResult {
        let tiles = self.tiles().collect_vec();
        let grid = self.layout.grid();
        PackingResult::new(self.envelope, self.bin, tiles, 0, self.reserves, grid)
    }
}

/// Iterator over consecutive chunks of tiles.
pub struct TileBatches<I> {
    tiles: I,
    batch_size: usize,
}

impl<I: Iterator<Item = Tile>> Iterator for TileBatches<I> {
    type Item = Vec<Tile>;

    fn next(&mut self) -> Option<Vec<Tile>> {
        let batch = self.tiles.by_ref().take(self.batch_size).collect_vec();
        (!batch.is_empty()).then_some(batch)
    }
}
