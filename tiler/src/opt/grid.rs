use itertools::Itertools;
use log::{debug, trace};
use nanofiche::collision_detection::{ReserveSet, ShapeContainment};
use nanofiche::entities::{Bin, Envelope, GridLines};
use nanofiche::geometry::primitives::Rect;
use rayon::prelude::*;

use crate::opt::{LayoutPlan, Placement, PlacementMode, Placer};

/// Grids with at least this many rows evaluate row eligibility on the rayon pool
const PAR_ROW_THRESHOLD: u32 = 32;

/// Rows evaluated per parallel batch
const PAR_ROW_CHUNK: u32 = 64;

/// Places bins on a regular grid of `floor(W / a)` columns and `floor(H / b)` rows,
/// scanning row-major from the top-left cell and skipping cells that cross a reserve zone.
///
/// After the scan, the row holding the last tile can be shifted against the right
/// (and, for the last row, bottom) boundary of the envelope when that does not reduce
/// the number of eligible cells in it. Items the scan could not place are
/// then given any capacity the shift freed up.
#[derive(Clone, Copy, Debug)]
pub struct GridPlacer {
    pub bin: Bin,
    pub bottom_row_pass: bool,
    pub parallel_rows: bool,
}

impl GridPlacer {
    pub fn grid_lines(&self, envelope: &Envelope) -> GridLines {
        GridLines {
            cols: envelope.width / self.bin.width,
            rows: envelope.height / self.bin.height,
            cell_width: self.bin.width,
            cell_height: self.bin.height,
        }
    }

    /// Number of eligible cells per row, from the top.
    /// The scan stops after the first rows that hold `n_items`. In parallel, rows are
    /// evaluated `PAR_ROW_CHUNK` at a time and the surplus of the last chunk is dropped.
    fn row_counts(&self, cells: &RowCells, grid: &GridLines, n_items: usize) -> Vec<usize> {
        let b = self.bin.height;
        let chunk_size = match self.parallel_rows && grid.rows >= PAR_ROW_THRESHOLD {
            true => PAR_ROW_CHUNK,
            false => 1,
        };
        let mut counts = vec![];
        let mut total = 0;
        for start in (0..grid.rows).step_by(chunk_size as usize) {
            let end = u32::min(start + chunk_size, grid.rows);
            let chunk: Vec<usize> = match chunk_size {
                1 => vec![cells.count(start * b, 0)],
                _ => (start..end)
                    .into_par_iter()
                    .map(|r| cells.count(r * b, 0))
                    .collect(),
            };
            for count in chunk {
                counts.push(count);
                total += count;
                if total >= n_items {
                    return counts;
                }
            }
        }
        counts
    }

    /// Assigns items to rows in raster order, then applies the bottom-row pass.
    /// Returns the row layout and the number of items that could not be placed.
    fn distribute(
        &self,
        cells: &RowCells,
        grid: &GridLines,
        envelope: &Envelope,
        counts: &[usize],
        n_items: usize,
    ) -> (Vec<RowSpec>, usize) {
        let mut remaining = n_items;
        let mut rows = vec![];
        for (r, &available) in counts.iter().enumerate() {
            if remaining == 0 {
                break;
            }
            let take = usize::min(available, remaining);
            if take > 0 {
                rows.push(RowSpec {
                    y: r as u32 * self.bin.height,
                    dx: 0,
                    take,
                    available,
                    trailing: false,
                });
                remaining -= take;
            }
        }
        if self.bottom_row_pass {
            remaining = self.shift_last_row(cells, grid, envelope, &mut rows, remaining);
        }
        (rows, remaining)
    }

    fn shift_last_row(
        &self,
        cells: &RowCells,
        grid: &GridLines,
        envelope: &Envelope,
        rows: &mut [RowSpec],
        remaining: usize,
    ) -> usize {
        let Some(last) = rows.last_mut() else {
            return remaining;
        };
        if last.take >= grid.cols as usize {
            //row is completely filled
            return remaining;
        }
        let row_idx = last.y / self.bin.height;
        let dx = envelope.width - grid.cols * self.bin.width;
        let dy = match row_idx + 1 == grid.rows {
            true => envelope.height - grid.rows * self.bin.height,
            false => 0,
        };
        if dx == 0 && dy == 0 {
            return remaining;
        }

        let shifted_available = cells.count(last.y + dy, dx);
        if shifted_available < last.available {
            return remaining;
        }
        let take = usize::min(shifted_available, last.take + remaining);
        let recovered = take - last.take;
        debug!(
            "[GRID] shifted row {row_idx} by ({dx}, {dy}), {} -> {} eligible cells, {recovered} item(s) recovered",
            last.available, shifted_available
        );
        *last = RowSpec {
            y: last.y + dy,
            dx,
            take,
            available: shifted_available,
            trailing: true,
        };
        remaining - recovered
    }
}

impl Placer for GridPlacer {
    fn place(
        &self,
        envelope: &Envelope,
        reserves: &ReserveSet,
        n_items: usize,
        mode: PlacementMode,
    ) -> Placement {
        let grid = self.grid_lines(envelope);
        let cells = RowCells {
            containment: ShapeContainment::new(envelope),
            reserves: reserves.clone(),
            bin: self.bin,
            cols: grid.cols,
        };

        let counts = self.row_counts(&cells, &grid, n_items);
        let (rows, unplaced) = self.distribute(&cells, &grid, envelope, &counts, n_items);
        let placed = n_items - unplaced;

        trace!(
            "[GRID] {}x{} envelope, {}x{} grid: {placed}/{n_items} placed",
            envelope.width, envelope.height, grid.cols, grid.rows
        );

        let plan = match mode {
            PlacementMode::CapacityCheck => None,
            PlacementMode::Full => Some(LayoutPlan::Grid(GridPlan {
                cells,
                grid,
                rows,
                placed,
            })),
        };
        Placement { placed, plan }
    }
}

/// A row of the layout: `take` tiles on the eligible cells of the row at height `y`,
/// with the columns offset by `dx` pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RowSpec {
    y: u32,
    dx: u32,
    take: usize,
    available: usize,
    /// Use the last `take` eligible cells instead of the first ones
    trailing: bool,
}

/// Eligibility of the cells of a grid row.
#[derive(Clone, Debug)]
struct RowCells {
    containment: ShapeContainment,
    reserves: ReserveSet,
    bin: Bin,
    cols: u32,
}

impl RowCells {
    /// x-coordinates of the eligible cells of the row at height `y`, columns offset by `dx`.
    fn eligible(&self, y: u32, dx: u32) -> impl Iterator<Item = u32> + '_ {
        let Bin { width, height } = self.bin;
        (0..self.cols)
            .map(move |c| c * width + dx)
            .filter(move |&x| {
                let rect = Rect::from_origin(x as i64, y as i64, width, height);
                self.containment.tile_fits(&rect) && !self.reserves.intersects_any(&rect)
            })
    }

    fn count(&self, y: u32, dx: u32) -> usize {
        self.eligible(y, dx).count()
    }
}

/// Row layout of a grid envelope. Tile positions are regenerated row by row on every iteration.
#[derive(Clone, Debug)]
pub struct GridPlan {
    cells: RowCells,
    grid: GridLines,
    rows: Vec<RowSpec>,
    placed: usize,
}

impl GridPlan {
    pub fn positions(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.rows.iter().flat_map(move |spec| {
            let xs = self.cells.eligible(spec.y, spec.dx).collect_vec();
            let skip = match spec.trailing {
                true => xs.len().saturating_sub(spec.take),
                false => 0,
            };
            let y = spec.y;
            xs.into_iter().skip(skip).take(spec.take).map(move |x| (x, y))
        })
    }

    pub fn placed(&self) -> usize {
        self.placed
    }

    pub fn grid(&self) -> GridLines {
        self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nanofiche::entities::{EnvelopeShape, ReserveAnchor, ReserveShape, ReserveSize, ReserveZone};

    fn cells_for(placer: &GridPlacer, envelope: &Envelope, zones: &[ReserveZone]) -> (RowCells, GridLines) {
        let grid = placer.grid_lines(envelope);
        let cells = RowCells {
            containment: ShapeContainment::new(envelope),
            reserves: ReserveSet::resolve(zones, envelope).unwrap(),
            bin: placer.bin,
            cols: grid.cols,
        };
        (cells, grid)
    }

    #[test]
    fn parallel_row_scan_stops_once_the_items_fit() {
        let placer = GridPlacer {
            bin: Bin::try_new(10, 10).unwrap(),
            bottom_row_pass: true,
            parallel_rows: true,
        };
        let envelope = Envelope::try_new(EnvelopeShape::Square, 1000, 1000).unwrap();
        let (cells, grid) = cells_for(&placer, &envelope, &[]);
        assert_eq!(grid.rows, 100);

        assert_eq!(placer.row_counts(&cells, &grid, 250), vec![100, 100, 100]);
        assert_eq!(placer.row_counts(&cells, &grid, 100), vec![100]);
        //not enough room, every row is counted
        assert_eq!(placer.row_counts(&cells, &grid, 20_000).len(), 100);
    }

    #[test]
    fn parallel_and_sequential_row_counts_agree() {
        let bin = Bin::try_new(10, 10).unwrap();
        let parallel = GridPlacer {
            bin,
            bottom_row_pass: true,
            parallel_rows: true,
        };
        let sequential = GridPlacer {
            parallel_rows: false,
            ..parallel
        };
        let envelope = Envelope::try_new(EnvelopeShape::Rectangle, 1005, 703).unwrap();
        let zones = [ReserveZone::new(
            ReserveShape::Circle,
            ReserveAnchor::Center,
            ReserveSize::Percentage(30.0),
        )];
        let (cells, grid) = cells_for(&parallel, &envelope, &zones);

        for n_items in [1, 99, 1_000, 3_333, 5_000, 7_000, 100_000] {
            let counts = parallel.row_counts(&cells, &grid, n_items);
            assert_eq!(counts, sequential.row_counts(&cells, &grid, n_items), "{n_items} items");
            //a scan cut short ends on the row holding the last item
            if counts.len() < grid.rows as usize {
                let total: usize = counts.iter().sum();
                assert!(total >= n_items);
                assert!(total - counts[counts.len() - 1] < n_items);
            }
        }
    }
}
