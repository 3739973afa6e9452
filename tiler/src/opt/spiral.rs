use std::f64::consts::{PI, TAU};

use itertools::Itertools;
use log::trace;
use nanofiche::collision_detection::{ReserveSet, ShapeContainment};
use nanofiche::entities::{Bin, Envelope};
use nanofiche::geometry::primitives::{Point, Rect};
use ordered_float::OrderedFloat;

use crate::opt::{LayoutPlan, Placement, PlacementMode, Placer};

/// Places bins outward from the center of circular and elliptical envelopes.
///
/// Candidates form a lattice of bin-sized cells, one of which is centered on the envelope's center.
/// They are visited ring by ring, a ring being `min(a, b)` pixels wide in the ellipse's
/// normalized distance. Inside a ring they are swept clockwise starting from the left.
#[derive(Clone, Copy, Debug)]
pub struct SpiralPlacer {
    pub bin: Bin,
}

impl SpiralPlacer {
    /// All lattice cells inside the envelope's bounding box, in no particular order.
    fn lattice(&self, envelope: &Envelope) -> impl Iterator<Item = (u32, u32)> {
        let (a, b) = (self.bin.width as i64, self.bin.height as i64);
        let (w, h) = (envelope.width as i64, envelope.height as i64);
        let Point(cx, cy) = envelope.center();

        //origin of the cell centered on the envelope's center, projected to the first cell inside the envelope
        let x_start = ((cx - a as f64 / 2.0).floor() as i64).rem_euclid(a);
        let y_start = ((cy - b as f64 / 2.0).floor() as i64).rem_euclid(b);

        let xs = (x_start..).step_by(a as usize).take_while(move |x| x + a <= w);
        let ys = (y_start..).step_by(b as usize).take_while(move |y| y + b <= h);
        ys.cartesian_product(xs.collect_vec())
            .map(|(y, x)| (x as u32, y as u32))
    }

    /// Spiral ordering key of the cell at (`x`, `y`): ring, angle, row, column.
    fn visit_key(&self, envelope: &Envelope, x: u32, y: u32) -> (u64, OrderedFloat<f64>, u32, u32) {
        let Point(cx, cy) = envelope.center();
        let (rx, ry) = (envelope.width as f64 / 2.0, envelope.height as f64 / 2.0);
        let dx = x as f64 + self.bin.width as f64 / 2.0 - cx;
        let dy = y as f64 + self.bin.height as f64 / 2.0 - cy;

        let distance = ((dx / rx).powi(2) + (dy / ry).powi(2)).sqrt() * f64::min(rx, ry);
        let ring = (distance / self.bin.min_dim() as f64).floor() as u64;
        //0 pointing left, increasing clockwise on screen (y grows downward)
        let angle = (dy.atan2(dx) + PI).rem_euclid(TAU);

        (ring, OrderedFloat(angle), y, x)
    }
}

impl Placer for SpiralPlacer {
    fn place(
        &self,
        envelope: &Envelope,
        reserves: &ReserveSet,
        n_items: usize,
        mode: PlacementMode,
    ) -> Placement {
        let containment = ShapeContainment::new(envelope);
        let (a, b) = (self.bin.width, self.bin.height);
        let is_eligible = |&(x, y): &(u32, u32)| {
            let rect = Rect::from_origin(x as i64, y as i64, a, b);
            containment.tile_fits(&rect) && !reserves.intersects_any(&rect)
        };

        match mode {
            PlacementMode::CapacityCheck => {
                //visiting order does not affect the capacity
                let placed = self.lattice(envelope).filter(is_eligible).take(n_items).count();
                trace!(
                    "[SPIRAL] {}x{} envelope: {placed}/{n_items} placed",
                    envelope.width, envelope.height
                );
                Placement { placed, plan: None }
            }
            PlacementMode::Full => {
                let positions = self
                    .lattice(envelope)
                    .filter(is_eligible)
                    .sorted_by_cached_key(|&(x, y)| self.visit_key(envelope, x, y))
                    .take(n_items)
                    .collect_vec();
                let placed = positions.len();
                trace!(
                    "[SPIRAL] {}x{} envelope: {placed}/{n_items} placed",
                    envelope.width, envelope.height
                );
                Placement {
                    placed,
                    plan: Some(LayoutPlan::Spiral(SpiralPlan { positions })),
                }
            }
        }
    }
}

/// Tile origins of a spiral layout, in visiting order.
#[derive(Clone, Debug)]
pub struct SpiralPlan {
    positions: Vec<(u32, u32)>,
}

impl SpiralPlan {
    pub fn positions(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.positions.iter().copied()
    }

    pub fn placed(&self) -> usize {
        self.positions.len()
    }
}
