//! Consistency checks on packing results, meant for `debug_assert!` and tests.

use itertools::Itertools;
use log::error;

use crate::collision_detection::{ReserveSet, ShapeContainment};
use crate::entities::{Bin, Envelope, PackingResult, Tile};
use crate::geometry::geo_traits::Overlaps;
use crate::util::FPA;

/// No two tiles share an area.
pub fn tiles_are_disjoint(tiles: &[Tile]) -> bool {
    //sweep over tiles sorted by their left edge
    let sorted = tiles.iter().sorted_by_key(|t| (t.x, t.y)).collect_vec();
    for (i, a) in sorted.iter().enumerate() {
        let a_rect = a.rect();
        for b in sorted[i + 1..].iter() {
            if b.x >= a.x + a.width {
                break;
            }
            if a_rect.overlaps(&b.rect()) {
                error!("tiles #{} and #{} overlap", a.seq, b.seq);
                return false;
            }
        }
    }
    true
}

/// Every tile lies inside the envelope.
pub fn tiles_are_contained(tiles: &[Tile], envelope: &Envelope) -> bool {
    let containment = ShapeContainment::new(envelope);
    match tiles.iter().find(|t| !containment.tile_fits(&t.rect())) {
        Some(t) => {
            error!("tile #{} at ({}, {}) exceeds the envelope", t.seq, t.x, t.y);
            false
        }
        None => true,
    }
}

/// No tile intersects a reserve zone.
pub fn tiles_avoid_reserves(tiles: &[Tile], reserves: &ReserveSet) -> bool {
    match tiles.iter().find(|t| reserves.intersects_any(&t.rect())) {
        Some(t) => {
            error!("tile #{} at ({}, {}) intersects a reserve", t.seq, t.x, t.y);
            false
        }
        None => true,
    }
}

/// Sequence indices are strictly increasing.
pub fn tiles_are_ordered(tiles: &[Tile]) -> bool {
    tiles.iter().tuple_windows().all(|(a, b)| a.seq < b.seq)
}

/// Tiles appear in raster order: top to bottom, left to right within a row.
pub fn tiles_in_raster_order(tiles: &[Tile]) -> bool {
    tiles
        .iter()
        .tuple_windows()
        .all(|(a, b)| (b.y >= a.y + a.height) || (b.y == a.y && b.x >= a.x + a.width))
}

/// Every tile has the dimensions of the bin.
pub fn tiles_match_bin(tiles: &[Tile], bin: Bin) -> bool {
    tiles
        .iter()
        .all(|t| t.width == bin.width && t.height == bin.height)
}

pub fn result_is_consistent(result: &PackingResult) -> bool {
    let tiles = result.tiles();
    let expected_efficiency =
        tiles.len() as f64 * result.bin().area() as f64 / result.envelope().area();

    tiles_match_bin(tiles, result.bin())
        && tiles_are_ordered(tiles)
        && tiles_are_contained(tiles, result.envelope())
        && tiles_avoid_reserves(tiles, result.reserves())
        && tiles_are_disjoint(tiles)
        && FPA(result.efficiency()) == FPA(expected_efficiency)
}
