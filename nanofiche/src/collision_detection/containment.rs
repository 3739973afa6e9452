use crate::entities::{Envelope, EnvelopeOutline, Tile};
use crate::geometry::geo_traits::CollidesWith;
use crate::geometry::primitives::{Point, Rect};

/// Decides whether points and tiles lie inside an envelope.
///
/// Squares and rectangles use a bounding-box test.
/// Circles and ellipses require all four corners of a tile to satisfy `(x/rx)² + (y/ry)² ≤ 1`,
/// which never accepts a tile that crosses the outline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeContainment {
    bbox: Rect,
    outline: EnvelopeOutline,
}

impl ShapeContainment {
    pub fn new(envelope: &Envelope) -> Self {
        ShapeContainment {
            bbox: envelope.bbox(),
            outline: envelope.outline(),
        }
    }

    #[inline(always)]
    pub fn contains(&self, point: &Point) -> bool {
        match &self.outline {
            EnvelopeOutline::Rect(r) => r.collides_with(point),
            EnvelopeOutline::Ellipse(e) => e.collides_with(point),
        }
    }

    #[inline(always)]
    pub fn tile_fits(&self, tile: &Rect) -> bool {
        if !self.bbox.contains_rect(tile) {
            return false;
        }
        match &self.outline {
            EnvelopeOutline::Rect(_) => true,
            EnvelopeOutline::Ellipse(e) => e.encloses(tile),
        }
    }
}

pub fn contains(envelope: &Envelope, point: &Point) -> bool {
    ShapeContainment::new(envelope).contains(point)
}

pub fn tile_fits(envelope: &Envelope, tile: &Tile) -> bool {
    ShapeContainment::new(envelope).tile_fits(&tile.rect())
}
