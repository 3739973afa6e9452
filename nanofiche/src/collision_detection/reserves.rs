use itertools::Itertools;
use log::trace;

use crate::entities::{Corner, Envelope, ReserveAnchor, ReserveShape, ReserveZone};
use crate::geometry::geo_traits::{CollidesWith, Overlaps, Shape};
use crate::geometry::primitives::{Circle, Point, Rect};
use crate::{PackError, PackResult};

/// Maximum number of reserve zones in a single envelope.
pub const MAX_RESERVE_ZONES: usize = 2;

/// Geometry of a resolved reserve zone, in envelope pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZoneOutline {
    Rect(Rect),
    Circle(Circle),
}

impl ZoneOutline {
    pub fn bbox(&self) -> Rect {
        match self {
            ZoneOutline::Rect(r) => *r,
            ZoneOutline::Circle(c) => c.bbox(),
        }
    }

    /// True if both outlines share an area (touching outlines do not overlap).
    pub fn overlaps(&self, other: &ZoneOutline) -> bool {
        match (self, other) {
            (ZoneOutline::Rect(a), ZoneOutline::Rect(b)) => a.overlaps(b),
            (ZoneOutline::Circle(a), ZoneOutline::Circle(b)) => a.overlaps(b),
            (ZoneOutline::Circle(c), ZoneOutline::Rect(r))
            | (ZoneOutline::Rect(r), ZoneOutline::Circle(c)) => c.overlaps(r),
        }
    }
}

/// A [`ReserveZone`] resolved against a concrete envelope.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReserveHazard {
    pub zone: ReserveZone,
    pub outline: ZoneOutline,
}

impl ReserveHazard {
    /// Resolves the zone's size and position. Percentage sizes are taken from the envelope width.
    pub fn resolve(zone: &ReserveZone, envelope: &Envelope) -> Self {
        let (w, h) = zone.dimensions(envelope.width);
        let (env_w, env_h) = (envelope.width as f64, envelope.height as f64);

        //top-left corner of the zone's bounding box
        let (x_min, y_min) = match zone.anchor {
            ReserveAnchor::Center => {
                let Point(cx, cy) = envelope.center();
                (cx - w / 2.0, cy - h / 2.0)
            }
            ReserveAnchor::Corner(Corner::TopLeft) => (0.0, 0.0),
            ReserveAnchor::Corner(Corner::TopRight) => (env_w - w, 0.0),
            ReserveAnchor::Corner(Corner::BottomLeft) => (0.0, env_h - h),
            ReserveAnchor::Corner(Corner::BottomRight) => (env_w - w, env_h - h),
        };
        let bbox = Rect {
            x_min,
            y_min,
            x_max: x_min + w,
            y_max: y_min + h,
        };

        let outline = match zone.shape {
            ReserveShape::Square | ReserveShape::Rectangle { .. } => ZoneOutline::Rect(bbox),
            ReserveShape::Circle => ZoneOutline::Circle(Circle {
                center: bbox.centroid(),
                radius: w / 2.0,
            }),
        };

        ReserveHazard {
            zone: *zone,
            outline,
        }
    }

    /// Whether a tile at `tile` would intersect the zone.
    ///
    /// Rectangular zones use a strict overlap test, tiles touching the zone's edge are allowed.
    /// Circular zones exclude a tile as soon as its nearest point lies within the radius:
    /// a corner inside the circle, or an edge the circle reaches or touches.
    #[inline(always)]
    pub fn intersects(&self, tile: &Rect) -> bool {
        match &self.outline {
            ZoneOutline::Rect(r) => r.overlaps(tile),
            ZoneOutline::Circle(c) => c.collides_with(tile),
        }
    }
}

/// The reserve zones of an envelope, resolved and validated.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ReserveSet {
    hazards: Vec<ReserveHazard>,
}

impl ReserveSet {
    pub fn empty() -> Self {
        ReserveSet { hazards: vec![] }
    }

    /// Checks the parts of the reserve configuration which do not depend on the envelope's size.
    pub fn validate_config(zones: &[ReserveZone]) -> PackResult<()> {
        if zones.len() > MAX_RESERVE_ZONES {
            return Err(PackError::InvalidReserveConfiguration(format!(
                "at most {MAX_RESERVE_ZONES} reserve zones are supported, got {}",
                zones.len()
            )));
        }
        for zone in zones {
            zone.validate()?;
        }
        let duplicate_corner = zones
            .iter()
            .filter_map(|z| match z.anchor {
                ReserveAnchor::Corner(c) => Some(c),
                ReserveAnchor::Center => None,
            })
            .duplicates()
            .next();
        if let Some(corner) = duplicate_corner {
            return Err(PackError::InvalidReserveConfiguration(format!(
                "multiple reserve zones anchored at the {corner:?} corner"
            )));
        }
        if zones
            .iter()
            .filter(|z| z.anchor == ReserveAnchor::Center)
            .count()
            > 1
        {
            return Err(PackError::InvalidReserveConfiguration(
                "multiple reserve zones anchored at the center".into(),
            ));
        }
        Ok(())
    }

    /// Resolves all zones against `envelope`.
    /// Fails if a zone does not fit inside the envelope or if two zones overlap.
    pub fn resolve(zones: &[ReserveZone], envelope: &Envelope) -> PackResult<Self> {
        ReserveSet::validate_config(zones)?;

        let env_bbox = envelope.bbox();
        let hazards = zones
            .iter()
            .map(|z| ReserveHazard::resolve(z, envelope))
            .collect_vec();

        for h in &hazards {
            if !env_bbox.contains_rect(&h.outline.bbox()) {
                return Err(PackError::InvalidReserveConfiguration(format!(
                    "{:?} reserve ({:?}) exceeds the {}x{} envelope",
                    h.zone.shape,
                    h.outline.bbox(),
                    envelope.width,
                    envelope.height
                )));
            }
        }
        for (a, b) in hazards.iter().tuple_combinations() {
            if a.outline.overlaps(&b.outline) {
                return Err(PackError::InvalidReserveConfiguration(format!(
                    "reserve zones {:?} and {:?} overlap",
                    a.zone.anchor, b.zone.anchor
                )));
            }
        }
        trace!(
            "[RESERVE] resolved {} zone(s) for {}x{} envelope",
            hazards.len(),
            envelope.width,
            envelope.height
        );

        Ok(ReserveSet { hazards })
    }

    #[inline(always)]
    pub fn intersects_any(&self, tile: &Rect) -> bool {
        self.hazards.iter().any(|h| h.intersects(tile))
    }

    /// A corner is free if no zone is anchored at it and no zone covers its point.
    pub fn corner_is_free(&self, corner: Corner, envelope: &Envelope) -> bool {
        let point = corner.point(envelope.width as f64, envelope.height as f64);
        self.hazards.iter().all(|h| {
            let anchored = h.zone.anchor == ReserveAnchor::Corner(corner);
            let covers = match &h.outline {
                ZoneOutline::Rect(r) => r.collides_with(&point),
                ZoneOutline::Circle(c) => c.collides_with(&point),
            };
            !anchored && !covers
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReserveHazard> {
        self.hazards.iter()
    }

    pub fn len(&self) -> usize {
        self.hazards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hazards.is_empty()
    }
}
