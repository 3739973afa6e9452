use serde::{Deserialize, Serialize};

use crate::geometry::primitives::Point;
use crate::{PackError, PackResult};

/// Height over width of rectangular reserves when no aspect is given.
pub const RESERVE_RECT_ASPECT: f64 = 0.6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// Position of the corner in an envelope of `width` x `height` pixels.
    pub fn point(&self, width: f64, height: f64) -> Point {
        match self {
            Corner::TopLeft => Point(0.0, 0.0),
            Corner::TopRight => Point(width, 0.0),
            Corner::BottomLeft => Point(0.0, height),
            Corner::BottomRight => Point(width, height),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ReserveShape {
    /// Extent is the diameter
    Circle,
    /// Extent is the side
    Square,
    /// Extent is the width, the height is `width * aspect`
    Rectangle { aspect: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReserveAnchor {
    Center,
    Corner(Corner),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ReserveSize {
    Pixels(u32),
    /// Percentage (0, 100] of the envelope width, resolved once per envelope
    Percentage(f64),
}

/// An area of the envelope that no tile may intersect (titles, logos, labels, ...).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReserveZone {
    pub shape: ReserveShape,
    pub anchor: ReserveAnchor,
    pub size: ReserveSize,
}

impl ReserveZone {
    pub fn new(shape: ReserveShape, anchor: ReserveAnchor, size: ReserveSize) -> Self {
        ReserveZone {
            shape,
            anchor,
            size,
        }
    }

    /// Resolves the zone's principal extent (diameter, side or width) for an envelope of `envelope_width` pixels.
    pub fn extent(&self, envelope_width: u32) -> f64 {
        match self.size {
            ReserveSize::Pixels(px) => px as f64,
            ReserveSize::Percentage(pct) => envelope_width as f64 * pct / 100.0,
        }
    }

    /// Width and height of the zone's bounding box for an envelope of `envelope_width` pixels.
    pub fn dimensions(&self, envelope_width: u32) -> (f64, f64) {
        let extent = self.extent(envelope_width);
        match self.shape {
            ReserveShape::Circle | ReserveShape::Square => (extent, extent),
            ReserveShape::Rectangle { aspect } => (extent, extent * aspect),
        }
    }

    /// Checks everything about the zone that does not depend on the envelope.
    pub fn validate(&self) -> PackResult<()> {
        match self.size {
            ReserveSize::Pixels(0) => {
                return Err(PackError::InvalidReserveConfiguration(
                    "pixel size of a reserve must be positive".into(),
                ));
            }
            ReserveSize::Percentage(pct) if !(pct.is_finite() && pct > 0.0 && pct <= 100.0) => {
                return Err(PackError::InvalidReserveConfiguration(format!(
                    "reserve percentage must lie in (0, 100], got {pct}"
                )));
            }
            _ => {}
        }
        if let ReserveShape::Rectangle { aspect } = self.shape {
            if !(aspect.is_finite() && aspect > 0.0) {
                return Err(PackError::InvalidReserveConfiguration(format!(
                    "aspect of a rectangular reserve must be positive, got {aspect}"
                )));
            }
        }
        Ok(())
    }
}
