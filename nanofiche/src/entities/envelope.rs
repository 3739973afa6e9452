use serde::{Deserialize, Serialize};

use crate::geometry::geo_traits::Shape;
use crate::geometry::primitives::{Ellipse, Point, Rect};
use crate::{PackError, PackResult};

/// Outer shape of the fiche.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeShape {
    Square,
    Rectangle,
    Circle,
    Ellipse,
}

impl EnvelopeShape {
    /// Square and rectangular envelopes are filled with a regular grid,
    /// circular and elliptical ones with an outward spiral.
    pub fn is_grid(&self) -> bool {
        matches!(self, EnvelopeShape::Square | EnvelopeShape::Rectangle)
    }

    /// Whether the height of the envelope follows from a caller supplied aspect ratio.
    pub fn has_free_ratio(&self) -> bool {
        matches!(self, EnvelopeShape::Rectangle | EnvelopeShape::Ellipse)
    }
}

/// A concrete envelope: shape and pixel dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Envelope {
    pub shape: EnvelopeShape,
    pub width: u32,
    pub height: u32,
}

impl Envelope {
    pub fn try_new(shape: EnvelopeShape, width: u32, height: u32) -> PackResult<Self> {
        if width == 0 || height == 0 {
            return Err(PackError::InvalidEnvelope(format!(
                "dimensions must be positive, got {width}x{height}"
            )));
        }
        if !shape.has_free_ratio() && width != height {
            return Err(PackError::InvalidEnvelope(format!(
                "{shape:?} envelope requires equal width and height, got {width}x{height}"
            )));
        }
        Ok(Envelope {
            shape,
            width,
            height,
        })
    }

    /// Derives the envelope from its scalar size (width, or diameter for circles).
    /// The height is `size` for squares and circles, `floor(size / ratio)` otherwise.
    pub fn from_size(shape: EnvelopeShape, size: u32, ratio: f64) -> PackResult<Self> {
        let height = match shape.has_free_ratio() {
            true => (size as f64 / ratio).floor() as u32,
            false => size,
        };
        Envelope::try_new(shape, size, height)
    }

    pub fn bbox(&self) -> Rect {
        Rect::from_origin(0, 0, self.width, self.height)
    }

    pub fn center(&self) -> Point {
        Point(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    pub fn outline(&self) -> EnvelopeOutline {
        match self.shape {
            EnvelopeShape::Square | EnvelopeShape::Rectangle => EnvelopeOutline::Rect(self.bbox()),
            EnvelopeShape::Circle | EnvelopeShape::Ellipse => EnvelopeOutline::Ellipse(Ellipse {
                center: self.center(),
                rx: self.width as f64 / 2.0,
                ry: self.height as f64 / 2.0,
            }),
        }
    }

    /// Area enclosed by the envelope's outline (π·rx·ry for circles and ellipses).
    pub fn area(&self) -> f64 {
        match self.outline() {
            EnvelopeOutline::Rect(r) => r.area(),
            EnvelopeOutline::Ellipse(e) => e.area(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EnvelopeOutline {
    Rect(Rect),
    Ellipse(Ellipse),
}

/// How the dimensions of the envelope are determined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sizing {
    /// Search for the smallest envelope that holds every item
    Optimal,
    /// Use the caller supplied dimensions
    Fixed { width: u32, height: u32 },
}

/// Shape configuration of a packing run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeConfig {
    pub shape: EnvelopeShape,
    /// Width over height. Ignored for squares and circles.
    pub ratio: f64,
    pub sizing: Sizing,
}

impl EnvelopeConfig {
    pub fn optimal(shape: EnvelopeShape, ratio: f64) -> Self {
        EnvelopeConfig {
            shape,
            ratio,
            sizing: Sizing::Optimal,
        }
    }

    pub fn fixed(shape: EnvelopeShape, width: u32, height: u32) -> Self {
        EnvelopeConfig {
            shape,
            ratio: width as f64 / height.max(1) as f64,
            sizing: Sizing::Fixed { width, height },
        }
    }

    /// The effective aspect ratio: 1 for squares and circles.
    pub fn effective_ratio(&self) -> f64 {
        match self.shape.has_free_ratio() {
            true => self.ratio,
            false => 1.0,
        }
    }

    pub fn validate(&self) -> PackResult<()> {
        let ratio = self.effective_ratio();
        if !(ratio.is_finite() && ratio > 0.0) {
            return Err(PackError::InvalidEnvelope(format!(
                "aspect ratio must be positive and finite, got {ratio}"
            )));
        }
        if let Sizing::Fixed { width, height } = self.sizing {
            Envelope::try_new(self.shape, width, height)?;
        }
        Ok(())
    }
}
