use std::f64::consts::PI;

use crate::geometry::geo_traits::{CollidesWith, Shape};
use crate::geometry::primitives::{Point, Rect};

/// Axis-aligned ellipse, described by its center and its two semi-axes.
/// A circle is an ellipse with `rx == ry`.
#[derive(Clone, Debug, PartialEq, Copy)]
pub struct Ellipse {
    pub center: Point,
    pub rx: f64,
    pub ry: f64,
}

impl Ellipse {
    /// Squared normalized radius of `point`: `(dx/rx)² + (dy/ry)²`.
    /// Points with a value ≤ 1 lie inside the ellipse.
    #[inline(always)]
    pub fn normalized_sq_radius(&self, point: &Point) -> f64 {
        let dx = (point.0 - self.center.0) / self.rx;
        let dy = (point.1 - self.center.1) / self.ry;
        dx * dx + dy * dy
    }

    /// True if `rect` lies entirely inside the ellipse.
    /// The ellipse is convex, so checking the four corners suffices.
    pub fn encloses(&self, rect: &Rect) -> bool {
        rect.corners().iter().all(|c| self.collides_with(c))
    }
}

impl CollidesWith<Point> for Ellipse {
    #[inline(always)]
    fn collides_with(&self, point: &Point) -> bool {
        self.normalized_sq_radius(point) <= 1.0
    }
}

impl Shape for Ellipse {
    fn centroid(&self) -> Point {
        self.center
    }

    fn area(&self) -> f64 {
        PI * self.rx * self.ry
    }

    fn bbox(&self) -> Rect {
        Rect {
            x_min: self.center.0 - self.rx,
            y_min: self.center.1 - self.ry,
            x_max: self.center.0 + self.rx,
            y_max: self.center.1 + self.ry,
        }
    }
}
