use std::f64::consts::PI;

use crate::geometry::geo_traits::{CollidesWith, Overlaps, Shape};
use crate::geometry::primitives::{Point, Rect};

/// Geometric primitive representing a circle
#[derive(Clone, Debug, PartialEq, Copy)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
}

impl Overlaps<Circle> for Circle {
    fn overlaps(&self, other: &Circle) -> bool {
        let sq_d = self.center.sq_distance_to(&other.center);
        sq_d < (self.radius + other.radius).powi(2)
    }
}

impl CollidesWith<Rect> for Circle {
    #[inline(always)]
    fn collides_with(&self, rect: &Rect) -> bool {
        //Based on: https://yal.cc/rectangle-circle-intersection-test/
        let Point(c_x, c_y) = self.center;

        let nearest_x = f64::max(rect.x_min, f64::min(c_x, rect.x_max));
        let nearest_y = f64::max(rect.y_min, f64::min(c_y, rect.y_max));

        (nearest_x - c_x).powi(2) + (nearest_y - c_y).powi(2) <= self.radius.powi(2)
    }
}

impl Overlaps<Rect> for Circle {
    #[inline(always)]
    fn overlaps(&self, rect: &Rect) -> bool {
        let Point(c_x, c_y) = self.center;

        let nearest_x = f64::max(rect.x_min, f64::min(c_x, rect.x_max));
        let nearest_y = f64::max(rect.y_min, f64::min(c_y, rect.y_max));

        (nearest_x - c_x).powi(2) + (nearest_y - c_y).powi(2) < self.radius.powi(2)
    }
}

impl CollidesWith<Point> for Circle {
    fn collides_with(&self, point: &Point) -> bool {
        point.sq_distance_to(&self.center) <= self.radius.powi(2)
    }
}

impl Shape for Circle {
    fn centroid(&self) -> Point {
        self.center
    }

    fn area(&self) -> f64 {
        self.radius * self.radius * PI
    }

    fn bbox(&self) -> Rect {
        let (r, x, y) = (self.radius, self.center.0, self.center.1);
        Rect {
            x_min: x - r,
            y_min: y - r,
            x_max: x + r,
            y_max: y + r,
        }
    }
}
