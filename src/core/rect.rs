//! Axis-Aligned Rectangles
//!
//! Boxes are stored by their top-left corner and size, y grows downward.

use serde::{Serialize, Deserialize};

use super::vec2::Vec2;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width (>= 0)
    pub width: f64,
    /// Height (>= 0)
    pub height: f64,
}

impl Aabb {
    /// Create from top-left corner and size.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Create from a center point and a size.
    #[inline]
    pub fn from_center(center: Vec2, width: f64, height: f64) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    /// Left edge.
    #[inline]
    pub fn left(&self) -> f64 {
        self.x
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Top edge.
    #[inline]
    pub fn top(&self) -> f64 {
        self.y
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Strict overlap test. Touching edges do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Horizontal spans overlap (strict).
    #[inline]
    pub fn overlaps_horizontally(&self, other: &Aabb) -> bool {
        self.left() < other.right() && other.left() < self.right()
    }

    /// Point lies inside or on the boundary.
    #[inline]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    /// `other` lies strictly inside this box (no shared edges).
    pub fn strictly_contains(&self, other: &Aabb) -> bool {
        other.left() > self.left()
            && other.right() < self.right()
            && other.top() > self.top()
            && other.bottom() < self.bottom()
    }

    /// Same box moved by `offset`.
    #[inline]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    /// Distance from the box center to `point`.
    #[inline]
    pub fn center_distance(&self, point: Vec2) -> f64 {
        self.center().distance(point)
    }

    /// Box has a positive area and finite coordinates.
    pub fn is_valid(&self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_is_strict() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let touching = Aabb::new(10.0, 0.0, 10.0, 10.0);
        let inside = Aabb::new(5.0, 5.0, 10.0, 10.0);

        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&inside));
        assert!(inside.overlaps(&a));
    }

    #[test]
    fn test_from_center() {
        let r = Aabb::from_center(Vec2::new(50.0, 50.0), 20.0, 40.0);
        assert_eq!(r.left(), 40.0);
        assert_eq!(r.top(), 30.0);
        assert_eq!(r.bottom(), 70.0);
        assert_eq!(r.center(), Vec2::new(50.0, 50.0));
    }

    #[test]
    fn test_strict_containment() {
        let outer = Aabb::new(-100.0, -100.0, 300.0, 300.0);
        let inner = Aabb::new(0.0, 0.0, 100.0, 20.0);
        let flush = Aabb::new(-100.0, 0.0, 10.0, 10.0);

        assert!(outer.strictly_contains(&inner));
        assert!(!outer.strictly_contains(&flush));
    }

    #[test]
    fn test_validity() {
        assert!(Aabb::new(0.0, 0.0, 1.0, 1.0).is_valid());
        assert!(!Aabb::new(0.0, 0.0, 0.0, 1.0).is_valid());
        assert!(!Aabb::new(f64::NAN, 0.0, 1.0, 1.0).is_valid());
    }
}
