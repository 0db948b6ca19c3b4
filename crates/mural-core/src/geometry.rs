//! Geometric primitives for the viewport and rendered surfaces.
//!
//! - [`Point`] - A 2D coordinate, either in container pixels or in content units
//! - [`Size`] - Width and height dimensions
//!
//! # Coordinate System
//!
//! Mural uses the same convention as SVG and the pointer events it consumes:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Container coordinates are pixels relative to the top-left corner of the
//! visible container. Content coordinates are units of the rendered surface
//! before the viewport transform is applied.

/// A 2D point.
///
/// # Examples
///
/// ```
/// # use mural_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let delta = p1.sub_point(p2);
/// assert_eq!(delta.x(), 5.0);
/// assert_eq!(delta.y(), 15.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Multiplies both coordinates by the given factor.
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

/// Width and height of a surface or container.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns the center point of a box of this size anchored at the origin.
    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Multiplies both dimensions by the given factor
    pub fn scale(self, factor: f32) -> Self {
        Self {
            width: self.width * factor,
            height: self.height * factor,
        }
    }

    /// Returns true if both dimensions are finite and strictly positive.
    ///
    /// Viewport math divides by surface dimensions, so a size that is not
    /// usable is treated as "not yet measured".
    pub fn is_usable(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_arithmetic() {
        let p = Point::new(3.0, 4.0);
        let q = Point::new(1.0, -2.0);

        assert_eq!(p.add_point(q), Point::new(4.0, 2.0));
        assert_eq!(p.sub_point(q), Point::new(2.0, 6.0));
        assert_eq!(p.scale(2.0), Point::new(6.0, 8.0));
    }

    #[test]
    fn test_size_center_and_scale() {
        let size = Size::new(400.0, 300.0);

        assert_eq!(size.center(), Point::new(200.0, 150.0));
        assert_eq!(size.scale(0.5), Size::new(200.0, 150.0));
    }

    #[test]
    fn test_size_is_usable() {
        assert!(Size::new(1.0, 1.0).is_usable());
        assert!(!Size::default().is_usable());
        assert!(!Size::new(10.0, 0.0).is_usable());
        assert!(!Size::new(-5.0, 10.0).is_usable());
        assert!(!Size::new(f32::NAN, 10.0).is_usable());
        assert!(!Size::new(f32::INFINITY, 10.0).is_usable());
    }
}
