use std::fmt;

use embedded_graphics::{prelude::Point, primitives::Rectangle};

/// An axis-aligned rectangle with integer coordinates.
///
/// Rectangles may lie partially or fully outside of a [`Frame`][super::Frame];
/// drawing clips them to the visible area.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    rect: Rectangle,
}

impl Rect {
    /// Creates a rectangle from the position of its top left corner and its
    /// dimensions.
    #[inline]
    pub fn from_top_left(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            rect: Rectangle {
                top_left: Point { x, y },
                size: embedded_graphics::geometry::Size { width, height },
            },
        }
    }

    /// Creates a rectangle from two opposing corner points (both inclusive).
    pub fn from_corners(top_left: (i32, i32), bottom_right: (i32, i32)) -> Self {
        let (x_min, x_max) = (
            top_left.0.min(bottom_right.0),
            top_left.0.max(bottom_right.0),
        );
        let (y_min, y_max) = (
            top_left.1.min(bottom_right.1),
            top_left.1.max(bottom_right.1),
        );
        Self::from_top_left(
            x_min,
            y_min,
            (x_max - x_min + 1) as u32,
            (y_max - y_min + 1) as u32,
        )
    }

    /// Computes the smallest rectangle containing every point in `points`.
    ///
    /// Returns [`None`] if `points` is empty.
    pub fn bounding<I: IntoIterator<Item = (i32, i32)>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let (mut x_min, mut y_min) = iter.next()?;
        let (mut x_max, mut y_max) = (x_min, y_min);
        for (x, y) in iter {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        Some(Self::from_corners((x_min, y_min), (x_max, y_max)))
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.rect.top_left.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.rect.top_left.y
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.rect.size.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.rect.size.height
    }

    /// X coordinate of the rightmost column covered by this rectangle.
    #[inline]
    pub fn max_x(&self) -> i32 {
        self.x() + self.width() as i32 - 1
    }

    /// Y coordinate of the bottommost row covered by this rectangle.
    #[inline]
    pub fn max_y(&self) -> i32 {
        self.y() + self.height() as i32 - 1
    }

    /// Grows this rectangle by moving each side outwards by the given amounts.
    #[must_use]
    pub fn grow_sides(&self, left: i32, right: i32, top: i32, bottom: i32) -> Self {
        Self::from_corners(
            (self.x() - left, self.y() - top),
            (self.max_x() + right, self.max_y() + bottom),
        )
    }

    pub(crate) fn to_rectangle(self) -> Rectangle {
        self.rect
    }
}

impl fmt::Debug for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect @ ({},{}), size {}x{}",
            self.x(),
            self.y(),
            self.width(),
            self.height()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_corners_normalizes_order() {
        let rect = Rect::from_corners((5, 7), (1, 2));
        assert_eq!((rect.x(), rect.y()), (1, 2));
        assert_eq!((rect.max_x(), rect.max_y()), (5, 7));
    }

    #[test]
    fn bounding_covers_all_points() {
        let rect = Rect::bounding([(0, 0), (4, -2), (-1, 3)]).unwrap();
        assert_eq!((rect.x(), rect.y()), (-1, -2));
        assert_eq!((rect.max_x(), rect.max_y()), (4, 3));
        assert_eq!(Rect::bounding([]), None);
    }

    #[test]
    fn grow_sides_moves_edges_outwards() {
        let rect = Rect::from_top_left(10, 10, 5, 5).grow_sides(1, 2, 3, 4);
        assert_eq!((rect.x(), rect.y()), (9, 7));
        assert_eq!((rect.width(), rect.height()), (8, 12));
    }
}
