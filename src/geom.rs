//! Geometric primitives for the integer sweep.

use crate::Error;

/// An axis-aligned rectangle with integer coordinates, inclusive on all four
/// sides.
///
/// Degenerate rectangles (zero width or zero height) are legal; they exercise
/// the same-coordinate grouping rules of the sweep rather than being rejected.
///
/// All construction paths go through [`Rect::new`], so every value satisfies
/// `x_min <= x_max` and `y_min <= y_max`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Rect {
    x_min: i64,
    x_max: i64,
    y_min: i64,
    y_max: i64,
}

impl std::fmt::Debug for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}] x [{}, {}]",
            self.x_min, self.x_max, self.y_min, self.y_max
        )
    }
}

impl Rect {
    /// Create a new rectangle, checking that neither pair of bounds is
    /// reversed.
    pub fn new(x_min: i64, x_max: i64, y_min: i64, y_max: i64) -> Result<Self, Error> {
        if x_min > x_max {
            return Err(Error::InvalidRect {
                bounds: (x_min, x_max),
                axis: "x",
            });
        }
        if y_min > y_max {
            return Err(Error::InvalidRect {
                bounds: (y_min, y_max),
                axis: "y",
            });
        }
        Ok(Rect {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }

    /// Smallest horizontal coordinate.
    pub fn x_min(&self) -> i64 {
        self.x_min
    }

    /// Largest horizontal coordinate.
    pub fn x_max(&self) -> i64 {
        self.x_max
    }

    /// Smallest vertical coordinate.
    pub fn y_min(&self) -> i64 {
        self.y_min
    }

    /// Largest vertical coordinate.
    pub fn y_max(&self) -> i64 {
        self.y_max
    }

    /// Horizontal extent, `x_max - x_min`.
    pub fn width(&self) -> i64 {
        self.x_max - self.x_min
    }

    /// Vertical extent, `y_max - y_min`.
    pub fn height(&self) -> i64 {
        self.y_max - self.y_min
    }

    /// Do the closed extents of `self` and `other` have a common point?
    ///
    /// Unlike [`Rect::overlaps`], sharing a single boundary coordinate is
    /// enough.
    pub fn touches(&self, other: &Rect) -> bool {
        self.x_min <= other.x_max
            && other.x_min <= self.x_max
            && self.y_min <= other.y_max
            && other.y_min <= self.y_max
    }

    /// Do `self` and `other` overlap with genuine area?
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x_min < other.x_max
            && other.x_min < self.x_max
            && self.y_min < other.y_max
            && other.y_min < self.y_max
    }
}

#[cfg(feature = "arbitrary")]
impl<'a> arbitrary::Arbitrary<'a> for Rect {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let a: i64 = u.int_in_range(-1024..=1024)?;
        let b: i64 = u.int_in_range(-1024..=1024)?;
        let c: i64 = u.int_in_range(-1024..=1024)?;
        let d: i64 = u.int_in_range(-1024..=1024)?;
        Ok(Rect {
            x_min: a.min(b),
            x_max: a.max(b),
            y_min: c.min(d),
            y_max: c.max(d),
        })
    }
}
