use std::ops::AddAssign;

use crate::pixel::{Coord, PixelPositionT};

/// Axis-aligned, inclusive pixel bounding box.
///
/// The default box is invalid (`left > right`); adding points or boxes widens
/// it, so a union over any sequence of positions can start from `default()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelBoundingBoxT<T: Coord> {
    left: T,
    top: T,
    right: T,
    bottom: T,
}

/// Bounding box with unsigned 32 bit coordinates.
pub type PixelBoundingBox = PixelBoundingBoxT<u32>;
/// Bounding box with signed 32 bit coordinates.
pub type PixelBoundingBoxI = PixelBoundingBoxT<i32>;

impl<T: Coord> PixelBoundingBoxT<T> {
    #[inline]
    #[must_use]
    pub fn new(left: T, top: T, right: T, bottom: T) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Smallest box containing a single point.
    #[inline]
    #[must_use]
    pub fn from_point(point: PixelPositionT<T>) -> Self {
        debug_assert!(point.is_valid());
        Self {
            left: point.x(),
            top: point.y(),
            right: point.x(),
            bottom: point.y(),
        }
    }

    /// Smallest box containing all given points; invalid for an empty slice.
    #[must_use]
    pub fn from_points(points: &[PixelPositionT<T>]) -> Self {
        let mut bounding_box = Self::default();
        for point in points {
            bounding_box += *point;
        }
        bounding_box
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.right >= self.left && self.bottom >= self.top
    }

    #[inline]
    #[must_use]
    pub fn left(&self) -> T {
        self.left
    }

    #[inline]
    #[must_use]
    pub fn top(&self) -> T {
        self.top
    }

    #[inline]
    #[must_use]
    pub fn right(&self) -> T {
        self.right
    }

    #[inline]
    #[must_use]
    pub fn bottom(&self) -> T {
        self.bottom
    }

    /// Width in pixels, zero for an invalid box.
    #[inline]
    #[must_use]
    pub fn width(&self) -> T {
        if self.is_valid() {
            self.right - self.left + T::one()
        } else {
            T::zero()
        }
    }

    /// Height in pixels, zero for an invalid box.
    #[inline]
    #[must_use]
    pub fn height(&self) -> T {
        if self.is_valid() {
            self.bottom - self.top + T::one()
        } else {
            T::zero()
        }
    }

    /// Number of covered pixels.
    #[inline]
    #[must_use]
    pub fn size(&self) -> u64 {
        self.width().to_u64().unwrap_or(0) * self.height().to_u64().unwrap_or(0)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, point: &PixelPositionT<T>) -> bool {
        self.is_valid()
            && point.x() >= self.left
            && point.x() <= self.right
            && point.y() >= self.top
            && point.y() <= self.bottom
    }

    #[inline]
    #[must_use]
    pub fn contains_box(&self, other: &Self) -> bool {
        self.is_valid()
            && other.is_valid()
            && other.left >= self.left
            && other.right <= self.right
            && other.top >= self.top
            && other.bottom <= self.bottom
    }

    /// Whether the two boxes share at least one pixel.
    #[inline]
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.is_valid()
            && other.is_valid()
            && self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }

    /// Whether the two boxes intersect or lie side by side.
    ///
    /// With `neighborhood8` diagonal contact counts as touching as well.
    #[must_use]
    pub fn touches(&self, other: &Self, neighborhood8: bool) -> bool {
        if !self.is_valid() || !other.is_valid() {
            return false;
        }

        let horizontal_gap =
            self.left > other.right.wrapping_add(&T::one()) || other.left > self.right.wrapping_add(&T::one());
        let vertical_gap =
            self.top > other.bottom.wrapping_add(&T::one()) || other.top > self.bottom.wrapping_add(&T::one());

        if horizontal_gap || vertical_gap {
            return false;
        }

        if neighborhood8 {
            return true;
        }

        // 4-neighborhood: corner-only contact does not count.
        let horizontal_contact = self.left <= other.right && other.left <= self.right;
        let vertical_contact = self.top <= other.bottom && other.top <= self.bottom;
        horizontal_contact || vertical_contact
    }
}

impl PixelBoundingBoxT<u32> {
    /// Box grown by `pixels` on every side, clamped to the frame
    /// `[0, width) x [0, height)`.
    #[must_use]
    pub fn extended(&self, pixels: u32, width: u32, height: u32) -> Self {
        debug_assert!(width != 0 && height != 0);

        if !self.is_valid() {
            return *self;
        }

        Self {
            left: self.left.saturating_sub(pixels),
            top: self.top.saturating_sub(pixels),
            right: self.right.saturating_add(pixels).min(width - 1),
            bottom: self.bottom.saturating_add(pixels).min(height - 1),
        }
    }
}

impl PixelBoundingBoxT<i32> {
    /// Box grown by `pixels` on every side, saturating at the numeric range.
    #[must_use]
    pub fn extended(&self, pixels: i32) -> Self {
        debug_assert!(pixels >= 0);

        if !self.is_valid() {
            return *self;
        }

        Self {
            left: self.left.saturating_sub(pixels),
            top: self.top.saturating_sub(pixels),
            right: self.right.saturating_add(pixels),
            bottom: self.bottom.saturating_add(pixels),
        }
    }
}

impl<T: Coord> Default for PixelBoundingBoxT<T> {
    /// The invalid, empty box: unioning points into it starts a fresh box.
    #[inline]
    fn default() -> Self {
        Self {
            left: T::max_value(),
            top: T::max_value(),
            right: T::min_value(),
            bottom: T::min_value(),
        }
    }
}

impl<T: Coord> AddAssign<PixelPositionT<T>> for PixelBoundingBoxT<T> {
    #[inline]
    fn add_assign(&mut self, point: PixelPositionT<T>) {
        debug_assert!(point.is_valid());
        self.left = self.left.min(point.x());
        self.top = self.top.min(point.y());
        self.right = self.right.max(point.x());
        self.bottom = self.bottom.max(point.y());
    }
}

impl<T: Coord> AddAssign<PixelBoundingBoxT<T>> for PixelBoundingBoxT<T> {
    #[inline]
    fn add_assign(&mut self, other: PixelBoundingBoxT<T>) {
        if other.is_valid() {
            self.left = self.left.min(other.left);
            self.top = self.top.min(other.top);
            self.right = self.right.max(other.right);
            self.bottom = self.bottom.max(other.bottom);
        }
    }
}
