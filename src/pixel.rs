use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;

use geo::Coord as GeoCoord;
use num_traits::{NumCast, PrimInt, WrappingAdd, WrappingSub};

/// Integer coordinate type usable for pixel positions.
///
/// Unsigned types reserve their maximum value as the invalid sentinel,
/// signed types their minimum value.
pub trait Coord:
    PrimInt + WrappingAdd + WrappingSub + fmt::Debug + fmt::Display + Hash + Default + 'static
{
    fn invalid_value() -> Self;
}

impl Coord for u32 {
    #[inline]
    fn invalid_value() -> Self {
        u32::MAX
    }
}

impl Coord for u64 {
    #[inline]
    fn invalid_value() -> Self {
        u64::MAX
    }
}

impl Coord for i32 {
    #[inline]
    fn invalid_value() -> Self {
        i32::MIN
    }
}

impl Coord for i64 {
    #[inline]
    fn invalid_value() -> Self {
        i64::MIN
    }
}

/// Direction from a pixel to one of its eight neighbors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelDirection {
    North,
    NorthWest,
    West,
    SouthWest,
    South,
    SouthEast,
    East,
    NorthEast,
}

impl PixelDirection {
    /// Offset of one step in this direction, y pointing down.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            PixelDirection::North => (0, -1),
            PixelDirection::NorthWest => (-1, -1),
            PixelDirection::West => (-1, 0),
            PixelDirection::SouthWest => (-1, 1),
            PixelDirection::South => (0, 1),
            PixelDirection::SouthEast => (1, 1),
            PixelDirection::East => (1, 0),
            PixelDirection::NorthEast => (1, -1),
        }
    }

    #[inline]
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            PixelDirection::North => PixelDirection::South,
            PixelDirection::NorthWest => PixelDirection::SouthEast,
            PixelDirection::West => PixelDirection::East,
            PixelDirection::SouthWest => PixelDirection::NorthEast,
            PixelDirection::South => PixelDirection::North,
            PixelDirection::SouthEast => PixelDirection::NorthWest,
            PixelDirection::East => PixelDirection::West,
            PixelDirection::NorthEast => PixelDirection::SouthWest,
        }
    }
}

/// Coarse classification of the step between two 8-neighbors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoughPixelDirection {
    Vertical,
    Horizontal,
    Diagonal,
}

/// A 2D pixel coordinate with an invalid sentinel state.
///
/// Arithmetic wraps, so out-of-frame positions such as `(x, 0 - 1)` on an
/// unsigned coordinate type are representable and round-trip through
/// neighbor steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelPositionT<T: Coord> {
    x: T,
    y: T,
}

/// Pixel position with unsigned 32 bit coordinates.
pub type PixelPosition = PixelPositionT<u32>;
/// Pixel position with signed 32 bit coordinates.
pub type PixelPositionI = PixelPositionT<i32>;

pub type PixelPositions = Vec<PixelPosition>;

impl<T: Coord> PixelPositionT<T> {
    #[inline]
    #[must_use]
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    /// The invalid sentinel position.
    #[inline]
    #[must_use]
    pub fn invalid() -> Self {
        Self {
            x: T::invalid_value(),
            y: T::invalid_value(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.x != T::invalid_value() && self.y != T::invalid_value()
    }

    #[inline]
    #[must_use]
    pub fn x(&self) -> T {
        self.x
    }

    #[inline]
    #[must_use]
    pub fn y(&self) -> T {
        self.y
    }

    #[inline]
    pub fn set_x(&mut self, x: T) {
        self.x = x;
    }

    #[inline]
    pub fn set_y(&mut self, y: T) {
        self.y = y;
    }

    /// Whether `other` lies in the direct 4-neighborhood.
    #[inline]
    #[must_use]
    pub fn is_neighbor4(&self, other: &Self) -> bool {
        let dx = Self::abs_diff(self.x, other.x);
        let dy = Self::abs_diff(self.y, other.y);
        (dx.is_zero() && dy.is_one()) || (dy.is_zero() && dx.is_one())
    }

    /// Whether `other` lies in the direct 8-neighborhood.
    #[inline]
    #[must_use]
    pub fn is_neighbor8(&self, other: &Self) -> bool {
        let dx = Self::abs_diff(self.x, other.x);
        let dy = Self::abs_diff(self.y, other.y);
        dx <= T::one() && dy <= T::one() && !(dx.is_zero() && dy.is_zero())
    }

    /// Whether `other` lies in the 9-neighborhood (8-neighborhood plus self).
    #[inline]
    #[must_use]
    pub fn in_area9(&self, other: &Self) -> bool {
        Self::abs_diff(self.x, other.x) <= T::one() && Self::abs_diff(self.y, other.y) <= T::one()
    }

    /// Squared euclidean distance to another position.
    #[must_use]
    pub fn sqr_distance(&self, other: &Self) -> u64 {
        // unsigned widening keeps the squares in range for the full span of
        // valid 32 bit coordinates
        let dx = Self::wide_abs_diff(self.x, other.x);
        let dy = Self::wide_abs_diff(self.y, other.y);
        dx * dx + dy * dy
    }

    /// Neighbor one step in the given direction, wrapping at the numeric
    /// range boundaries.
    #[inline]
    #[must_use]
    pub fn neighbor(&self, direction: PixelDirection) -> Self {
        let (dx, dy) = direction.offset();
        Self {
            x: Self::wrapping_step(self.x, dx),
            y: Self::wrapping_step(self.y, dy),
        }
    }

    #[inline]
    #[must_use]
    pub fn north(&self) -> Self {
        self.neighbor(PixelDirection::North)
    }

    #[inline]
    #[must_use]
    pub fn north_west(&self) -> Self {
        self.neighbor(PixelDirection::NorthWest)
    }

    #[inline]
    #[must_use]
    pub fn west(&self) -> Self {
        self.neighbor(PixelDirection::West)
    }

    #[inline]
    #[must_use]
    pub fn south_west(&self) -> Self {
        self.neighbor(PixelDirection::SouthWest)
    }

    #[inline]
    #[must_use]
    pub fn south(&self) -> Self {
        self.neighbor(PixelDirection::South)
    }

    #[inline]
    #[must_use]
    pub fn south_east(&self) -> Self {
        self.neighbor(PixelDirection::SouthEast)
    }

    #[inline]
    #[must_use]
    pub fn east(&self) -> Self {
        self.neighbor(PixelDirection::East)
    }

    #[inline]
    #[must_use]
    pub fn north_east(&self) -> Self {
        self.neighbor(PixelDirection::NorthEast)
    }

    /// Direction of the step from this position to an 8-neighbor.
    #[must_use]
    pub fn direction(&self, to: &Self) -> PixelDirection {
        debug_assert!(self.is_neighbor8(to));

        let dx = Self::signed_diff(to.x, self.x);
        let dy = Self::signed_diff(to.y, self.y);

        match (dx, dy) {
            (0, -1) => PixelDirection::North,
            (-1, -1) => PixelDirection::NorthWest,
            (-1, 0) => PixelDirection::West,
            (-1, 1) => PixelDirection::SouthWest,
            (0, 1) => PixelDirection::South,
            (1, 1) => PixelDirection::SouthEast,
            (1, 0) => PixelDirection::East,
            _ => PixelDirection::NorthEast,
        }
    }

    /// Rough direction of the step from this position to an 8-neighbor.
    #[must_use]
    pub fn rough_direction(&self, to: &Self) -> RoughPixelDirection {
        debug_assert!(self.is_neighbor8(to));

        if self.x == to.x {
            RoughPixelDirection::Vertical
        } else if self.y == to.y {
            RoughPixelDirection::Horizontal
        } else {
            RoughPixelDirection::Diagonal
        }
    }

    /// Sub-pixel vector coordinate of this position.
    #[inline]
    #[must_use]
    pub fn to_vector(&self) -> GeoCoord<f64> {
        GeoCoord {
            x: self.x.to_f64().unwrap_or(f64::NAN),
            y: self.y.to_f64().unwrap_or(f64::NAN),
        }
    }

    /// Position at the rounded coordinate, or the invalid sentinel if the
    /// value does not fit the coordinate type.
    #[must_use]
    pub fn from_vector(coord: GeoCoord<f64>) -> Self {
        match (
            <T as NumCast>::from(coord.x.round()),
            <T as NumCast>::from(coord.y.round()),
        ) {
            (Some(x), Some(y)) => Self { x, y },
            _ => Self::invalid(),
        }
    }

    #[inline]
    fn wrapping_step(value: T, delta: i32) -> T {
        match delta {
            -1 => value.wrapping_sub(&T::one()),
            1 => value.wrapping_add(&T::one()),
            _ => value,
        }
    }

    #[inline]
    fn abs_diff(a: T, b: T) -> T {
        if a > b { a - b } else { b - a }
    }

    #[inline]
    fn signed_diff(a: T, b: T) -> i64 {
        a.to_i64()
            .unwrap_or(0)
            .wrapping_sub(b.to_i64().unwrap_or(0))
    }

    #[inline]
    fn wide_abs_diff(a: T, b: T) -> u64 {
        let a = a.to_i128().unwrap_or(0);
        let b = b.to_i128().unwrap_or(0);
        (a - b).unsigned_abs() as u64
    }
}

impl<T: Coord> Default for PixelPositionT<T> {
    #[inline]
    fn default() -> Self {
        Self::invalid()
    }
}

/// Row-major ordering: by y first, then by x.
impl<T: Coord> Ord for PixelPositionT<T> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.y.cmp(&other.y).then_with(|| self.x.cmp(&other.x))
    }
}

impl<T: Coord> PartialOrd for PixelPositionT<T> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Coord> fmt::Display for PixelPositionT<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl<T: Coord> std::ops::Add for PixelPositionT<T> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x.wrapping_add(&rhs.x),
            y: self.y.wrapping_add(&rhs.y),
        }
    }
}

impl<T: Coord> std::ops::Sub for PixelPositionT<T> {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x.wrapping_sub(&rhs.x),
            y: self.y.wrapping_sub(&rhs.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_sentinels() {
        assert!(!PixelPosition::invalid().is_valid());
        assert!(!PixelPositionI::invalid().is_valid());
        assert_eq!(PixelPosition::invalid().x(), u32::MAX);
        assert_eq!(PixelPositionI::invalid().x(), i32::MIN);
        assert!(PixelPosition::new(0, 0).is_valid());
        assert!(PixelPositionI::new(-5, 3).is_valid());
    }

    #[test]
    fn neighborhoods() {
        let center = PixelPosition::new(5, 5);

        assert!(center.is_neighbor4(&PixelPosition::new(5, 4)));
        assert!(center.is_neighbor4(&PixelPosition::new(4, 5)));
        assert!(!center.is_neighbor4(&PixelPosition::new(4, 4)));
        assert!(!center.is_neighbor4(&center));

        assert!(center.is_neighbor8(&PixelPosition::new(4, 4)));
        assert!(center.is_neighbor8(&PixelPosition::new(6, 6)));
        assert!(!center.is_neighbor8(&center));
        assert!(!center.is_neighbor8(&PixelPosition::new(7, 5)));

        assert!(center.in_area9(&center));
        assert!(center.in_area9(&PixelPosition::new(6, 4)));
        assert!(!center.in_area9(&PixelPosition::new(3, 5)));
    }

    #[test]
    fn directed_neighbors_wrap() {
        let origin = PixelPosition::new(0, 0);
        assert_eq!(origin.north(), PixelPosition::new(0, u32::MAX));
        assert_eq!(origin.north().south(), origin);
        assert_eq!(PixelPosition::new(3, 7).south_east(), PixelPosition::new(4, 8));
    }

    #[test]
    fn direction_classification() {
        let p = PixelPosition::new(4, 4);
        assert_eq!(p.direction(&p.north()), PixelDirection::North);
        assert_eq!(p.direction(&p.south_west()), PixelDirection::SouthWest);
        assert_eq!(p.direction(&p.east()), PixelDirection::East);

        assert_eq!(p.rough_direction(&p.north()), RoughPixelDirection::Vertical);
        assert_eq!(p.rough_direction(&p.west()), RoughPixelDirection::Horizontal);
        assert_eq!(p.rough_direction(&p.north_east()), RoughPixelDirection::Diagonal);
    }

    #[test]
    fn ordering_is_row_major() {
        let mut pixels = vec![
            PixelPosition::new(2, 1),
            PixelPosition::new(0, 2),
            PixelPosition::new(1, 1),
        ];
        pixels.sort();
        assert_eq!(
            pixels,
            vec![
                PixelPosition::new(1, 1),
                PixelPosition::new(2, 1),
                PixelPosition::new(0, 2),
            ]
        );
    }

    #[test]
    fn sqr_distance_and_vectors() {
        let a = PixelPosition::new(1, 2);
        let b = PixelPosition::new(4, 6);
        assert_eq!(a.sqr_distance(&b), 25);

        let v = b.to_vector();
        assert_eq!(PixelPosition::from_vector(v), b);
        assert!(!PixelPosition::from_vector(GeoCoord { x: -2.0, y: 0.0 }).is_valid());
    }

    #[test]
    fn sqr_distance_spans_the_coordinate_range() {
        let span = <u64 as From<u32>>::from(u32::MAX - 1);

        let origin = PixelPosition::new(0, 0);
        let far = PixelPosition::new(u32::MAX - 1, 0);
        assert_eq!(origin.sqr_distance(&far), span * span);

        // the signed range spans the same width
        let low = PixelPositionI::new(i32::MIN + 1, 0);
        let high = PixelPositionI::new(i32::MAX, 0);
        assert_eq!(low.sqr_distance(&high), span * span);
        assert_eq!(high.sqr_distance(&low), span * span);
    }
}
