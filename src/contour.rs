use geo::{Coord, LineString, Polygon};

use crate::bounding_box::PixelBoundingBox;
use crate::pixel::{PixelPosition, PixelPositions};

/// An ordered ring of pixel positions; the last pixel implicitly connects to
/// the first.
///
/// The bounding box, the index of the leftmost pixel and the winding are
/// derived state, recomputed eagerly after every structural mutation so all
/// queries stay `&self`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PixelContour {
    pixels: PixelPositions,
    bounding_box: PixelBoundingBox,
    most_left_index: Option<usize>,
    counter_clockwise: bool,
}

impl PixelContour {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            pixels: Vec::new(),
            bounding_box: PixelBoundingBox::default(),
            most_left_index: None,
            counter_clockwise: true,
        }
    }

    /// Contour from an already ring-ordered pixel sequence.
    #[must_use]
    pub fn from_pixels(pixels: PixelPositions) -> Self {
        let mut contour = Self {
            pixels,
            bounding_box: PixelBoundingBox::default(),
            most_left_index: None,
            counter_clockwise: true,
        };
        contour.refresh();
        contour
    }

    /// Contour from a ring-ordered sequence with already known derived state.
    ///
    /// Each hint that is `None` is computed; supplied hints are trusted
    /// (verified in debug builds).
    #[must_use]
    pub fn from_pixels_with_hints(
        pixels: PixelPositions,
        bounding_box: Option<PixelBoundingBox>,
        most_left_index: Option<usize>,
        counter_clockwise: Option<bool>,
    ) -> Self {
        let computed_bounding_box =
            bounding_box.unwrap_or_else(|| PixelBoundingBox::from_points(&pixels));
        debug_assert!(computed_bounding_box == PixelBoundingBox::from_points(&pixels));

        let computed_most_left = match most_left_index {
            Some(index) => {
                debug_assert!(Some(index) == Self::compute_most_left_index(&pixels));
                Some(index)
            }
            None => Self::compute_most_left_index(&pixels),
        };

        let computed_counter_clockwise = match counter_clockwise {
            Some(ccw) => {
                debug_assert!(ccw == Self::compute_counter_clockwise(&pixels, computed_most_left));
                ccw
            }
            None => Self::compute_counter_clockwise(&pixels, computed_most_left),
        };

        Self {
            pixels,
            bounding_box: computed_bounding_box,
            most_left_index: computed_most_left,
            counter_clockwise: computed_counter_clockwise,
        }
    }

    /// Contour from a ring-ordered sequence, immediately distinct-ified
    /// and/or simplified.
    #[must_use]
    pub fn with_options(pixels: PixelPositions, create_distinct: bool, create_simplified: bool) -> Self {
        let mut contour = Self::from_pixels(pixels);
        if create_simplified {
            contour.simplify();
        } else if create_distinct {
            contour.make_distinct();
        }
        contour
    }

    /// Greedy sparse contour: starting at `start_index`, keeps only pixels at
    /// least `min_sqr_distance` away from the previously kept pixel, and
    /// drops the final pixel if it ends up too close to the first.
    #[must_use]
    pub fn sparse_from(pixels: &[PixelPosition], min_sqr_distance: u64, start_index: usize) -> Self {
        debug_assert!(min_sqr_distance >= 1);

        if pixels.is_empty() {
            return Self::new();
        }

        debug_assert!(start_index < pixels.len());
        let start_index = start_index % pixels.len();

        let mut sparse = Vec::with_capacity(pixels.len());
        sparse.push(pixels[start_index]);

        for n in 1..pixels.len() {
            let candidate = pixels[(start_index + n) % pixels.len()];
            if sparse.last().unwrap().sqr_distance(&candidate) >= min_sqr_distance {
                sparse.push(candidate);
            }
        }

        if sparse.len() > 1 && sparse[0].sqr_distance(sparse.last().unwrap()) < min_sqr_distance {
            sparse.pop();
        }

        Self::from_pixels(sparse)
    }

    #[inline]
    #[must_use]
    pub fn pixels(&self) -> &[PixelPosition] {
        &self.pixels
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn bounding_box(&self) -> PixelBoundingBox {
        self.bounding_box
    }

    /// Index of the leftmost pixel; among equal-x pixels the one with the
    /// largest y wins. `None` for an empty contour.
    #[inline]
    #[must_use]
    pub fn index_left_position(&self) -> Option<usize> {
        self.most_left_index
    }

    /// Global winding, derived from the two edges meeting at the leftmost
    /// pixel. Degenerate rings report `true`.
    #[inline]
    #[must_use]
    pub fn is_counter_clockwise(&self) -> bool {
        self.counter_clockwise
    }

    /// Enclosed area by the shoelace formula; zero for fewer than 3 pixels.
    #[inline]
    #[must_use]
    pub fn area(&self) -> u64 {
        self.area_signed().unsigned_abs()
    }

    /// Signed enclosed area; the sign encodes the winding.
    #[must_use]
    pub fn area_signed(&self) -> i64 {
        if self.pixels.len() < 3 {
            return 0;
        }

        let mut area: i128 = 0;
        for n in 0..self.pixels.len() {
            let current = &self.pixels[n];
            let next = &self.pixels[(n + 1) % self.pixels.len()];
            area += i128::from(current.x()) * i128::from(next.y())
                - i128::from(current.y()) * i128::from(next.x());
        }

        debug_assert!(i64::try_from(area).is_ok(), "area overflow");
        let area = area as i64;

        // round away from zero to compensate the half-pixel raster offset
        if area >= 0 { (area + 1) / 2 } else { (area - 1) / 2 }
    }

    /// Whether no two consecutive pixels (including the wrap edge) are equal.
    #[must_use]
    pub fn is_distinct(&self) -> bool {
        if self.pixels.len() <= 1 {
            return true;
        }

        for window in self.pixels.windows(2) {
            if window[0] == window[1] {
                return false;
            }
        }

        self.pixels.first() != self.pixels.last()
    }

    /// Whether consecutive pixels (including the wrap edge) are 8-neighbors.
    #[must_use]
    pub fn is_dense(&self) -> bool {
        if self.pixels.len() <= 1 {
            return true;
        }

        for window in self.pixels.windows(2) {
            if !window[0].is_neighbor8(&window[1]) {
                return false;
            }
        }

        self.pixels.last().unwrap().is_neighbor8(&self.pixels[0])
    }

    /// Whether consecutive pixels (including the wrap edge) are 4-neighbors.
    #[must_use]
    pub fn is_dense4(&self) -> bool {
        if self.pixels.len() <= 1 {
            return true;
        }

        for window in self.pixels.windows(2) {
            if !window[0].is_neighbor4(&window[1]) {
                return false;
            }
        }

        self.pixels.last().unwrap().is_neighbor4(&self.pixels[0])
    }

    /// Whether no pixel lies on a straight same-direction run between its
    /// ring neighbors (including both wrap edges), i.e. `simplified()` would
    /// not remove anything.
    #[must_use]
    pub fn is_simplified(&self) -> bool {
        if self.pixels.len() <= 2 {
            return true;
        }

        let wrap = Self::step(self.pixels.last().unwrap(), &self.pixels[0]);

        let mut previous = wrap;
        for n in 1..self.pixels.len() {
            let current = Self::step(&self.pixels[n - 1], &self.pixels[n]);
            if current != (0, 0) && previous != (0, 0) && Self::similar(previous, current) {
                return false;
            }
            previous = current;
        }

        // the last pixel's pair closes the ring through the wrap edge; exact
        // equality here, matching the wrap handling of `simplified`
        previous != wrap
    }

    /// Removes consecutive duplicate pixels, including the wrap edge.
    pub fn make_distinct(&mut self) {
        if self.pixels.len() <= 1 {
            return;
        }

        let mut distinct = Vec::with_capacity(self.pixels.len());
        distinct.push(self.pixels[0]);

        for n in 1..self.pixels.len() {
            if self.pixels[n - 1] != self.pixels[n] {
                distinct.push(self.pixels[n]);
            }
        }

        if distinct.len() > 1 && distinct.first() == distinct.last() {
            distinct.pop();
        }

        self.pixels = distinct;
        self.refresh();
    }

    /// Bresenham-interpolates every ring edge (including the wrap edge) into
    /// an 8-connected walk.
    pub fn make_dense(&mut self) {
        if self.pixels.len() <= 1 {
            return;
        }

        let mut dense = Vec::with_capacity(self.pixels.len() * 4);
        for n in 0..self.pixels.len() {
            let start = self.pixels[n];
            let end = self.pixels[(n + 1) % self.pixels.len()];
            Self::bresenham_excluding_end(start, end, &mut dense);
        }

        self.pixels = dense;
        self.refresh();
    }

    /// Copy with all removable collinear pixels dropped.
    ///
    /// A pixel is removable when the edge reaching it and the edge leaving it
    /// point in the same direction (parallel with matching per-axis signs).
    #[must_use]
    pub fn simplified(&self) -> Self {
        if self.pixels.len() <= 1 {
            return self.clone();
        }

        let mut simplified = Vec::with_capacity(self.pixels.len());
        let mut current_direction = Self::step(self.pixels.last().unwrap(), &self.pixels[0]);

        for n in 1..self.pixels.len() {
            let new_direction = Self::step(&self.pixels[n - 1], &self.pixels[n]);
            if new_direction != (0, 0) {
                if current_direction == (0, 0) || !Self::similar(current_direction, new_direction) {
                    current_direction = new_direction;
                    simplified.push(self.pixels[n - 1]);
                }
            }
        }

        let wrap_direction = Self::step(self.pixels.last().unwrap(), &self.pixels[0]);
        if current_direction != wrap_direction {
            simplified.push(*self.pixels.last().unwrap());
        }

        Self::from_pixels(simplified)
    }

    pub fn simplify(&mut self) {
        *self = self.simplified();
    }

    /// Greedy sparse copy, see [`PixelContour::sparse_from`].
    #[must_use]
    pub fn sparse_contour(&self, min_sqr_distance: u64, start_index: usize) -> Self {
        if self.pixels.is_empty() {
            return Self::new();
        }
        Self::sparse_from(&self.pixels, min_sqr_distance, start_index)
    }

    /// Smallest squared distance between consecutive pixels (wrap included).
    #[must_use]
    pub fn smallest_sqr_distance_between_pixels(&self) -> u64 {
        debug_assert!(!self.pixels.is_empty());
        if self.pixels.is_empty() {
            return 0;
        }

        let mut sqr_distance = self.pixels[0].sqr_distance(self.pixels.last().unwrap());
        for window in self.pixels.windows(2) {
            sqr_distance = sqr_distance.min(window[0].sqr_distance(&window[1]));
        }
        sqr_distance
    }

    /// Largest squared distance between consecutive pixels (wrap included).
    #[must_use]
    pub fn largest_sqr_distance_between_pixels(&self) -> u64 {
        debug_assert!(!self.pixels.is_empty());
        if self.pixels.is_empty() {
            return 0;
        }

        let mut sqr_distance = self.pixels[0].sqr_distance(self.pixels.last().unwrap());
        for window in self.pixels.windows(2) {
            sqr_distance = sqr_distance.max(window[0].sqr_distance(&window[1]));
        }
        sqr_distance
    }

    /// Open line string of the ring pixels (not explicitly closed).
    #[must_use]
    pub fn to_line_string(&self) -> LineString {
        LineString::from(
            self.pixels
                .iter()
                .map(|pixel| Coord {
                    x: f64::from(pixel.x()),
                    y: f64::from(pixel.y()),
                })
                .collect::<Vec<_>>(),
        )
    }

    /// Closed polygon without holes.
    #[must_use]
    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(self.to_line_string(), Vec::new())
    }

    fn refresh(&mut self) {
        self.bounding_box = PixelBoundingBox::from_points(&self.pixels);
        self.most_left_index = Self::compute_most_left_index(&self.pixels);
        self.counter_clockwise = Self::compute_counter_clockwise(&self.pixels, self.most_left_index);
    }

    fn compute_most_left_index(pixels: &[PixelPosition]) -> Option<usize> {
        let mut best: Option<usize> = None;

        for (n, pixel) in pixels.iter().enumerate() {
            match best {
                None => best = Some(n),
                Some(index) => {
                    let current = &pixels[index];
                    if pixel.x() < current.x() || (pixel.x() == current.x() && pixel.y() > current.y()) {
                        best = Some(n);
                    }
                }
            }
        }

        best
    }

    fn compute_counter_clockwise(pixels: &[PixelPosition], most_left_index: Option<usize>) -> bool {
        let Some(index0) = most_left_index else {
            return true;
        };

        let n = pixels.len();
        if n < 3 {
            return true;
        }

        let index2 = (index0 + n - 1) % n;
        let position0 = pixels[index0];
        let position2 = pixels[index2];

        let dx02 = i64::from(position2.x()) - i64::from(position0.x());
        let dy02 = i64::from(position2.y()) - i64::from(position0.y());

        for offset in 1..n {
            let index1 = (index0 + offset) % n;
            if index1 == index2 || index1 == index0 {
                // degenerate ring, the result is arbitrary
                return true;
            }

            let position1 = pixels[index1];
            let dx01 = i64::from(position1.x()) - i64::from(position0.x());
            let dy01 = i64::from(position1.y()) - i64::from(position0.y());

            let cross = dx01 * dy02 - dx02 * dy01;
            if cross != 0 {
                return cross < 0;
            }
        }

        true
    }

    #[inline]
    fn step(from: &PixelPosition, to: &PixelPosition) -> (i64, i64) {
        (
            i64::from(to.x()) - i64::from(from.x()),
            i64::from(to.y()) - i64::from(from.y()),
        )
    }

    /// Parallel with matching per-axis signs: a straight continuation, as
    /// opposed to a reversal along the same slope.
    #[inline]
    fn similar(first: (i64, i64), second: (i64, i64)) -> bool {
        first.0 * second.1 == second.0 * first.1
            && (first.0 < 0) == (second.0 < 0)
            && (first.1 < 0) == (second.1 < 0)
    }

    fn bresenham_excluding_end(start: PixelPosition, end: PixelPosition, out: &mut PixelPositions) {
        let mut x = i64::from(start.x());
        let mut y = i64::from(start.y());
        let x_end = i64::from(end.x());
        let y_end = i64::from(end.y());

        let dx = (x_end - x).abs();
        let dy = -(y_end - y).abs();
        let step_x = if x < x_end { 1 } else { -1 };
        let step_y = if y < y_end { 1 } else { -1 };
        let mut error = dx + dy;

        while x != x_end || y != y_end {
            out.push(PixelPosition::new(x as u32, y as u32));

            let doubled = 2 * error;
            if doubled >= dy {
                error += dy;
                x += step_x;
            }
            if doubled <= dx {
                error += dx;
                y += step_y;
            }
        }
    }
}

impl std::ops::Index<usize> for PixelContour {
    type Output = PixelPosition;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.pixels[index]
    }
}

impl From<PixelPositions> for PixelContour {
    #[inline]
    fn from(pixels: PixelPositions) -> Self {
        Self::from_pixels(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_ccw() -> PixelContour {
        PixelContour::from_pixels(vec![
            PixelPosition::new(0, 0),
            PixelPosition::new(0, 3),
            PixelPosition::new(3, 3),
            PixelPosition::new(3, 0),
        ])
    }

    #[test]
    fn winding_of_the_square() {
        let ccw = square_ccw();
        assert!(ccw.is_counter_clockwise());
        assert_eq!(ccw.index_left_position(), Some(1)); // largest y among x == 0

        let mut reversed_pixels = ccw.pixels().to_vec();
        reversed_pixels.reverse();
        let cw = PixelContour::from_pixels(reversed_pixels);
        assert!(!cw.is_counter_clockwise());
    }

    #[test]
    fn area_is_winding_signed() {
        let ccw = square_ccw();
        assert_eq!(ccw.area(), 9);
        assert!(ccw.area_signed() < 0);

        let mut reversed_pixels = ccw.pixels().to_vec();
        reversed_pixels.reverse();
        let cw = PixelContour::from_pixels(reversed_pixels);
        assert_eq!(cw.area_signed(), 9);

        assert_eq!(PixelContour::from_pixels(vec![PixelPosition::new(1, 1)]).area(), 0);
    }

    #[test]
    fn area_is_translation_invariant() {
        let shifted = PixelContour::from_pixels(vec![
            PixelPosition::new(7, 5),
            PixelPosition::new(7, 8),
            PixelPosition::new(10, 8),
            PixelPosition::new(10, 5),
        ]);
        assert_eq!(shifted.area(), square_ccw().area());
    }

    #[test]
    fn bounding_box_and_leftmost() {
        let contour = PixelContour::from_pixels(vec![
            PixelPosition::new(5, 2),
            PixelPosition::new(2, 4),
            PixelPosition::new(2, 9),
            PixelPosition::new(8, 6),
        ]);
        assert_eq!(contour.bounding_box(), crate::bounding_box::PixelBoundingBox::new(2, 2, 8, 9));
        assert_eq!(contour.index_left_position(), Some(2));
    }

    #[test]
    fn dense_then_distinct_holds_invariants() {
        let mut contour = square_ccw();
        contour.make_dense();
        assert!(contour.is_dense());
        assert!(contour.is_dense4()); // axis-aligned edges only
        assert_eq!(contour.len(), 12);

        contour.make_distinct();
        assert!(contour.is_distinct());
        assert!(contour.is_dense());
    }

    #[test]
    fn dense_diagonal_walk() {
        let mut contour = PixelContour::from_pixels(vec![
            PixelPosition::new(0, 0),
            PixelPosition::new(3, 3),
            PixelPosition::new(3, 0),
        ]);
        contour.make_dense();
        assert!(contour.is_dense());
        assert_eq!(
            &contour.pixels()[..4],
            &[
                PixelPosition::new(0, 0),
                PixelPosition::new(1, 1),
                PixelPosition::new(2, 2),
                PixelPosition::new(3, 3),
            ]
        );
    }

    #[test]
    fn simplify_recovers_square_corners() {
        let mut contour = square_ccw();
        contour.make_dense();
        assert!(!contour.is_simplified());

        let simplified = contour.simplified();
        assert!(simplified.is_simplified());
        assert!(simplified.is_distinct());
        assert_eq!(simplified.len(), 4);
        assert_eq!(simplified.area(), contour.area());
        assert_eq!(simplified.is_counter_clockwise(), contour.is_counter_clockwise());
    }

    #[test]
    fn simplify_distinguishes_reversal_from_continuation() {
        // A spike: the path reverses direction at (4, 0); the spike tip must
        // survive simplification.
        let contour = PixelContour::from_pixels(vec![
            PixelPosition::new(0, 0),
            PixelPosition::new(2, 0),
            PixelPosition::new(4, 0),
            PixelPosition::new(2, 0),
            PixelPosition::new(2, 2),
            PixelPosition::new(0, 2),
        ]);
        let simplified = contour.simplified();
        assert_eq!(
            simplified.pixels(),
            &[
                PixelPosition::new(0, 0),
                PixelPosition::new(4, 0),
                PixelPosition::new(2, 0),
                PixelPosition::new(2, 2),
                PixelPosition::new(0, 2),
            ]
        );
    }

    #[test]
    fn trailing_pixel_on_the_closing_edge_is_not_simplified() {
        // The last pixel lies on the straight segment closing the ring, so
        // the wrap pair at that pixel must count as removable.
        let contour = PixelContour::from_pixels(vec![
            PixelPosition::new(0, 0),
            PixelPosition::new(4, 0),
            PixelPosition::new(4, 4),
            PixelPosition::new(0, 4),
            PixelPosition::new(0, 2),
        ]);
        assert!(!contour.is_simplified());

        let simplified = contour.simplified();
        assert_eq!(simplified.len(), 4);
        assert!(simplified.is_simplified());
        assert_eq!(simplified.area(), contour.area());
    }

    #[test]
    fn sparse_contour_enforces_min_distance() {
        let mut contour = square_ccw();
        contour.make_dense();

        let sparse = contour.sparse_contour(4, 0);
        assert!(sparse.len() > 1);
        assert!(sparse.smallest_sqr_distance_between_pixels() >= 4);
        assert_eq!(sparse[0], contour[0]);

        // pinned start index survives
        let pinned = contour.sparse_contour(4, 3);
        assert_eq!(pinned[0], contour[3]);
    }

    #[test]
    fn distinct_collapses_duplicates_and_wrap() {
        let mut contour = PixelContour::from_pixels(vec![
            PixelPosition::new(1, 1),
            PixelPosition::new(1, 1),
            PixelPosition::new(2, 1),
            PixelPosition::new(2, 2),
            PixelPosition::new(1, 1),
        ]);
        contour.make_distinct();
        assert!(contour.is_distinct());
        assert_eq!(contour.len(), 3);
    }

    #[test]
    fn degenerate_contours_are_well_defined() {
        let empty = PixelContour::new();
        assert!(empty.is_empty());
        assert!(empty.is_distinct() && empty.is_dense() && empty.is_simplified());
        assert!(empty.is_counter_clockwise());
        assert_eq!(empty.index_left_position(), None);

        let all_same = PixelContour::from_pixels(vec![PixelPosition::new(2, 2); 4]);
        assert!(all_same.is_counter_clockwise());
        assert_eq!(all_same.area(), 0);
    }

    #[test]
    fn edge_length_extremes() {
        let contour = square_ccw();
        assert_eq!(contour.smallest_sqr_distance_between_pixels(), 9);
        assert_eq!(contour.largest_sqr_distance_between_pixels(), 9);
    }
}
