//! Ear-clipping triangulation of pixel contours.

use geo::Coord as GeoCoord;

use crate::contour::PixelContour;

/// Triangle defined by three indices into an external, caller-owned
/// coordinate array; the triangle never owns or copies coordinate data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexTriangle {
    indices: [usize; 3],
}

impl IndexTriangle {
    #[inline]
    #[must_use]
    pub fn new(index0: usize, index1: usize, index2: usize) -> Self {
        Self {
            indices: [index0, index1, index2],
        }
    }

    /// A triangle is valid iff its three indices are pairwise distinct.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.indices[0] != self.indices[1]
            && self.indices[0] != self.indices[2]
            && self.indices[1] != self.indices[2]
    }

    #[inline]
    #[must_use]
    pub fn indices(&self) -> [usize; 3] {
        self.indices
    }

    #[inline]
    #[must_use]
    pub fn index(&self, corner: usize) -> usize {
        self.indices[corner]
    }
}

/// One remaining polygon corner during ear clipping.
struct Corner {
    /// Index of the corner in the original contour's pixel array.
    index: usize,
    position: GeoCoord<f64>,
    convex: bool,
}

#[inline]
fn cross(origin: GeoCoord<f64>, a: GeoCoord<f64>, b: GeoCoord<f64>) -> f64 {
    (a.x - origin.x) * (b.y - origin.y) - (b.x - origin.x) * (a.y - origin.y)
}

/// Whether `point` lies inside or on the boundary of the triangle `(a, b, c)`.
fn point_in_triangle(
    point: GeoCoord<f64>,
    a: GeoCoord<f64>,
    b: GeoCoord<f64>,
    c: GeoCoord<f64>,
) -> bool {
    let d0 = cross(a, b, point);
    let d1 = cross(b, c, point);
    let d2 = cross(c, a, point);

    let has_negative = d0 < 0.0 || d1 < 0.0 || d2 < 0.0;
    let has_positive = d0 > 0.0 || d1 > 0.0 || d2 > 0.0;

    !(has_negative && has_positive)
}

/// Convexity of the corner at `index`, consistent with the contour winding.
///
/// With y pointing down a counter-clockwise ring turns with negative cross
/// products, so convex corners share the winding's sign; exactly collinear
/// corners count as convex.
fn is_convex(corners: &[Corner], index: usize, counter_clockwise: bool) -> bool {
    let previous = &corners[(index + corners.len() - 1) % corners.len()];
    let corner = &corners[index];
    let next = &corners[(index + 1) % corners.len()];

    let turn = cross(corner.position, next.position, previous.position);

    if counter_clockwise { turn >= 0.0 } else { turn <= 0.0 }
}

/// Whether any remaining concave corner other than the three ear corners
/// lies inside the candidate ear triangle.
fn ear_is_blocked(corners: &[Corner], previous: usize, ear: usize, next: usize) -> bool {
    corners.iter().enumerate().any(|(index, corner)| {
        index != previous
            && index != ear
            && index != next
            && !corner.convex
            && point_in_triangle(
                corner.position,
                corners[previous].position,
                corners[ear].position,
                corners[next].position,
            )
    })
}

/// Collapses consecutive duplicate contour pixels (including the wrap edge)
/// into the polygon corner list.
fn collapse_corners(contour: &PixelContour) -> Vec<Corner> {
    let pixels = contour.pixels();

    let mut corners: Vec<Corner> = Vec::with_capacity(pixels.len());

    for (index, pixel) in pixels.iter().enumerate() {
        let duplicate = corners
            .last()
            .is_some_and(|corner| pixels[corner.index] == *pixel);

        if !duplicate {
            corners.push(Corner {
                index,
                position: pixel.to_vector(),
                convex: false,
            });
        }
    }

    while corners.len() > 1
        && pixels[corners[corners.len() - 1].index] == pixels[corners[0].index]
    {
        corners.pop();
    }

    corners
}

/// Triangulates the contour polygon by ear clipping.
///
/// Returns the triangles (indices into the contour's pixel array) and a flag
/// telling whether any ear had to be clipped with a relaxed validity test.
/// When a full pass finds no safe ear and `force_triangulation` is not set,
/// the triangle list comes back empty.
pub fn triangulate(
    contour: &PixelContour,
    force_triangulation: bool,
) -> (Vec<IndexTriangle>, bool) {
    let mut corners = collapse_corners(contour);

    if corners.len() < 3 {
        return (Vec::new(), false);
    }

    if corners.len() == 3 {
        let triangle = IndexTriangle::new(corners[0].index, corners[1].index, corners[2].index);
        return (vec![triangle], false);
    }

    // a one pixel wide or high contour holds no interior to partition
    let bounding_box = contour.bounding_box();
    if bounding_box.width() <= 1 || bounding_box.height() <= 1 {
        let triangle = IndexTriangle::new(corners[0].index, corners[1].index, corners[2].index);
        return (vec![triangle], false);
    }

    let counter_clockwise = contour.is_counter_clockwise();

    for index in 0..corners.len() {
        corners[index].convex = is_convex(&corners, index, counter_clockwise);
    }

    let mut triangles = Vec::with_capacity(corners.len() - 2);
    let mut forced = false;

    let mut cursor = 0usize;
    let mut failures = 0usize;

    while corners.len() > 3 {
        if failures > corners.len() {
            if !force_triangulation {
                return (Vec::new(), forced);
            }

            // no safe ear in a full pass: clip the next convex corner with
            // the containment requirement dropped
            forced = true;
            failures = 0;

            let mut ear = cursor % corners.len();
            for offset in 0..corners.len() {
                let candidate = (cursor + offset) % corners.len();
                if corners[candidate].convex {
                    ear = candidate;
                    break;
                }
            }

            cursor = clip_ear(&mut corners, &mut triangles, ear, counter_clockwise);
            continue;
        }

        let ear = cursor % corners.len();
        let previous = (ear + corners.len() - 1) % corners.len();
        let next = (ear + 1) % corners.len();

        if corners[ear].convex && !ear_is_blocked(&corners, previous, ear, next) {
            cursor = clip_ear(&mut corners, &mut triangles, ear, counter_clockwise);
            failures = 0;
        } else {
            cursor += 1;
            failures += 1;
        }
    }

    triangles.push(IndexTriangle::new(
        corners[0].index,
        corners[1].index,
        corners[2].index,
    ));

    (triangles, forced)
}

/// Emits the ear triangle, removes the ear corner and refreshes the
/// convexity of its two former neighbors. Returns the position to continue
/// scanning from.
fn clip_ear(
    corners: &mut Vec<Corner>,
    triangles: &mut Vec<IndexTriangle>,
    ear: usize,
    counter_clockwise: bool,
) -> usize {
    let previous = (ear + corners.len() - 1) % corners.len();
    let next = (ear + 1) % corners.len();

    triangles.push(IndexTriangle::new(
        corners[previous].index,
        corners[ear].index,
        corners[next].index,
    ));

    corners.remove(ear);

    let previous = (ear + corners.len() - 1) % corners.len();
    let next = ear % corners.len();

    corners[previous].convex = is_convex(corners, previous, counter_clockwise);
    corners[next].convex = is_convex(corners, next, counter_clockwise);

    previous
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::{PixelPosition, PixelPositions};

    fn contour(coordinates: &[(u32, u32)]) -> PixelContour {
        let pixels: PixelPositions = coordinates
            .iter()
            .map(|&(x, y)| PixelPosition::new(x, y))
            .collect();
        PixelContour::from_pixels(pixels)
    }

    /// Twice the enclosed area of one index triangle over the contour.
    fn double_area(contour: &PixelContour, triangle: &IndexTriangle) -> i64 {
        let [a, b, c] = triangle.indices();
        let a = contour[a];
        let b = contour[b];
        let c = contour[c];

        let area2 = (b.x() as i64 - a.x() as i64) * (c.y() as i64 - a.y() as i64)
            - (c.x() as i64 - a.x() as i64) * (b.y() as i64 - a.y() as i64);
        area2.abs()
    }

    #[test]
    fn index_triangle_validity() {
        assert!(IndexTriangle::new(0, 1, 2).is_valid());
        assert!(!IndexTriangle::new(0, 1, 0).is_valid());
        assert!(!IndexTriangle::new(3, 3, 3).is_valid());
    }

    #[test]
    fn square_yields_two_triangles_with_area_nine() {
        let square = contour(&[(0, 0), (0, 3), (3, 3), (3, 0)]);

        let (triangles, forced) = triangulate(&square, false);

        assert!(!forced);
        assert_eq!(triangles.len(), 2);
        assert!(triangles.iter().all(IndexTriangle::is_valid));

        let double_sum: i64 = triangles
            .iter()
            .map(|triangle| double_area(&square, triangle))
            .sum();
        assert_eq!(double_sum, 18);
        assert_eq!(square.area(), 9);
    }

    #[test]
    fn concave_polygon_area_is_preserved() {
        // L shape: 4x4 square with the upper right 2x2 corner removed
        let shape = contour(&[(0, 0), (0, 4), (4, 4), (4, 2), (2, 2), (2, 0)]);
        assert!(shape.is_counter_clockwise());

        let (triangles, forced) = triangulate(&shape, false);

        assert!(!forced);
        assert_eq!(triangles.len(), 4);
        assert!(triangles.iter().all(IndexTriangle::is_valid));

        let double_sum: i64 = triangles
            .iter()
            .map(|triangle| double_area(&shape, triangle))
            .sum();
        assert_eq!(double_sum, 2 * shape.area() as i64);
    }

    #[test]
    fn clockwise_winding_triangulates_too() {
        let square = contour(&[(0, 0), (3, 0), (3, 3), (0, 3)]);
        assert!(!square.is_counter_clockwise());

        let (triangles, forced) = triangulate(&square, false);

        assert!(!forced);
        assert_eq!(triangles.len(), 2);

        let double_sum: i64 = triangles
            .iter()
            .map(|triangle| double_area(&square, triangle))
            .sum();
        assert_eq!(double_sum, 18);
    }

    #[test]
    fn degenerate_contours_short_circuit() {
        assert!(triangulate(&contour(&[]), false).0.is_empty());
        assert!(triangulate(&contour(&[(2, 2)]), false).0.is_empty());
        assert!(triangulate(&contour(&[(2, 2), (5, 2)]), false).0.is_empty());

        // duplicate pixels collapse to fewer than three corners
        let doubled = contour(&[(2, 2), (2, 2), (5, 2), (5, 2)]);
        assert!(triangulate(&doubled, false).0.is_empty());

        // a one pixel high line produces a single trivial triangle
        let line = contour(&[(0, 0), (1, 0), (3, 0), (2, 0)]);
        let (triangles, forced) = triangulate(&line, false);
        assert!(!forced);
        assert_eq!(triangles.len(), 1);
        assert!(triangles[0].is_valid());
    }

    #[test]
    fn triangle_contour_returns_itself() {
        let triangle = contour(&[(0, 0), (0, 4), (4, 4)]);

        let (triangles, forced) = triangulate(&triangle, false);

        assert!(!forced);
        assert_eq!(triangles.len(), 1);
        assert_eq!(triangles[0].indices(), [0, 1, 2]);
    }

    #[test]
    fn dense_ring_triangulates_completely() {
        // densified square ring: many collinear corners along the edges
        let mut ring = contour(&[(0, 0), (0, 6), (6, 6), (6, 0)]);
        ring.make_dense();
        assert!(ring.is_dense());

        let (triangles, forced) = triangulate(&ring, false);

        assert!(!forced);
        assert_eq!(triangles.len(), ring.len() - 2);
        assert!(triangles.iter().all(IndexTriangle::is_valid));

        let double_sum: i64 = triangles
            .iter()
            .map(|triangle| double_area(&ring, triangle))
            .sum();
        assert_eq!(double_sum, 2 * ring.area() as i64);
    }
}
