//! Creation and modification of 8 bit masks: triangle and contour
//! rasterization, mask smoothing, separation-label selection and mask union.

use crate::analyzer::find_outline_4;
use crate::contour::PixelContour;
use crate::error::Error;
use crate::pixel::{Coord, PixelPosition, PixelPositionT};
use crate::plane::{Plane, PlaneMut};
use crate::triangulation::triangulate;
use crate::worker::{collect_sharded, WorkerPool};

/// Row count below which row-sharded scans stay on the calling thread.
const MIN_ROWS_PER_CHUNK: usize = 20;

/// Triangle of three pixel positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelTriangleT<T: Coord> {
    points: [PixelPositionT<T>; 3],
}

/// [`PixelTriangleT`] with unsigned coordinates.
pub type PixelTriangle = PixelTriangleT<u32>;

/// [`PixelTriangleT`] with signed coordinates, allowed to leave the frame.
pub type PixelTriangleI = PixelTriangleT<i32>;

impl<T: Coord> PixelTriangleT<T> {
    #[inline]
    #[must_use]
    pub fn new(
        point0: PixelPositionT<T>,
        point1: PixelPositionT<T>,
        point2: PixelPositionT<T>,
    ) -> Self {
        Self {
            points: [point0, point1, point2],
        }
    }

    #[inline]
    #[must_use]
    pub fn point0(&self) -> PixelPositionT<T> {
        self.points[0]
    }

    #[inline]
    #[must_use]
    pub fn point1(&self) -> PixelPositionT<T> {
        self.points[1]
    }

    #[inline]
    #[must_use]
    pub fn point2(&self) -> PixelPositionT<T> {
        self.points[2]
    }

    #[inline]
    #[must_use]
    pub fn points(&self) -> [PixelPositionT<T>; 3] {
        self.points
    }

    #[inline]
    #[must_use]
    pub fn left(&self) -> T {
        self.points[0].x().min(self.points[1].x()).min(self.points[2].x())
    }

    #[inline]
    #[must_use]
    pub fn top(&self) -> T {
        self.points[0].y().min(self.points[1].y()).min(self.points[2].y())
    }

    #[inline]
    #[must_use]
    pub fn right(&self) -> T {
        self.points[0].x().max(self.points[1].x()).max(self.points[2].x())
    }

    #[inline]
    #[must_use]
    pub fn bottom(&self) -> T {
        self.points[0].y().max(self.points[1].y()).max(self.points[2].y())
    }
}

/// One triangle edge, queried per scanline during rasterization.
struct PixelLine {
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
}

impl PixelLine {
    #[inline]
    fn new(p0: (i64, i64), p1: (i64, i64)) -> Self {
        Self {
            x0: p0.0,
            y0: p0.1,
            x1: p1.0,
            y1: p1.1,
        }
    }

    #[inline]
    fn is_horizontal(&self) -> bool {
        self.y0 == self.y1
    }

    /// Rounded x coordinate at which this line crosses row `y`, `None` when
    /// the row misses the line's vertical extent. Horizontal lines report
    /// their first point; the caller covers both endpoints separately.
    fn horizontal_intersection(&self, y: i64) -> Option<i64> {
        if y < self.y0.min(self.y1) || y > self.y0.max(self.y1) {
            return None;
        }

        if self.y0 == self.y1 {
            return Some(self.x0);
        }

        let factor = (y - self.y0) as f64 / (self.y1 - self.y0) as f64;
        Some((self.x0 as f64 + factor * (self.x1 - self.x0) as f64).round() as i64)
    }
}

#[inline]
fn points_i64(triangle: &PixelTriangle) -> [(i64, i64); 3] {
    triangle
        .points()
        .map(|point| (i64::from(point.x()), i64::from(point.y())))
}

#[inline]
fn points_i64_signed(triangle: &PixelTriangleI) -> [(i64, i64); 3] {
    triangle
        .points()
        .map(|point| (i64::from(point.x()), i64::from(point.y())))
}

/// Collects the clipped horizontal spans `(y, first x, last x)` covered by
/// one triangle: per scanline the extremes of the three edge intersections,
/// with exactly horizontal edges contributing both of their endpoints.
fn triangle_spans(points: [(i64, i64); 3], width: u32, height: u32, spans: &mut Vec<(u32, u32, u32)>) {
    debug_assert!(width != 0 && height != 0);

    let edges = [
        PixelLine::new(points[0], points[1]),
        PixelLine::new(points[0], points[2]),
        PixelLine::new(points[1], points[2]),
    ];

    let top = points[0].1.min(points[1].1).min(points[2].1);
    let bottom = points[0].1.max(points[1].1).max(points[2].1);

    let y_min = top.max(0);
    let y_max = bottom.min(i64::from(height) - 1);

    for y in y_min..=y_max {
        let mut x_min = i64::MAX;
        let mut x_max = i64::MIN;

        for edge in &edges {
            if let Some(x) = edge.horizontal_intersection(y) {
                x_min = x_min.min(x);
                x_max = x_max.max(x);

                if edge.is_horizontal() {
                    x_min = x_min.min(edge.x0).min(edge.x1);
                    x_max = x_max.max(edge.x0).max(edge.x1);
                }
            }
        }

        let x_min = x_min.max(0);
        let x_max = x_max.min(i64::from(width) - 1);

        if x_min <= x_max {
            spans.push((y as u32, x_min as u32, x_max as u32));
        }
    }
}

fn fill_triangle_points(
    mask: &mut PlaneMut<u8>,
    triangle_points: &[[(i64, i64); 3]],
    mask_value: u8,
    pool: Option<&dyn WorkerPool>,
) {
    if triangle_points.is_empty() {
        return;
    }

    let width = mask.width();
    let height = mask.height();

    let spans = collect_sharded(pool, triangle_points.len(), 1, &|range| {
        let mut spans = Vec::new();
        for n in range {
            triangle_spans(triangle_points[n], width, height, &mut spans);
        }
        spans
    });

    for (y, x_min, x_max) in spans {
        mask.row_mut(y)[x_min as usize..=x_max as usize].fill(mask_value);
    }
}

/// Paints one triangle into the mask, inclusive: corner and edge pixels
/// become mask pixels along with the interior. The triangle may exceed the
/// frame to the right and bottom; those parts are clipped.
pub fn triangle_to_inclusive_mask(mask: &mut PlaneMut<u8>, triangle: &PixelTriangle, mask_value: u8) {
    if triangle.left() >= mask.width() || triangle.top() >= mask.height() {
        return;
    }

    let mut spans = Vec::new();
    triangle_spans(points_i64(triangle), mask.width(), mask.height(), &mut spans);

    for (y, x_min, x_max) in spans {
        mask.row_mut(y)[x_min as usize..=x_max as usize].fill(mask_value);
    }
}

/// Signed-coordinate variant of [`triangle_to_inclusive_mask`]; the triangle
/// is clipped against all four frame borders.
pub fn triangle_to_inclusive_mask_signed(
    mask: &mut PlaneMut<u8>,
    triangle: &PixelTriangleI,
    mask_value: u8,
) {
    if triangle.left() >= mask.width() as i32
        || triangle.right() < 0
        || triangle.top() >= mask.height() as i32
        || triangle.bottom() < 0
    {
        return;
    }

    let mut spans = Vec::new();
    triangle_spans(points_i64_signed(triangle), mask.width(), mask.height(), &mut spans);

    for (y, x_min, x_max) in spans {
        mask.row_mut(y)[x_min as usize..=x_max as usize].fill(mask_value);
    }
}

/// Paints several triangles into the mask; the span computation is sharded
/// across the pool, the spans are written sequentially afterwards.
pub fn triangles_to_inclusive_mask(
    mask: &mut PlaneMut<u8>,
    triangles: &[PixelTriangle],
    mask_value: u8,
    pool: Option<&dyn WorkerPool>,
) {
    let triangle_points: Vec<[(i64, i64); 3]> = triangles.iter().map(points_i64).collect();
    fill_triangle_points(mask, &triangle_points, mask_value, pool);
}

/// Signed-coordinate variant of [`triangles_to_inclusive_mask`].
pub fn triangles_to_inclusive_mask_signed(
    mask: &mut PlaneMut<u8>,
    triangles: &[PixelTriangleI],
    mask_value: u8,
    pool: Option<&dyn WorkerPool>,
) {
    let triangle_points: Vec<[(i64, i64); 3]> = triangles.iter().map(points_i64_signed).collect();
    fill_triangle_points(mask, &triangle_points, mask_value, pool);
}

/// Rasterizes a (simplified) contour by triangulating it first, for rings
/// the direct span-offset path cannot safely handle.
///
/// The triangulation is forced when no safe ear remains, so a mask is
/// produced whenever the contour has an interior at all; the returned flag
/// tells whether forcing was necessary (the mask may then be faulty).
pub fn contour_to_inclusive_mask_by_triangulation(
    mask: &mut PlaneMut<u8>,
    simplified_contour: &PixelContour,
    mask_value: u8,
    pool: Option<&dyn WorkerPool>,
) -> Result<bool, Error> {
    let (index_triangles, forced) = triangulate(simplified_contour, true);

    if index_triangles.is_empty() {
        return Err(Error::TriangulationFailed);
    }

    let triangles: Vec<PixelTriangle> = index_triangles
        .iter()
        .map(|triangle| {
            let [a, b, c] = triangle.indices();
            PixelTriangle::new(
                simplified_contour[a],
                simplified_contour[b],
                simplified_contour[c],
            )
        })
        .collect();

    triangles_to_inclusive_mask(mask, &triangles, mask_value, pool);

    Ok(forced)
}

/// Classification of one same-row run of contour pixels.
enum RunKind {
    /// The ring passes through the row: the run bounds the interior on one
    /// side only.
    Crossing { left_boundary: bool },
    /// The ring reverses its vertical direction on the run. Convex caps are
    /// outward extremes with no interior on their row beyond the run itself;
    /// concave caps are notch bottoms with interior on both sides.
    Cap { concave: bool },
}

/// Decomposes a dense and distinct contour into per-row span-boundary
/// offsets.
///
/// Every maximal same-row pixel run is classified by the vertical direction
/// of the edges entering and leaving it, interpreted against the winding.
/// A crossing run contributes one offset (its outermost x for inclusive
/// masks, its innermost x for exclusive ones); a cap contributes its two run
/// ends for inclusive masks, and only when concave for exclusive ones.
fn dense_contour_offsets(contour: &PixelContour, inclusive: bool, offset_groups: &mut [Vec<u32>]) {
    debug_assert!(contour.is_dense());
    debug_assert!(contour.is_distinct());

    let pixels = contour.pixels();
    if pixels.is_empty() {
        return;
    }

    let first_y = pixels[0].y();
    if pixels.iter().all(|pixel| pixel.y() == first_y) {
        // single-row ring: all pixels are contour, no interior
        if inclusive {
            let min_x = pixels.iter().map(PixelPosition::x).min().unwrap();
            let max_x = pixels.iter().map(PixelPosition::x).max().unwrap();
            offset_groups[first_y as usize].push(min_x);
            offset_groups[first_y as usize].push(max_x);
        }
        return;
    }

    let winding: i32 = if contour.is_counter_clockwise() { 1 } else { -1 };
    let n = pixels.len();

    let start = (0..n)
        .find(|&index| pixels[(index + n - 1) % n].y() != pixels[index].y())
        .unwrap();

    let mut index = start;
    loop {
        let y = pixels[index].y();

        let mut length = 1;
        while pixels[(index + length) % n].y() == y {
            length += 1;
        }

        let previous = pixels[(index + n - 1) % n];
        let next = pixels[(index + length) % n];

        let mut min_x = u32::MAX;
        let mut max_x = 0;
        for k in 0..length {
            let x = pixels[(index + k) % n].x();
            min_x = min_x.min(x);
            max_x = max_x.max(x);
        }

        let down_in: i32 = if y > previous.y() { 1 } else { -1 };
        let down_out: i32 = if next.y() > y { 1 } else { -1 };

        let kind = if down_in == down_out {
            RunKind::Crossing {
                left_boundary: down_in * winding > 0,
            }
        } else {
            let lateral: i32 = if next.x() > previous.x() {
                1
            } else if next.x() < previous.x() {
                -1
            } else {
                0
            };
            RunKind::Cap {
                concave: down_in * lateral * winding < 0,
            }
        };

        let offsets = &mut offset_groups[y as usize];
        match kind {
            RunKind::Crossing { left_boundary } => {
                if left_boundary == inclusive {
                    offsets.push(min_x);
                } else {
                    offsets.push(max_x);
                }
            }
            RunKind::Cap { concave } => {
                if inclusive || concave {
                    offsets.push(min_x);
                    offsets.push(max_x);
                }
            }
        }

        index = (index + length) % n;
        if index == start {
            break;
        }
    }
}

fn inclusive_offsets_to_mask(offset_groups: &mut [Vec<u32>], mask: &mut PlaneMut<u8>, mask_value: u8) {
    for (y, offsets) in offset_groups.iter_mut().enumerate() {
        offsets.sort_unstable();
        debug_assert!(offsets.len() % 2 == 0);

        let row = mask.row_mut(y as u32);
        for pair in offsets.chunks_exact(2) {
            row[pair[0] as usize..=pair[1] as usize].fill(mask_value);
        }
    }
}

fn inclusive_offsets_to_mask_xor(
    offset_groups: &mut [Vec<u32>],
    mask: &mut PlaneMut<u8>,
    xor_reference: u8,
) {
    for (y, offsets) in offset_groups.iter_mut().enumerate() {
        offsets.sort_unstable();
        debug_assert!(offsets.len() % 2 == 0);

        let row = mask.row_mut(y as u32);

        // overlapping spans must be coalesced so no pixel is XORed twice
        let mut pairs = offsets.chunks_exact(2);
        let Some(first) = pairs.next() else {
            continue;
        };

        let mut span_start = first[0];
        let mut span_end = first[1];

        for pair in pairs {
            if pair[0] <= span_end {
                span_end = span_end.max(pair[1]);
            } else {
                for value in &mut row[span_start as usize..=span_end as usize] {
                    *value ^= xor_reference;
                }
                span_start = pair[0];
                span_end = pair[1];
            }
        }

        for value in &mut row[span_start as usize..=span_end as usize] {
            *value ^= xor_reference;
        }
    }
}

fn exclusive_offsets_to_mask(offset_groups: &mut [Vec<u32>], mask: &mut PlaneMut<u8>, mask_value: u8) {
    for (y, offsets) in offset_groups.iter_mut().enumerate() {
        offsets.sort_unstable();
        debug_assert!(offsets.len() % 2 == 0);

        let row = mask.row_mut(y as u32);
        for pair in offsets.chunks_exact(2) {
            if pair[1] > pair[0] + 1 {
                row[pair[0] as usize + 1..pair[1] as usize].fill(mask_value);
            }
        }
    }
}

fn exclusive_offsets_to_mask_xor(
    offset_groups: &mut [Vec<u32>],
    mask: &mut PlaneMut<u8>,
    xor_reference: u8,
) {
    for (y, offsets) in offset_groups.iter_mut().enumerate() {
        offsets.sort_unstable();
        debug_assert!(offsets.len() % 2 == 0);

        let row = mask.row_mut(y as u32);
        for pair in offsets.chunks_exact(2) {
            if pair[1] > pair[0] + 1 {
                for value in &mut row[pair[0] as usize + 1..pair[1] as usize] {
                    *value ^= xor_reference;
                }
            }
        }
    }
}

/// Rasterizes a dense, distinct contour inclusively: contour pixels and the
/// enclosed interior become mask pixels. Handles concave rings without
/// triangulating. The contour must lie entirely inside the frame.
pub fn dense_contour_to_inclusive_mask(
    mask: &mut PlaneMut<u8>,
    dense_contour: &PixelContour,
    mask_value: u8,
) {
    debug_assert!(contour_fits(dense_contour, mask));

    let mut offset_groups = vec![Vec::new(); mask.height() as usize];
    dense_contour_offsets(dense_contour, true, &mut offset_groups);
    inclusive_offsets_to_mask(&mut offset_groups, mask, mask_value);
}

/// Rasterizes a dense, distinct contour exclusively: only the enclosed
/// interior becomes mask pixels, the contour pixels stay untouched.
pub fn dense_contour_to_exclusive_mask(
    mask: &mut PlaneMut<u8>,
    dense_contour: &PixelContour,
    mask_value: u8,
) {
    debug_assert!(contour_fits(dense_contour, mask));

    let mut offset_groups = vec![Vec::new(); mask.height() as usize];
    dense_contour_offsets(dense_contour, false, &mut offset_groups);
    exclusive_offsets_to_mask(&mut offset_groups, mask, mask_value);
}

/// Like [`dense_contour_to_inclusive_mask`], but XORs the covered pixels
/// with `xor_reference` instead of overwriting them.
pub fn dense_contour_to_inclusive_mask_xor(
    mask: &mut PlaneMut<u8>,
    dense_contour: &PixelContour,
    xor_reference: u8,
) {
    debug_assert!(contour_fits(dense_contour, mask));

    let mut offset_groups = vec![Vec::new(); mask.height() as usize];
    dense_contour_offsets(dense_contour, true, &mut offset_groups);
    inclusive_offsets_to_mask_xor(&mut offset_groups, mask, xor_reference);
}

/// Like [`dense_contour_to_exclusive_mask`], but XORs the covered pixels
/// with `xor_reference` instead of overwriting them.
pub fn dense_contour_to_exclusive_mask_xor(
    mask: &mut PlaneMut<u8>,
    dense_contour: &PixelContour,
    xor_reference: u8,
) {
    debug_assert!(contour_fits(dense_contour, mask));

    let mut offset_groups = vec![Vec::new(); mask.height() as usize];
    dense_contour_offsets(dense_contour, false, &mut offset_groups);
    exclusive_offsets_to_mask_xor(&mut offset_groups, mask, xor_reference);
}

fn contour_fits(contour: &PixelContour, mask: &PlaneMut<u8>) -> bool {
    let bounding_box = contour.bounding_box();
    contour.is_empty()
        || (bounding_box.right() < mask.width() && bounding_box.bottom() < mask.height())
}

/// Smooths a mask by stamping its outline-4 with incrementing values over
/// several iterations, building a graduated border around the 0x00 mask.
///
/// `iterations * increment_value` must not exceed 255.
pub fn smooth_mask(mask: &mut PlaneMut<u8>, iterations: u8, increment_value: u8) {
    debug_assert!(iterations >= 1 && increment_value >= 1);
    debug_assert!(u32::from(iterations) * u32::from(increment_value) <= 255);

    for iteration in 1..=u32::from(iterations) {
        let value = (iteration * u32::from(increment_value)) as u8;

        let outline = find_outline_4(&mask.as_plane(), 0xFF, None);
        for pixel in outline {
            if mask.contains(pixel.x(), pixel.y()) {
                mask.set(pixel.x(), pixel.y(), value);
            }
        }
    }
}

/// Sets every mask pixel whose separation label equals `id` to `mask_value`.
pub fn separation_to_mask(
    separation: &Plane<u32>,
    id: u32,
    mask: &mut PlaneMut<u8>,
    mask_value: u8,
) {
    debug_assert!(separation.width() == mask.width() && separation.height() == mask.height());

    for y in 0..separation.height() {
        let labels = separation.row(y);
        let row = mask.row_mut(y);

        for (value, label) in row.iter_mut().zip(labels) {
            if *label == id {
                *value = mask_value;
            }
        }
    }
}

/// Sets every mask pixel whose separation label is flagged in `ids` to
/// `mask_value`. Labels outside the table (such as unlabeled background)
/// are skipped.
pub fn separations_to_mask(
    separation: &Plane<u32>,
    ids: &[bool],
    mask_value: u8,
    mask: &mut PlaneMut<u8>,
) {
    debug_assert!(separation.width() == mask.width() && separation.height() == mask.height());

    for y in 0..separation.height() {
        let labels = separation.row(y);
        let row = mask.row_mut(y);

        for (value, label) in row.iter_mut().zip(labels) {
            if let Some(true) = ids.get(*label as usize) {
                *value = mask_value;
            }
        }
    }
}

/// Joins `mask` into `target`: every pixel holding `mask_value` in either
/// frame holds it in `target` afterwards. The scan is sharded across the
/// pool; the updates are applied sequentially afterwards.
pub fn join_masks(
    mask: &Plane<u8>,
    target: &mut PlaneMut<u8>,
    mask_value: u8,
    pool: Option<&dyn WorkerPool>,
) {
    debug_assert!(mask.width() == target.width() && mask.height() == target.height());

    let width = mask.width() as usize;

    let updates = {
        let target_view = target.as_plane();

        collect_sharded(pool, mask.height() as usize, MIN_ROWS_PER_CHUNK, &|rows| {
            let mut found = Vec::new();

            for y in rows {
                let source_row = mask.row(y as u32);
                let target_row = target_view.row(y as u32);

                for x in 0..width {
                    if source_row[x] == mask_value && target_row[x] != mask_value {
                        found.push(PixelPosition::new(x as u32, y as u32));
                    }
                }
            }

            found
        })
    };

    for pixel in updates {
        target.set(pixel.x(), pixel.y(), mask_value);
    }
}
