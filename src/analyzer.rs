//! Analysis of 8 bit binary masks: boundary extraction, contour walking,
//! connected components and distance transforms.
//!
//! All functions borrow caller-owned [`Plane`] views; mask and non-mask
//! values are raw bytes chosen by the caller (`0x00` mask / `0xFF` non-mask
//! in most places).

use std::collections::BTreeSet;

use crate::bounding_box::PixelBoundingBox;
use crate::contour::PixelContour;
use crate::pixel::{PixelDirection, PixelPosition, PixelPositions};
use crate::plane::{Plane, PlaneMut};
use crate::worker::{WorkerPool, collect_sharded};

/// Separation id of pixels that belong to no mask block.
pub const NO_SEPARATION_ID: u32 = u32::MAX;

/// Sentinel written into the scratch border of the distance transform.
const DISTANCE_BOUNDARY: u32 = u32::MAX / 2;

/// Row count below which row-sharded scans stay on the calling thread.
const MIN_ROWS_PER_CHUNK: usize = 20;

#[inline]
fn compare<T: PartialEq, const EQUAL: bool>(value: T, test_value: T) -> bool {
    if EQUAL {
        value == test_value
    } else {
        value != test_value
    }
}

/// Resolves an optional sub-window to `(first_column, end_column, first_row,
/// end_row)` with exclusive end positions.
fn window(
    bounding_box: Option<PixelBoundingBox>,
    width: u32,
    height: u32,
) -> (u32, u32, u32, u32) {
    match bounding_box {
        Some(area) if area.is_valid() => {
            debug_assert!(area.right() < width && area.bottom() < height);
            (area.left(), area.right() + 1, area.top(), area.bottom() + 1)
        }
        _ => (0, width, 0, height),
    }
}

/// Whether any pixel in the 4-neighborhood of `position` compares `EQUAL`
/// (or not equal) to `test_value`.
///
/// Positions at least one pixel away from every frame edge take the
/// bounds-check-free center path.
pub fn has_mask_neighbor_4<const EQUAL: bool, T: PartialEq + Copy>(
    mask: &Plane<T>,
    position: PixelPosition,
    test_value: T,
) -> bool {
    let (x, y) = (position.x(), position.y());
    debug_assert!(mask.contains(x, y));

    if x >= 1 && x + 1 < mask.width() && y >= 1 && y + 1 < mask.height() {
        return has_mask_neighbor_4_center::<EQUAL, T>(mask, position, test_value);
    }

    (x != 0 && compare::<_, EQUAL>(mask.value(x - 1, y), test_value))
        || (x + 1 < mask.width() && compare::<_, EQUAL>(mask.value(x + 1, y), test_value))
        || (y != 0 && compare::<_, EQUAL>(mask.value(x, y - 1), test_value))
        || (y + 1 < mask.height() && compare::<_, EQUAL>(mask.value(x, y + 1), test_value))
}

/// 4-neighborhood test for positions at least one pixel inside the frame.
pub fn has_mask_neighbor_4_center<const EQUAL: bool, T: PartialEq + Copy>(
    mask: &Plane<T>,
    position: PixelPosition,
    test_value: T,
) -> bool {
    let (x, y) = (position.x(), position.y());
    debug_assert!(x >= 1 && x + 1 < mask.width() && y >= 1 && y + 1 < mask.height());

    compare::<_, EQUAL>(mask.value(x - 1, y), test_value)
        || compare::<_, EQUAL>(mask.value(x + 1, y), test_value)
        || compare::<_, EQUAL>(mask.value(x, y - 1), test_value)
        || compare::<_, EQUAL>(mask.value(x, y + 1), test_value)
}

/// Like [`has_mask_neighbor_4`] with the center pixel included in the test.
pub fn has_mask_neighbor_5<const EQUAL: bool, T: PartialEq + Copy>(
    mask: &Plane<T>,
    position: PixelPosition,
    test_value: T,
) -> bool {
    compare::<_, EQUAL>(mask.value(position.x(), position.y()), test_value)
        || has_mask_neighbor_4::<EQUAL, T>(mask, position, test_value)
}

/// 5-neighborhood test for positions at least one pixel inside the frame.
pub fn has_mask_neighbor_5_center<const EQUAL: bool, T: PartialEq + Copy>(
    mask: &Plane<T>,
    position: PixelPosition,
    test_value: T,
) -> bool {
    compare::<_, EQUAL>(mask.value(position.x(), position.y()), test_value)
        || has_mask_neighbor_4_center::<EQUAL, T>(mask, position, test_value)
}

/// Whether any pixel in the 8-neighborhood of `position` compares `EQUAL`
/// (or not equal) to `test_value`.
pub fn has_mask_neighbor_8<const EQUAL: bool, T: PartialEq + Copy>(
    mask: &Plane<T>,
    position: PixelPosition,
    test_value: T,
) -> bool {
    let (x, y) = (position.x(), position.y());
    debug_assert!(mask.contains(x, y));

    if x >= 1 && x + 1 < mask.width() && y >= 1 && y + 1 < mask.height() {
        return has_mask_neighbor_8_center::<EQUAL, T>(mask, position, test_value);
    }

    let left = x != 0;
    let right = x + 1 < mask.width();
    let top = y != 0;
    let bottom = y + 1 < mask.height();

    (left && compare::<_, EQUAL>(mask.value(x - 1, y), test_value))
        || (right && compare::<_, EQUAL>(mask.value(x + 1, y), test_value))
        || (top && compare::<_, EQUAL>(mask.value(x, y - 1), test_value))
        || (bottom && compare::<_, EQUAL>(mask.value(x, y + 1), test_value))
        || (left && top && compare::<_, EQUAL>(mask.value(x - 1, y - 1), test_value))
        || (right && top && compare::<_, EQUAL>(mask.value(x + 1, y - 1), test_value))
        || (left && bottom && compare::<_, EQUAL>(mask.value(x - 1, y + 1), test_value))
        || (right && bottom && compare::<_, EQUAL>(mask.value(x + 1, y + 1), test_value))
}

/// 8-neighborhood test for positions at least one pixel inside the frame.
pub fn has_mask_neighbor_8_center<const EQUAL: bool, T: PartialEq + Copy>(
    mask: &Plane<T>,
    position: PixelPosition,
    test_value: T,
) -> bool {
    let (x, y) = (position.x(), position.y());
    debug_assert!(x >= 1 && x + 1 < mask.width() && y >= 1 && y + 1 < mask.height());

    compare::<_, EQUAL>(mask.value(x - 1, y), test_value)
        || compare::<_, EQUAL>(mask.value(x + 1, y), test_value)
        || compare::<_, EQUAL>(mask.value(x - 1, y - 1), test_value)
        || compare::<_, EQUAL>(mask.value(x, y - 1), test_value)
        || compare::<_, EQUAL>(mask.value(x + 1, y - 1), test_value)
        || compare::<_, EQUAL>(mask.value(x - 1, y + 1), test_value)
        || compare::<_, EQUAL>(mask.value(x, y + 1), test_value)
        || compare::<_, EQUAL>(mask.value(x + 1, y + 1), test_value)
}

/// Like [`has_mask_neighbor_8`] with the center pixel included in the test.
pub fn has_mask_neighbor_9<const EQUAL: bool, T: PartialEq + Copy>(
    mask: &Plane<T>,
    position: PixelPosition,
    test_value: T,
) -> bool {
    compare::<_, EQUAL>(mask.value(position.x(), position.y()), test_value)
        || has_mask_neighbor_8::<EQUAL, T>(mask, position, test_value)
}

/// 9-neighborhood test for positions at least one pixel inside the frame.
pub fn has_mask_neighbor_9_center<const EQUAL: bool, T: PartialEq + Copy>(
    mask: &Plane<T>,
    position: PixelPosition,
    test_value: T,
) -> bool {
    compare::<_, EQUAL>(mask.value(position.x(), position.y()), test_value)
        || has_mask_neighbor_8_center::<EQUAL, T>(mask, position, test_value)
}

/// Finds all outline-4 pixels: non-mask pixels with at least one mask pixel
/// in their 4-neighborhood, one ring outside the mask.
///
/// Mask pixels sitting directly on the frame edge contribute outline pixels
/// *outside* the frame (coordinates wrap below zero or reach `width`/
/// `height`); [`pixels_to_contour`] strips those again. The optional
/// `bounding_box` restricts the scan; callers that windowed the mask should
/// extend the mask's own box by one pixel first.
pub fn find_outline_4(
    mask: &Plane<u8>,
    non_mask_value: u8,
    bounding_box: Option<PixelBoundingBox>,
) -> PixelPositions {
    let width = mask.width();
    let height = mask.height();
    debug_assert!(width >= 2 && height >= 2);

    let (first_column, end_column, first_row, end_row) = window(bounding_box, width, height);

    let mut outline = PixelPositions::new();
    let outside = 0u32.wrapping_sub(1);

    if first_row == 0 {
        let row = mask.row(0);
        let row_bottom = mask.row(1);

        if first_column == 0 {
            if row[0] != non_mask_value {
                outline.push(PixelPosition::new(0, outside));
                outline.push(PixelPosition::new(outside, 0));
            } else if row[1] != non_mask_value || row_bottom[0] != non_mask_value {
                outline.push(PixelPosition::new(0, 0));
            }
        }

        for x in first_column.max(1)..end_column.min(width - 1) {
            let xi = x as usize;
            if row[xi] != non_mask_value {
                outline.push(PixelPosition::new(x, outside));
            } else if row[xi - 1] != non_mask_value
                || row[xi + 1] != non_mask_value
                || row_bottom[xi] != non_mask_value
            {
                outline.push(PixelPosition::new(x, 0));
            }
        }

        if end_column == width {
            let xi = (width - 1) as usize;
            if row[xi] != non_mask_value {
                outline.push(PixelPosition::new(width - 1, outside));
                outline.push(PixelPosition::new(width, 0));
            } else if row[xi - 1] != non_mask_value || row_bottom[xi] != non_mask_value {
                outline.push(PixelPosition::new(width - 1, 0));
            }
        }
    }

    for y in first_row.max(1)..end_row.min(height - 1) {
        let row_top = mask.row(y - 1);
        let row = mask.row(y);
        let row_bottom = mask.row(y + 1);

        if first_column == 0 {
            if row[0] != non_mask_value {
                outline.push(PixelPosition::new(outside, y));
            } else if row[1] != non_mask_value
                || row_top[0] != non_mask_value
                || row_bottom[0] != non_mask_value
            {
                outline.push(PixelPosition::new(0, y));
            }
        }

        for x in first_column.max(1)..end_column.min(width - 1) {
            let xi = x as usize;
            if row[xi] == non_mask_value
                && (row[xi - 1] != non_mask_value
                    || row[xi + 1] != non_mask_value
                    || row_top[xi] != non_mask_value
                    || row_bottom[xi] != non_mask_value)
            {
                outline.push(PixelPosition::new(x, y));
            }
        }

        if end_column == width {
            let xi = (width - 1) as usize;
            if row[xi] != non_mask_value {
                outline.push(PixelPosition::new(width, y));
            } else if row[xi - 1] != non_mask_value
                || row_top[xi] != non_mask_value
                || row_bottom[xi] != non_mask_value
            {
                outline.push(PixelPosition::new(width - 1, y));
            }
        }
    }

    if end_row == height {
        let row_top = mask.row(height - 2);
        let row = mask.row(height - 1);

        if first_column == 0 {
            if row[0] != non_mask_value {
                outline.push(PixelPosition::new(0, height));
                outline.push(PixelPosition::new(outside, height - 1));
            } else if row[1] != non_mask_value || row_top[0] != non_mask_value {
                outline.push(PixelPosition::new(0, height - 1));
            }
        }

        for x in first_column.max(1)..end_column.min(width - 1) {
            let xi = x as usize;
            if row[xi] != non_mask_value {
                outline.push(PixelPosition::new(x, height));
            } else if row[xi - 1] != non_mask_value
                || row[xi + 1] != non_mask_value
                || row_top[xi] != non_mask_value
            {
                outline.push(PixelPosition::new(x, height - 1));
            }
        }

        if end_column == width {
            let xi = (width - 1) as usize;
            if row[xi] != non_mask_value {
                outline.push(PixelPosition::new(width - 1, height));
                outline.push(PixelPosition::new(width, height - 1));
            } else if row[xi - 1] != non_mask_value || row_top[xi] != non_mask_value {
                outline.push(PixelPosition::new(width - 1, height - 1));
            }
        }
    }

    outline
}

fn border_pixels_in_rows(
    mask: &Plane<u8>,
    non_mask_value: u8,
    first_column: u32,
    end_column: u32,
    first_row: u32,
    end_row: u32,
    neighborhood8: bool,
) -> PixelPositions {
    let width = mask.width();
    let height = mask.height();

    let mut border = PixelPositions::new();

    for y in first_row..end_row {
        let row = mask.row(y);

        for x in first_column..end_column {
            if row[x as usize] == non_mask_value {
                continue;
            }

            // frame-edge mask pixels always count as border pixels
            let is_border = x == 0
                || y == 0
                || x + 1 == width
                || y + 1 == height
                || row[(x - 1) as usize] == non_mask_value
                || row[(x + 1) as usize] == non_mask_value
                || mask.value(x, y - 1) == non_mask_value
                || mask.value(x, y + 1) == non_mask_value
                || (neighborhood8
                    && (mask.value(x - 1, y - 1) == non_mask_value
                        || mask.value(x + 1, y - 1) == non_mask_value
                        || mask.value(x - 1, y + 1) == non_mask_value
                        || mask.value(x + 1, y + 1) == non_mask_value));

            if is_border {
                border.push(PixelPosition::new(x, y));
            }
        }
    }

    border
}

/// Finds all mask pixels whose 4-neighborhood is not entirely mask,
/// including every mask pixel on the frame edge.
///
/// The scan shards its row range across `pool` when one is given.
pub fn find_border_pixels_4(
    mask: &Plane<u8>,
    non_mask_value: u8,
    bounding_box: Option<PixelBoundingBox>,
    pool: Option<&dyn WorkerPool>,
) -> PixelPositions {
    let (first_column, end_column, first_row, end_row) =
        window(bounding_box, mask.width(), mask.height());

    collect_sharded(
        pool,
        (end_row - first_row) as usize,
        MIN_ROWS_PER_CHUNK,
        &|range| {
            border_pixels_in_rows(
                mask,
                non_mask_value,
                first_column,
                end_column,
                first_row + range.start as u32,
                first_row + range.end as u32,
                false,
            )
        },
    )
}

/// Finds all mask pixels whose 8-neighborhood is not entirely mask,
/// including every mask pixel on the frame edge.
pub fn find_border_pixels_8(
    mask: &Plane<u8>,
    non_mask_value: u8,
    bounding_box: Option<PixelBoundingBox>,
    pool: Option<&dyn WorkerPool>,
) -> PixelPositions {
    let (first_column, end_column, first_row, end_row) =
        window(bounding_box, mask.width(), mask.height());

    collect_sharded(
        pool,
        (end_row - first_row) as usize,
        MIN_ROWS_PER_CHUNK,
        &|range| {
            border_pixels_in_rows(
                mask,
                non_mask_value,
                first_column,
                end_column,
                first_row + range.start as u32,
                first_row + range.end as u32,
                true,
            )
        },
    )
}

/// Finds all pixels whose in-frame 4-neighborhood is not uniformly equal to
/// their own value; works on arbitrary label frames, not just binary masks.
pub fn find_non_unique_pixels_4<T: PartialEq + Copy>(
    frame: &Plane<T>,
    bounding_box: Option<PixelBoundingBox>,
) -> PixelPositions {
    let width = frame.width();
    let height = frame.height();
    debug_assert!(width >= 2 && height >= 2);

    let (first_column, end_column, first_row, end_row) = window(bounding_box, width, height);

    let mut non_unique = PixelPositions::new();

    for y in first_row..end_row {
        let row = frame.row(y);

        for x in first_column..end_column {
            let value = row[x as usize];

            let differs = (x != 0 && row[(x - 1) as usize] != value)
                || (x + 1 < width && row[(x + 1) as usize] != value)
                || (y != 0 && frame.value(x, y - 1) != value)
                || (y + 1 < height && frame.value(x, y + 1) != value);

            if differs {
                non_unique.push(PixelPosition::new(x, y));
            }
        }
    }

    non_unique
}

/// Finds all pixels whose in-frame 8-neighborhood is not uniformly equal to
/// their own value.
pub fn find_non_unique_pixels_8<T: PartialEq + Copy>(
    frame: &Plane<T>,
    bounding_box: Option<PixelBoundingBox>,
) -> PixelPositions {
    let width = frame.width();
    let height = frame.height();
    debug_assert!(width >= 2 && height >= 2);

    let (first_column, end_column, first_row, end_row) = window(bounding_box, width, height);

    let mut non_unique = PixelPositions::new();

    for y in first_row..end_row {
        let row = frame.row(y);

        for x in first_column..end_column {
            let value = row[x as usize];

            let left = x != 0;
            let right = x + 1 < width;
            let top = y != 0;
            let bottom = y + 1 < height;

            let differs = (left && row[(x - 1) as usize] != value)
                || (right && row[(x + 1) as usize] != value)
                || (top && frame.value(x, y - 1) != value)
                || (bottom && frame.value(x, y + 1) != value)
                || (left && top && frame.value(x - 1, y - 1) != value)
                || (right && top && frame.value(x + 1, y - 1) != value)
                || (left && bottom && frame.value(x - 1, y + 1) != value)
                || (right && bottom && frame.value(x + 1, y + 1) != value);

            if differs {
                non_unique.push(PixelPosition::new(x, y));
            }
        }
    }

    non_unique
}

/// Counter-clockwise probe ring used by the contour walk.
const PROBE_RING: [PixelDirection; 8] = [
    PixelDirection::East,
    PixelDirection::NorthEast,
    PixelDirection::North,
    PixelDirection::NorthWest,
    PixelDirection::West,
    PixelDirection::SouthWest,
    PixelDirection::South,
    PixelDirection::SouthEast,
];

const fn ring_index(direction: PixelDirection) -> usize {
    match direction {
        PixelDirection::East => 0,
        PixelDirection::NorthEast => 1,
        PixelDirection::North => 2,
        PixelDirection::NorthWest => 3,
        PixelDirection::West => 4,
        PixelDirection::SouthWest => 5,
        PixelDirection::South => 6,
        PixelDirection::SouthEast => 7,
    }
}

/// Orders an unordered set of border/outline pixels into one closed,
/// leftmost-anchored contour ring by boundary walking.
///
/// The walk starts at the leftmost pixel (largest y on ties) heading south
/// and at every step probes the eight neighbors counter-clockwise, starting
/// one step past the direction it came from. Out-of-frame pixels (as emitted
/// by [`find_outline_4`] for frame-touching masks) may participate in the
/// walk but are never part of the returned ring.
///
/// Returns `None` when the walk dead-ends or loops without closing; in both
/// cases `remaining` (when requested) receives all input pixels that did not
/// become part of the walked ring, allowing further contours to be
/// extracted from the rest.
pub fn pixels_to_contour(
    pixels: &[PixelPosition],
    width: u32,
    height: u32,
    remaining: Option<&mut PixelPositions>,
) -> Option<PixelPositions> {
    debug_assert!(width != 0 && height != 0);

    let set: BTreeSet<PixelPosition> = pixels.iter().copied().collect();

    if set.is_empty() {
        if let Some(remaining_pixels) = remaining {
            remaining_pixels.clear();
        }
        return None;
    }

    if set.len() == 1 {
        if let Some(remaining_pixels) = remaining {
            remaining_pixels.clear();
        }
        return Some(pixels.to_vec());
    }

    let mut left = u32::MAX;
    let mut bottom = 0u32;
    let mut start = PixelPosition::invalid();

    for pixel in &set {
        if pixel.x() < left || (pixel.x() == left && pixel.y() > bottom) {
            left = pixel.x();
            bottom = pixel.y();
            start = *pixel;
        }
    }

    let mut walk: PixelPositions = Vec::with_capacity(set.len());
    walk.push(start);

    let mut direction = PixelDirection::South;
    let mut failed = false;

    loop {
        let last = walk[walk.len() - 1];

        if last == start && walk.len() > 1 {
            walk.pop();
            break;
        }

        if walk.len() > 3 * set.len() {
            failed = true;
            break;
        }

        let first_probe = ring_index(direction.reversed()) + 1;
        let mut advanced = false;

        for offset in 0..8 {
            let probe = PROBE_RING[(first_probe + offset) & 7];
            let neighbor = last.neighbor(probe);

            if set.contains(&neighbor) {
                walk.push(neighbor);
                direction = probe;
                advanced = true;
                break;
            }
        }

        if !advanced {
            failed = true;
            break;
        }
    }

    if let Some(remaining_pixels) = remaining {
        let mut rest = set;
        for pixel in &walk {
            if pixel.x() < width && pixel.y() < height {
                rest.remove(pixel);
            }
        }
        *remaining_pixels = rest.into_iter().collect();
    }

    if failed {
        return None;
    }

    Some(
        walk.into_iter()
            .filter(|pixel| pixel.x() < width && pixel.y() < height)
            .collect(),
    )
}

/// Whether the contour bounds a mask region from the outside.
///
/// Probes the pixel west of the contour's leftmost point: an outer contour
/// either touches the left frame edge or has non-mask to its west.
pub fn is_outer_contour(mask: &Plane<u8>, contour: &PixelContour, mask_value: u8) -> bool {
    let Some(index) = contour.index_left_position() else {
        return true;
    };

    let most_left = contour[index];
    debug_assert!(mask.contains(most_left.x(), most_left.y()));

    most_left.x() == 0 || mask.value(most_left.x() - 1, most_left.y()) != mask_value
}

/// Splits an unordered set of border/outline pixels into all contained
/// contours, classified into outer contours and inner (hole) contours via
/// [`is_outer_contour`].
pub fn pixels_to_contours(
    mask: &Plane<u8>,
    pixels: &[PixelPosition],
    mask_value: u8,
) -> (Vec<PixelContour>, Vec<PixelContour>) {
    let mut outer_contours = Vec::new();
    let mut inner_contours = Vec::new();

    let mut intermediate = pixels.to_vec();

    while !intermediate.is_empty() {
        let mut remaining = PixelPositions::new();
        let ring = pixels_to_contour(
            &intermediate,
            mask.width(),
            mask.height(),
            Some(&mut remaining),
        );

        if let Some(ring) = ring
            && !ring.is_empty()
        {
            let contour = PixelContour::from_pixels(ring);

            if is_outer_contour(mask, &contour, mask_value) {
                outer_contours.push(contour);
            } else {
                inner_contours.push(contour);
            }
        }

        if remaining.len() >= intermediate.len() {
            break;
        }

        intermediate = remaining;
    }

    (outer_contours, inner_contours)
}

/// One finalized connected mask region found by the row sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaskBlock {
    id: u32,
    position: PixelPosition,
    size: usize,
    bounding_box: PixelBoundingBox,
    border: bool,
}

impl MaskBlock {
    /// Id of this block, also stamped into the separation frame.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// A seed position inside the block.
    #[inline]
    #[must_use]
    pub fn position(&self) -> PixelPosition {
        self.position
    }

    /// Number of pixels covered by the block.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    #[must_use]
    pub fn bounding_box(&self) -> PixelBoundingBox {
        self.bounding_box
    }

    /// Whether the block touches the frame border.
    #[inline]
    #[must_use]
    pub fn border(&self) -> bool {
        self.border
    }
}

/// Open island state of the row sweep: the previous row's run segments
/// decide which runs of the current row still belong to this island.
struct SweepIsland {
    previous_segments: Vec<(u32, u32)>,
    current_segments: Vec<(u32, u32)>,
    /// All absorbed runs as `(row, start, end)`, end exclusive.
    runs: Vec<(u32, u32, u32)>,
    bounding_box: PixelBoundingBox,
    seed: PixelPosition,
    size: usize,
    border: bool,
}

impl SweepIsland {
    fn new(row: u32, start: u32, end: u32, width: u32, height: u32) -> Self {
        let mut island = Self {
            previous_segments: Vec::new(),
            current_segments: Vec::new(),
            runs: Vec::new(),
            bounding_box: PixelBoundingBox::default(),
            seed: PixelPosition::new(start, row),
            size: 0,
            border: false,
        };
        island.add_segment(row, start, end, width, height);
        island
    }

    fn has_intersection(&self, start: u32, end: u32, use_neighborhood_4: bool) -> bool {
        debug_assert!(start < end);

        self.previous_segments.iter().any(|&(previous_start, previous_end)| {
            if use_neighborhood_4 {
                start < previous_end && end > previous_start
            } else {
                start <= previous_end && end >= previous_start
            }
        })
    }

    fn add_segment(&mut self, row: u32, start: u32, end: u32, width: u32, height: u32) {
        debug_assert!(start < end);

        self.current_segments.push((start, end));
        self.runs.push((row, start, end));

        self.bounding_box += PixelPosition::new(start, row);
        self.bounding_box += PixelPosition::new(end - 1, row);

        self.size += (end - start) as usize;
        self.border |= row == 0 || row + 1 == height || start == 0 || end == width;
    }

    fn join(&mut self, other: SweepIsland) {
        self.previous_segments.extend(other.previous_segments);
        self.current_segments.extend(other.current_segments);
        self.runs.extend(other.runs);
        self.bounding_box += other.bounding_box;
        self.size += other.size;
        self.border |= other.border;
    }

    fn next_row(&mut self) {
        std::mem::swap(&mut self.previous_segments, &mut self.current_segments);
        self.current_segments.clear();
    }
}

/// Single top-to-bottom sweep over the frame, decomposing every row into
/// maximal runs of pixels accepted by `test` and merging runs into islands.
/// Returns the islands in finalization order.
fn sweep_islands(
    mask: &Plane<u8>,
    test: &dyn Fn(u8) -> bool,
    use_neighborhood_4: bool,
) -> Vec<SweepIsland> {
    let width = mask.width();
    let height = mask.height();

    let mut active: Vec<SweepIsland> = Vec::new();
    let mut finished: Vec<SweepIsland> = Vec::new();

    for y in 0..height {
        let row = mask.row(y);

        let mut x = 0u32;
        while x < width {
            if !test(row[x as usize]) {
                x += 1;
                continue;
            }

            let start = x;
            while x < width && test(row[x as usize]) {
                x += 1;
            }
            let end = x;

            let mut first_match: Option<usize> = None;
            let mut index = 0;

            while index < active.len() {
                if active[index].has_intersection(start, end, use_neighborhood_4) {
                    match first_match {
                        None => {
                            first_match = Some(index);
                            active[index].add_segment(y, start, end, width, height);
                            index += 1;
                        }
                        Some(first) => {
                            // a run bridging two islands joins them
                            let other = active.swap_remove(index);
                            active[first].join(other);
                        }
                    }
                } else {
                    index += 1;
                }
            }

            if first_match.is_none() {
                active.push(SweepIsland::new(y, start, end, width, height));
            }
        }

        let mut index = 0;
        while index < active.len() {
            if active[index].current_segments.is_empty() {
                finished.push(active.swap_remove(index));
            } else {
                active[index].next_row();
                index += 1;
            }
        }
    }

    finished.extend(active);
    finished
}

/// Partitions all pixels equal to `mask_value` into connected blocks and
/// stamps every pixel's block id into `separation`.
///
/// Pixels belonging to no block receive [`NO_SEPARATION_ID`]. Connectivity
/// follows `use_neighborhood_4` (orthogonal only) or the 8-neighborhood.
pub fn analyze_mask_separation_8bit(
    mask: &Plane<u8>,
    mask_value: u8,
    use_neighborhood_4: bool,
    separation: &mut PlaneMut<u32>,
) -> Vec<MaskBlock> {
    debug_assert!(mask.width() == separation.width() && mask.height() == separation.height());

    separation.fill(NO_SEPARATION_ID);

    let islands = sweep_islands(mask, &|value| value == mask_value, use_neighborhood_4);

    let mut blocks = Vec::with_capacity(islands.len());

    for (index, island) in islands.into_iter().enumerate() {
        let id = index as u32;

        for &(row, start, end) in &island.runs {
            separation.row_mut(row)[start as usize..end as usize].fill(id);
        }

        blocks.push(MaskBlock {
            id,
            position: island.seed,
            size: island.size,
            bounding_box: island.bounding_box,
            border: island.border,
        });
    }

    blocks
}

/// Counterpart of [`analyze_mask_separation_8bit`] for the pixels *not*
/// equal to `mask_value`, e.g. to find enclosed background regions.
pub fn analyze_non_mask_separation_8bit(
    mask: &Plane<u8>,
    mask_value: u8,
    use_neighborhood_4: bool,
    separation: &mut PlaneMut<u32>,
) -> Vec<MaskBlock> {
    debug_assert!(mask.width() == separation.width() && mask.height() == separation.height());

    separation.fill(NO_SEPARATION_ID);

    let islands = sweep_islands(mask, &|value| value != mask_value, use_neighborhood_4);

    let mut blocks = Vec::with_capacity(islands.len());

    for (index, island) in islands.into_iter().enumerate() {
        let id = index as u32;

        for &(row, start, end) in &island.runs {
            separation.row_mut(row)[start as usize..end as usize].fill(id);
        }

        blocks.push(MaskBlock {
            id,
            position: island.seed,
            size: island.size,
            bounding_box: island.bounding_box,
            border: island.border,
        });
    }

    blocks
}

/// Bounding boxes of all connected regions of pixels equal to `mask_value`,
/// using the same row-sweep island tracking as the separation analysis but
/// without producing an id frame.
pub fn detect_bounding_boxes(
    mask: &Plane<u8>,
    mask_value: u8,
    use_neighborhood_4: bool,
) -> Vec<PixelBoundingBox> {
    sweep_islands(mask, &|value| value == mask_value, use_neighborhood_4)
        .into_iter()
        .map(|island| island.bounding_box)
        .collect()
}

/// Two-pass chamfer distance transform with fixed-point step costs.
///
/// The scratch buffer carries a one pixel sentinel border so neither pass
/// needs bounds checks. `write` receives every pixel of the backward pass
/// with its final fixed-point distance.
fn chamfer_distance_transform(
    source: &Plane<u8>,
    reference_value: u8,
    cost_straight: u32,
    cost_diagonal: u32,
    write: &mut dyn FnMut(u32, u32, u32),
) -> bool {
    debug_assert!(cost_straight > 0 && cost_diagonal > 0);

    let width = source.width() as usize;
    let height = source.height() as usize;

    let buffer_width = width + 2;
    let buffer_height = height + 2;

    let mut buffer = vec![0u32; buffer_width * buffer_height];
    buffer[..buffer_width].fill(DISTANCE_BOUNDARY);
    buffer[(buffer_height - 1) * buffer_width..].fill(DISTANCE_BOUNDARY);

    let mut found_reference = false;

    // forward pass, folding in the four causal neighbors
    for y in 0..height {
        let source_row = source.row(y as u32);
        let base = (y + 1) * buffer_width;

        buffer[base] = DISTANCE_BOUNDARY;
        buffer[base + buffer_width - 1] = DISTANCE_BOUNDARY;

        for x in 0..width {
            let index = base + 1 + x;

            if source_row[x] == reference_value {
                buffer[index] = 0;
                found_reference = true;
            } else {
                let above = index - buffer_width;
                buffer[index] = (buffer[above - 1] + cost_diagonal)
                    .min(buffer[above] + cost_straight)
                    .min(buffer[above + 1] + cost_diagonal)
                    .min(buffer[index - 1] + cost_straight);
            }
        }
    }

    if !found_reference {
        return false;
    }

    // backward pass, folding in the remaining four neighbors
    for y in (0..height).rev() {
        let base = (y + 1) * buffer_width;

        for x in (0..width).rev() {
            let index = base + 1 + x;
            let below = index + buffer_width;

            let distance = buffer[index]
                .min(buffer[index + 1] + cost_straight)
                .min(buffer[below - 1] + cost_diagonal)
                .min(buffer[below] + cost_straight)
                .min(buffer[below + 1] + cost_diagonal);

            buffer[index] = distance;
            write(x as u32, y as u32, distance);
        }
    }

    true
}

/// Chessboard (Chebyshev) distance to the closest pixel equal to
/// `reference_value`; returns `false` if the source holds no such pixel.
pub fn compute_chessboard_distance_transform_8bit(
    source: &Plane<u8>,
    reference_value: u8,
    target: &mut PlaneMut<u32>,
) -> bool {
    debug_assert!(source.width() == target.width() && source.height() == target.height());

    chamfer_distance_transform(source, reference_value, 1, 1, &mut |x, y, distance| {
        target.set(x, y, distance);
    })
}

/// Manhattan distance to the closest pixel equal to `reference_value`;
/// returns `false` if the source holds no such pixel.
pub fn compute_l1_distance_transform_8bit(
    source: &Plane<u8>,
    reference_value: u8,
    target: &mut PlaneMut<u32>,
) -> bool {
    debug_assert!(source.width() == target.width() && source.height() == target.height());

    chamfer_distance_transform(source, reference_value, 1, 2, &mut |x, y, distance| {
        target.set(x, y, distance);
    })
}

/// Approximated euclidean distance to the closest pixel equal to
/// `reference_value`, using the 0.95509/1.3693 chamfer step costs in 16 bit
/// fixed point; returns `false` if the source holds no such pixel.
pub fn compute_l2_distance_transform_8bit(
    source: &Plane<u8>,
    reference_value: u8,
    target: &mut PlaneMut<f32>,
) -> bool {
    debug_assert!(source.width() == target.width() && source.height() == target.height());

    let scale = (1u32 << 16) as f32;
    let cost_straight = (0.95509_f32 * scale) as u32;
    let cost_diagonal = (1.3693_f32 * scale) as u32;

    chamfer_distance_transform(
        source,
        reference_value,
        cost_straight,
        cost_diagonal,
        &mut |x, y, distance| {
            target.set(x, y, distance as f32 / scale);
        },
    )
}

fn distance_stamps_in_row(
    mask: &Plane<u8>,
    y: u32,
    first_column: u32,
    number_columns: u32,
    search_value: u8,
    result_value: u8,
    stamps: &mut Vec<(PixelPosition, u8)>,
) {
    let width = mask.width();
    let height = mask.height();
    let row = mask.row(y);

    // frame-edge mask pixels are one step from the border by definition
    if y == 0 || y + 1 == height {
        for x in first_column..first_column + number_columns {
            if row[x as usize] == 0x00 {
                stamps.push((PixelPosition::new(x, y), 1));
            }
        }
        return;
    }

    if first_column == 0 && row[0] == 0x00 {
        stamps.push((PixelPosition::new(0, y), 1));
    }

    let x_begin = first_column.max(1);
    let x_end = (first_column + number_columns).min(width - 1);

    let row_top = mask.row(y - 1);
    let row_bottom = mask.row(y + 1);

    for x in x_begin..x_end {
        let xi = x as usize;

        if row[xi] == 0x00
            && (row[xi - 1] == search_value
                || row[xi + 1] == search_value
                || row_top[xi - 1] == search_value
                || row_top[xi] == search_value
                || row_top[xi + 1] == search_value
                || row_bottom[xi - 1] == search_value
                || row_bottom[xi] == search_value
                || row_bottom[xi + 1] == search_value)
        {
            stamps.push((PixelPosition::new(x, y), result_value));
        }
    }

    if first_column + number_columns == width && row[(width - 1) as usize] == 0x00 {
        stamps.push((PixelPosition::new(width - 1, y), 1));
    }
}

/// Stamps every mask pixel (`0x00`) with its distance to the mask border,
/// growing inward one 8-connected ring per iteration.
///
/// The mask must hold only `0x00` (mask) and `0xFF` (non-mask) values.
/// Iteration `n` assigns `n + 1` to mask pixels touching a pixel of the
/// previous ring value, so after `iterations` passes the outermost ring
/// carries `1` and deeper pixels up to `iterations`. With `assign_final`
/// every still-unassigned mask pixel afterwards receives `iterations` as its
/// minimal known distance. At most 254 iterations are possible.
pub fn determine_distances_to_border_8bit(
    mask: &mut PlaneMut<u8>,
    iterations: u8,
    assign_final: bool,
    bounding_box: Option<PixelBoundingBox>,
    pool: Option<&dyn WorkerPool>,
) {
    let width = mask.width();
    let height = mask.height();
    debug_assert!(width >= 3 && height >= 3);
    debug_assert!(iterations <= 254);

    let (mut first_column, end_column, mut first_row, end_row) =
        window(bounding_box, width, height);
    let mut number_columns = end_column - first_column;
    let mut number_rows = end_row - first_row;

    for n in 0..iterations {
        let search_value = if n == 0 { 0xFF } else { n };
        let result_value = n + 1;

        let stamps = {
            let plane = mask.as_plane();
            let window_column = first_column;
            let window_row = first_row;
            let window_columns = number_columns;

            collect_sharded(pool, number_rows as usize, MIN_ROWS_PER_CHUNK, &|range| {
                let mut chunk = Vec::new();
                for row_offset in range {
                    distance_stamps_in_row(
                        &plane,
                        window_row + row_offset as u32,
                        window_column,
                        window_columns,
                        search_value,
                        result_value,
                        &mut chunk,
                    );
                }
                chunk
            })
        };

        for (position, value) in stamps {
            mask.set(position.x(), position.y(), value);
        }

        // every following ring lies strictly inside the previous one
        if n > 0 {
            if number_columns <= 2 || number_rows <= 2 {
                break;
            }

            first_column += 1;
            first_row += 1;
            number_columns -= 2;
            number_rows -= 2;
        }
    }

    if assign_final {
        for y in 0..height {
            for value in mask.row_mut(y) {
                if *value == 0x00 {
                    *value = iterations;
                }
            }
        }
    }
}

/// Number of pixels not equal to `non_mask_value`, optionally windowed.
pub fn count_mask_pixels(
    mask: &Plane<u8>,
    non_mask_value: u8,
    bounding_box: Option<PixelBoundingBox>,
) -> usize {
    let (first_column, end_column, first_row, end_row) =
        window(bounding_box, mask.width(), mask.height());

    let mut count = 0;

    for y in first_row..end_row {
        count += mask.row(y)[first_column as usize..end_column as usize]
            .iter()
            .filter(|&&value| value != non_mask_value)
            .count();
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::RayonPool;

    const MASK: u8 = 0x00;
    const NON_MASK: u8 = 0xFF;

    /// Builds a tightly packed mask buffer from rows of `#` (mask, `0x00`)
    /// and `.` (non-mask, `0xFF`).
    fn mask_buffer(rows: &[&str]) -> (Vec<u8>, u32, u32) {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let data = rows
            .iter()
            .flat_map(|row| {
                debug_assert_eq!(row.len() as u32, width);
                row.bytes().map(|b| if b == b'#' { MASK } else { NON_MASK })
            })
            .collect();
        (data, width, height)
    }

    fn positions(coordinates: &[(u32, u32)]) -> PixelPositions {
        coordinates
            .iter()
            .map(|&(x, y)| PixelPosition::new(x, y))
            .collect()
    }

    fn sorted(mut pixels: PixelPositions) -> PixelPositions {
        pixels.sort();
        pixels
    }

    #[test]
    fn neighbor_predicates() {
        let (data, width, height) = mask_buffer(&[
            "...", //
            ".#.",
            "...",
        ]);
        let plane = Plane::new(&data, width, height, 0);

        // equality tests against the mask value
        assert!(has_mask_neighbor_4::<true, u8>(&plane, PixelPosition::new(1, 0), MASK));
        assert!(!has_mask_neighbor_4::<true, u8>(&plane, PixelPosition::new(0, 0), MASK));
        assert!(has_mask_neighbor_8::<true, u8>(&plane, PixelPosition::new(0, 0), MASK));
        assert!(!has_mask_neighbor_4::<true, u8>(&plane, PixelPosition::new(1, 1), MASK));
        assert!(has_mask_neighbor_5::<true, u8>(&plane, PixelPosition::new(1, 1), MASK));
        assert!(has_mask_neighbor_9::<true, u8>(&plane, PixelPosition::new(2, 2), MASK));
        assert!(!has_mask_neighbor_8::<true, u8>(&plane, PixelPosition::new(1, 1), MASK));

        // inequality tests
        assert!(has_mask_neighbor_4::<false, u8>(&plane, PixelPosition::new(0, 1), NON_MASK));
        assert!(!has_mask_neighbor_4::<false, u8>(&plane, PixelPosition::new(1, 1), NON_MASK));
        assert!(has_mask_neighbor_8::<false, u8>(&plane, PixelPosition::new(1, 1), MASK));
    }

    #[test]
    fn outline_and_border_of_centered_square() {
        let (data, width, height) = mask_buffer(&[
            "..........",
            "..........",
            "..........",
            "...####...",
            "...####...",
            "...####...",
            "...####...",
            "..........",
            "..........",
            "..........",
        ]);
        let plane = Plane::new(&data, width, height, 0);

        let border = sorted(find_border_pixels_4(&plane, NON_MASK, None, None));

        // the 12 perimeter pixels of the 4x4 square; its 2x2 interior is
        // surrounded by mask on all four sides
        let expected_border = positions(&[
            (3, 3),
            (4, 3),
            (5, 3),
            (6, 3),
            (3, 4),
            (6, 4),
            (3, 5),
            (6, 5),
            (3, 6),
            (4, 6),
            (5, 6),
            (6, 6),
        ]);
        assert_eq!(border, sorted(expected_border));

        let outline = sorted(find_outline_4(&plane, NON_MASK, None));

        // the 16 non-mask pixels orthogonally adjacent to the square's
        // edges; diagonal corners are not 4-adjacent
        let expected_outline = positions(&[
            (3, 2),
            (4, 2),
            (5, 2),
            (6, 2),
            (2, 3),
            (7, 3),
            (2, 4),
            (7, 4),
            (2, 5),
            (7, 5),
            (2, 6),
            (7, 6),
            (3, 7),
            (4, 7),
            (5, 7),
            (6, 7),
        ]);
        assert_eq!(outline, sorted(expected_outline));

        // sharded execution returns the identical set
        let pool = RayonPool::new();
        assert_eq!(
            sorted(find_border_pixels_4(&plane, NON_MASK, None, Some(&pool))),
            border
        );
    }

    #[test]
    fn border_pixels_8_see_diagonal_neighbors() {
        let (data, width, height) = mask_buffer(&[
            ".....",
            ".###.",
            ".###.",
            ".###.",
            ".....",
        ]);
        let plane = Plane::new(&data, width, height, 0);

        // the center pixel (2,2) has non-mask diagonally at distance 2 only,
        // so even the 8-test keeps it interior
        let border8 = find_border_pixels_8(&plane, NON_MASK, None, None);
        assert_eq!(border8.len(), 8);
        assert!(!border8.contains(&PixelPosition::new(2, 2)));

        // 4-border of the 3x3 block is also its full one pixel perimeter
        let border4 = find_border_pixels_4(&plane, NON_MASK, None, None);
        assert_eq!(sorted(border4), sorted(border8));
    }

    #[test]
    fn frame_edge_mask_pixels_are_border_and_emit_outside_outline() {
        let (data, width, height) = mask_buffer(&[
            "##..",
            "##..",
            "....",
        ]);
        let plane = Plane::new(&data, width, height, 0);

        let border = find_border_pixels_4(&plane, NON_MASK, None, None);
        assert_eq!(border.len(), 4);

        let outline = find_outline_4(&plane, NON_MASK, None);
        let outside = 0u32.wrapping_sub(1);

        assert!(outline.contains(&PixelPosition::new(0, outside)));
        assert!(outline.contains(&PixelPosition::new(1, outside)));
        assert!(outline.contains(&PixelPosition::new(outside, 0)));
        assert!(outline.contains(&PixelPosition::new(outside, 1)));
        assert!(outline.contains(&PixelPosition::new(2, 0)));
        assert!(outline.contains(&PixelPosition::new(2, 1)));
        assert!(outline.contains(&PixelPosition::new(0, 2)));
        assert!(outline.contains(&PixelPosition::new(1, 2)));
    }

    #[test]
    fn non_unique_pixels_on_label_frame() {
        let data: Vec<u8> = vec![
            7, 7, 7, 7, //
            7, 7, 3, 3, //
            7, 7, 3, 3,
        ];
        let plane = Plane::new(&data, 4, 3, 0);

        let non_unique4 = sorted(find_non_unique_pixels_4(&plane, None));
        assert_eq!(
            non_unique4,
            sorted(positions(&[
                (2, 0),
                (3, 0),
                (1, 1),
                (2, 1),
                (3, 1),
                (1, 2),
                (2, 2),
            ]))
        );

        // the 8-variant additionally flags the diagonal contact at (1,0)
        let non_unique8 = sorted(find_non_unique_pixels_8(&plane, None));
        assert!(non_unique8.contains(&PixelPosition::new(1, 0)));
        assert_eq!(non_unique8.len(), non_unique4.len() + 1);
    }

    #[test]
    fn contour_walk_traces_the_square_perimeter() {
        // all 16 pixels of the 4x4 block from the square fixture
        let mut pixels = PixelPositions::new();
        for y in 3..7 {
            for x in 3..7 {
                pixels.push(PixelPosition::new(x, y));
            }
        }

        let mut remaining = PixelPositions::new();
        let ring = pixels_to_contour(&pixels, 10, 10, Some(&mut remaining))
            .expect("the block perimeter is walkable");

        // leftmost start with largest y, then counter-clockwise around the
        // perimeter; the 2x2 interior is left over
        let expected = positions(&[
            (3, 6),
            (4, 6),
            (5, 6),
            (6, 6),
            (6, 5),
            (6, 4),
            (6, 3),
            (5, 3),
            (4, 3),
            (3, 3),
            (3, 4),
            (3, 5),
        ]);
        assert_eq!(ring, expected);

        assert_eq!(
            sorted(remaining),
            sorted(positions(&[(4, 4), (5, 4), (4, 5), (5, 5)]))
        );
    }

    #[test]
    fn single_pixel_and_empty_input() {
        let single = positions(&[(4, 2)]);
        let mut remaining = positions(&[(9, 9)]);

        let ring = pixels_to_contour(&single, 8, 8, Some(&mut remaining)).unwrap();
        assert_eq!(ring, single);
        assert!(remaining.is_empty());

        assert!(pixels_to_contour(&[], 8, 8, None).is_none());
    }

    #[test]
    fn contours_classify_outer_ring_and_hole() {
        let (data, width, height) = mask_buffer(&[
            ".......",
            ".#####.",
            ".#####.",
            ".##.##.",
            ".#####.",
            ".#####.",
            ".......",
        ]);
        let plane = Plane::new(&data, width, height, 0);

        let border = find_border_pixels_4(&plane, NON_MASK, None, None);
        assert_eq!(border.len(), 20);

        let (outer, inner) = pixels_to_contours(&plane, &border, MASK);

        assert_eq!(outer.len(), 1);
        assert_eq!(inner.len(), 1);
        assert_eq!(outer[0].len(), 16);
        assert_eq!(inner[0].len(), 4);

        assert!(is_outer_contour(&plane, &outer[0], MASK));
        assert!(!is_outer_contour(&plane, &inner[0], MASK));
    }

    #[test]
    fn separation_depends_on_connectivity() {
        let (data, width, height) = mask_buffer(&[
            "#...",
            ".#..",
            "..#.",
            "....",
        ]);
        let plane = Plane::new(&data, width, height, 0);

        let mut labels = vec![0u32; (width * height) as usize];

        let mut separation = PlaneMut::new(&mut labels, width, height, 0);
        let blocks4 = analyze_mask_separation_8bit(&plane, MASK, true, &mut separation);
        assert_eq!(blocks4.len(), 3);
        assert_ne!(separation.value(0, 0), separation.value(1, 1));
        assert_eq!(separation.value(1, 0), NO_SEPARATION_ID);

        let mut separation = PlaneMut::new(&mut labels, width, height, 0);
        let blocks8 = analyze_mask_separation_8bit(&plane, MASK, false, &mut separation);
        assert_eq!(blocks8.len(), 1);
        assert_eq!(separation.value(0, 0), separation.value(1, 1));
        assert_eq!(separation.value(0, 0), separation.value(2, 2));
        assert_eq!(blocks8[0].size(), 3);
        assert!(blocks8[0].border());
        assert_eq!(blocks8[0].bounding_box(), PixelBoundingBox::new(0, 0, 2, 2));

        let total: usize = blocks4.iter().map(MaskBlock::size).sum();
        assert_eq!(total, count_mask_pixels(&plane, NON_MASK, None));
    }

    #[test]
    fn bridging_run_joins_two_open_islands() {
        let (data, width, height) = mask_buffer(&[
            "#.#",
            "#.#",
            "###",
        ]);
        let plane = Plane::new(&data, width, height, 0);

        let mut labels = vec![0u32; (width * height) as usize];
        let mut separation = PlaneMut::new(&mut labels, width, height, 0);

        let blocks = analyze_mask_separation_8bit(&plane, MASK, true, &mut separation);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].size(), 7);
        assert_eq!(separation.value(0, 0), separation.value(2, 0));

        let boxes = detect_bounding_boxes(&plane, MASK, true);
        assert_eq!(boxes, vec![PixelBoundingBox::new(0, 0, 2, 2)]);
    }

    #[test]
    fn non_mask_separation_finds_enclosed_background() {
        let (data, width, height) = mask_buffer(&[
            "#####",
            "#...#",
            "#.#.#",
            "#...#",
            "#####",
        ]);
        let plane = Plane::new(&data, width, height, 0);

        let mut labels = vec![0u32; (width * height) as usize];
        let mut separation = PlaneMut::new(&mut labels, width, height, 0);

        let blocks = analyze_non_mask_separation_8bit(&plane, MASK, true, &mut separation);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].size(), 8);
        assert!(!blocks[0].border());
    }

    #[test]
    fn detect_bounding_boxes_separates_distant_regions() {
        let (data, width, height) = mask_buffer(&[
            "##....",
            "##....",
            "......",
            "....##",
            "....##",
        ]);
        let plane = Plane::new(&data, width, height, 0);

        let mut boxes = detect_bounding_boxes(&plane, MASK, false);
        boxes.sort_by_key(PixelBoundingBox::top);

        assert_eq!(
            boxes,
            vec![
                PixelBoundingBox::new(0, 0, 1, 1),
                PixelBoundingBox::new(4, 3, 5, 4),
            ]
        );
    }

    fn brute_force_distances<F: Fn(u64, u64) -> u64>(
        references: &[(u32, u32)],
        width: u32,
        height: u32,
        metric: F,
    ) -> Vec<u64> {
        let mut distances = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let distance = references
                    .iter()
                    .map(|&(rx, ry)| {
                        metric(
                            (x as i64 - rx as i64).unsigned_abs(),
                            (y as i64 - ry as i64).unsigned_abs(),
                        )
                    })
                    .min()
                    .unwrap();
                distances.push(distance);
            }
        }
        distances
    }

    #[test]
    fn chessboard_and_l1_transforms_match_brute_force() {
        let width = 11u32;
        let height = 7u32;
        let references = [(2u32, 3u32), (9u32, 1u32)];

        let mut source = vec![NON_MASK; (width * height) as usize];
        for &(x, y) in &references {
            source[(y * width + x) as usize] = MASK;
        }
        let plane = Plane::new(&source, width, height, 0);

        let mut target = vec![0u32; (width * height) as usize];

        let mut target_plane = PlaneMut::new(&mut target, width, height, 0);
        assert!(compute_chessboard_distance_transform_8bit(&plane, MASK, &mut target_plane));
        let chebyshev = brute_force_distances(&references, width, height, |dx, dy| dx.max(dy));
        for (index, &expected) in chebyshev.iter().enumerate() {
            assert_eq!(target[index] as u64, expected);
        }

        let mut target_plane = PlaneMut::new(&mut target, width, height, 0);
        assert!(compute_l1_distance_transform_8bit(&plane, MASK, &mut target_plane));
        let manhattan = brute_force_distances(&references, width, height, |dx, dy| dx + dy);
        for (index, &expected) in manhattan.iter().enumerate() {
            assert_eq!(target[index] as u64, expected);
        }
    }

    #[test]
    fn l2_transform_approximates_euclidean_distance() {
        let width = 9u32;
        let height = 9u32;

        let mut source = vec![NON_MASK; (width * height) as usize];
        source[(4 * width + 4) as usize] = MASK;
        let plane = Plane::new(&source, width, height, 0);

        let mut target = vec![0f32; (width * height) as usize];
        let mut target_plane = PlaneMut::new(&mut target, width, height, 0);
        assert!(compute_l2_distance_transform_8bit(&plane, MASK, &mut target_plane));

        assert_eq!(target[(4 * width + 4) as usize], 0.0);
        assert!((target[(4 * width + 5) as usize] - 0.95509).abs() < 1e-4);
        assert!((target[(5 * width + 5) as usize] - 1.3693).abs() < 1e-4);

        // distances never decrease along a straight ray away from the seed
        for x in 5..width as usize {
            assert!(target[4 * width as usize + x] >= target[4 * width as usize + x - 1]);
        }
    }

    #[test]
    fn distance_transform_without_reference_fails() {
        let source = vec![NON_MASK; 16];
        let plane = Plane::new(&source, 4, 4, 0);

        let mut target = vec![0u32; 16];
        let mut target_plane = PlaneMut::new(&mut target, 4, 4, 0);
        assert!(!compute_chessboard_distance_transform_8bit(&plane, MASK, &mut target_plane));
    }

    #[test]
    fn distances_to_border_grow_inward() {
        let (mut data, width, height) = mask_buffer(&[
            "..........",
            "..........",
            "..........",
            "...####...",
            "...####...",
            "...####...",
            "...####...",
            "..........",
            "..........",
            "..........",
        ]);

        let mut mask = PlaneMut::new(&mut data, width, height, 0);
        determine_distances_to_border_8bit(&mut mask, 3, false, None, None);

        // block perimeter at distance 1, the 2x2 interior at distance 2
        for y in 3..7u32 {
            for x in 3..7u32 {
                let interior = (4..6).contains(&x) && (4..6).contains(&y);
                assert_eq!(mask.value(x, y), if interior { 2 } else { 1 });
            }
        }
        assert_eq!(mask.value(0, 0), NON_MASK);
    }

    #[test]
    fn assign_final_labels_unreached_mask_pixels() {
        let (mut data, width, height) = mask_buffer(&[
            ".......",
            ".#####.",
            ".#####.",
            ".#####.",
            ".#####.",
            ".#####.",
            ".......",
        ]);

        let mut mask = PlaneMut::new(&mut data, width, height, 0);
        determine_distances_to_border_8bit(&mut mask, 2, true, None, None);

        // the 3x3 core only reaches distance 2 via the final assignment
        assert_eq!(mask.value(1, 1), 1);
        assert_eq!(mask.value(3, 3), 2);
        assert!(!data.contains(&0x00));
    }

    #[test]
    fn count_mask_pixels_windowed() {
        let (data, width, height) = mask_buffer(&[
            "##..",
            "##..",
            "...#",
        ]);
        let plane = Plane::new(&data, width, height, 0);

        assert_eq!(count_mask_pixels(&plane, NON_MASK, None), 5);
        assert_eq!(
            count_mask_pixels(&plane, NON_MASK, Some(PixelBoundingBox::new(0, 0, 1, 1))),
            4
        );
        assert_eq!(
            count_mask_pixels(&plane, NON_MASK, Some(PixelBoundingBox::new(2, 0, 3, 1))),
            0
        );
    }
}
