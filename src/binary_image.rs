use bit_vec::BitVec;
use image::GrayImage;
use num_traits::Zero;

use crate::error::Error;
use crate::plane::Plane;

/// Owned, bit-packed binary mask.
///
/// Bridges `image` buffers and the byte-valued mask planes the analyzer and
/// creator operate on: a set bit is a mask pixel, a cleared bit background.
#[derive(Debug, Clone, Default)]
pub struct BinaryImage {
    width: u32,
    height: u32,
    buffer: BitVec,
}

impl BinaryImage {
    /// All-background image of the given dimensions.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            buffer: BitVec::from_elem((width * height) as usize, false),
        }
    }

    /// Packs a raw interleaved buffer; a pixel is a mask pixel when all of
    /// its channels are nonzero. The channel count is derived from the
    /// buffer length.
    pub fn from_raw<T>(width: u32, height: u32, buffer: &[T]) -> Result<Self, Error>
    where
        T: Zero,
    {
        let image_size = (width * height) as usize;
        if image_size == 0 || buffer.len() < image_size {
            return Err(Error::BufferTooSmall {
                expected: image_size.max(1),
                actual: buffer.len(),
            });
        }

        let channels = buffer.len() / image_size;
        Ok(Self {
            width,
            height,
            buffer: buffer
                .chunks(channels)
                .take(image_size)
                .map(|pixel| !pixel.iter().any(Zero::is_zero))
                .collect(),
        })
    }

    /// Packs a gray image; only full-white pixels become mask pixels.
    #[must_use]
    pub fn from_gray(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            buffer: image.iter().map(|&value| value == 255).collect(),
        }
    }

    /// Packs a byte mask plane; every pixel not holding `non_mask_value`
    /// becomes a mask pixel.
    #[must_use]
    pub fn from_mask_plane(plane: &Plane<u8>, non_mask_value: u8) -> Self {
        let mut buffer = BitVec::from_elem((plane.width() * plane.height()) as usize, false);

        for y in 0..plane.height() {
            let row = plane.row(y);
            let offset = (y * plane.width()) as usize;
            for (x, &value) in row.iter().enumerate() {
                if value != non_mask_value {
                    buffer.set(offset + x, true);
                }
            }
        }

        Self {
            width: plane.width(),
            height: plane.height(),
            buffer,
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        debug_assert!(x < self.width && y < self.height);
        self.buffer.get((y * self.width + x) as usize).unwrap_or(false)
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        debug_assert!(x < self.width && y < self.height);
        self.buffer.set((y * self.width + x) as usize, value);
    }

    /// Unpacks into an unpadded row-major byte buffer suitable for
    /// [`Plane`]/[`crate::plane::PlaneMut`] views.
    #[must_use]
    pub fn to_mask_buffer(&self, mask_value: u8, non_mask_value: u8) -> Vec<u8> {
        self.buffer
            .iter()
            .take((self.width * self.height) as usize)
            .map(|bit| if bit { mask_value } else { non_mask_value })
            .collect()
    }

    /// Unpacks into a gray image, mask pixels white.
    #[must_use]
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            image::Luma([if self.get(x, y) { 255 } else { 0 }])
        })
    }
}
