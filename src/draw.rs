//! Overlay drawing of contours and bounding boxes.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::bounding_box::PixelBoundingBox;
use crate::contour::PixelContour;

/// Renders an overlay image of the implementing shape.
pub trait DrawOverlay {
    fn draw(&self, width: u32, height: u32) -> RgbaImage;
}

/// Draws the contour ring (wrap edge included) into the image.
pub fn draw_contour_mut(image: &mut RgbaImage, contour: &PixelContour, color: Rgba<u8>) {
    let pixels = contour.pixels();
    if pixels.is_empty() {
        return;
    }

    for n in 0..pixels.len() {
        let start = pixels[n];
        let end = pixels[(n + 1) % pixels.len()];
        draw_line_segment_mut(
            image,
            (start.x() as f32, start.y() as f32),
            (end.x() as f32, end.y() as f32),
            color,
        );
    }
}

/// Draws the bounding box outline into the image.
pub fn draw_bounding_box_mut(image: &mut RgbaImage, bounding_box: &PixelBoundingBox, color: Rgba<u8>) {
    if !bounding_box.is_valid() {
        return;
    }

    let rect = Rect::at(bounding_box.left() as i32, bounding_box.top() as i32)
        .of_size(bounding_box.width(), bounding_box.height());
    draw_hollow_rect_mut(image, rect, color);
}

impl DrawOverlay for PixelContour {
    fn draw(&self, width: u32, height: u32) -> RgbaImage {
        let mut image = RgbaImage::new(width, height);
        draw_contour_mut(&mut image, self, Rgba([255, 0, 0, 255]));
        image
    }
}

impl DrawOverlay for PixelBoundingBox {
    fn draw(&self, width: u32, height: u32) -> RgbaImage {
        let mut image = RgbaImage::new(width, height);
        draw_bounding_box_mut(&mut image, self, Rgba([0, 0, 255, 255]));
        image
    }
}
