pub mod analyzer;
mod binary_image;
mod bounding_box;
mod contour;
pub mod creator;
pub mod draw;
mod error;
mod pixel;
mod plane;
pub mod triangulation;
pub mod worker;

pub use crate::binary_image::BinaryImage;
pub use crate::bounding_box::{PixelBoundingBox, PixelBoundingBoxI, PixelBoundingBoxT};
pub use crate::contour::PixelContour;
pub use crate::error::Error;
pub use crate::pixel::{
    Coord, PixelDirection, PixelPosition, PixelPositionI, PixelPositionT, PixelPositions,
    RoughPixelDirection,
};
pub use crate::plane::{Plane, PlaneMut};
