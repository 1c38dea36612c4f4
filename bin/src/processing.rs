use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use geo::Simplify;
use image::{DynamicImage, GrayImage, Rgba};
use perigram::analyzer::{
    analyze_mask_separation_8bit, compute_chessboard_distance_transform_8bit,
    compute_l1_distance_transform_8bit, compute_l2_distance_transform_8bit, find_border_pixels_4,
    pixels_to_contours, MaskBlock,
};
use perigram::creator::{
    contour_to_inclusive_mask_by_triangulation, dense_contour_to_inclusive_mask, smooth_mask,
};
use perigram::draw::{draw_bounding_box_mut, draw_contour_mut};
use perigram::worker::{RayonPool, WorkerPool};
use perigram::{BinaryImage, PixelContour, Plane, PlaneMut};
use serde::Serialize;

use crate::config::{Config, DistanceMetric, MaskMethod};

/// Mask pixel value inside the 8-bit mask planes.
const MASK: u8 = 0x00;
/// Background pixel value inside the 8-bit mask planes.
const NON_MASK: u8 = 0xFF;

pub(crate) struct FileOutcome {
    pub contours: usize,
    pub blocks: usize,
}

#[derive(Serialize)]
struct BlockRecord {
    id: u32,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    size: usize,
    on_frame_border: bool,
}

#[derive(Serialize)]
struct ContourRecord {
    outer: bool,
    area: u64,
    points: Vec<[f64; 2]>,
}

pub(crate) struct Processor {
    config: Config,
    pool: Option<RayonPool>,
}

impl Processor {
    pub(crate) fn new(config: Config, pool: Option<RayonPool>) -> Self {
        Processor { config, pool }
    }

    fn pool(&self) -> Option<&dyn WorkerPool> {
        self.pool.as_ref().map(|pool| pool as &dyn WorkerPool)
    }

    pub(crate) fn process(&self, input: &PathBuf, mask: Option<&Path>) -> Result<FileOutcome> {
        let verbose = self.config.processing.verbose;
        let skip_intermediates = self.config.output.skip_intermediates;

        let image = image::open(input)
            .with_context(|| format!("failed to open input image {}", input.display()))?;

        let width = image.width();
        let height = image.height();
        ensure!(width >= 2 && height >= 2, "input image must be at least 2x2 pixels");

        let asset_name = input
            .file_stem()
            .context("invalid input filename")?
            .to_string_lossy()
            .into_owned();

        if verbose {
            println!("Processing: {} ({}x{} pixels)", input.display(), width, height);
        }

        // Create or load the binary mask
        let binary = if let Some(mask_path) = mask {
            if verbose {
                println!("Loading mask from: {}", mask_path.display());
            }
            let mask_image = image::open(mask_path)
                .with_context(|| format!("failed to open mask image {}", mask_path.display()))?;
            ensure!(
                mask_image.width() == width && mask_image.height() == height,
                "mask dimensions {}x{} do not match image dimensions {}x{}",
                mask_image.width(),
                mask_image.height(),
                width,
                height
            );
            BinaryImage::from_gray(&mask_image.to_luma8())
        } else {
            if verbose {
                println!("Generating mask using {:?} method", self.config.processing.mask_method);
            }
            Self::generate_binary_mask(&image, self.config.processing.mask_method, self.config.processing.threshold)?
        };

        let output_dir = self.config.output.output_folder.to_path_buf();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;

        let mask_buffer = binary.to_mask_buffer(MASK, NON_MASK);
        let mask_plane = Plane::new(&mask_buffer, width, height, 0);

        if !skip_intermediates {
            let mask_path = output_dir.join(format!("{}_mask.png", asset_name));
            binary
                .to_gray_image()
                .save(&mask_path)
                .with_context(|| format!("failed to save mask {}", mask_path.display()))?;
        }

        // Connected components
        let mut labels = vec![0u32; width as usize * height as usize];
        let mut separation = PlaneMut::new(&mut labels, width, height, 0);
        let blocks: Vec<MaskBlock> =
            analyze_mask_separation_8bit(&mask_plane, MASK, self.config.processing.four_connected, &mut separation)
                .into_iter()
                .filter(|block| block.size() >= self.config.processing.min_block_size)
                .collect();

        if verbose {
            println!("Found {} mask components for {}", blocks.len(), asset_name);
        }

        let block_records: Vec<BlockRecord> = blocks
            .iter()
            .map(|block| {
                let bounding_box = block.bounding_box();
                BlockRecord {
                    id: block.id(),
                    x: bounding_box.left(),
                    y: bounding_box.top(),
                    width: bounding_box.width(),
                    height: bounding_box.height(),
                    size: block.size(),
                    on_frame_border: block.border(),
                }
            })
            .collect();

        let components_path = output_dir.join(format!("{}_components.json", asset_name));
        let components_file = File::create(&components_path)
            .with_context(|| format!("failed to create {}", components_path.display()))?;
        serde_json::to_writer_pretty(components_file, &block_records)?;

        // Contours
        let border = find_border_pixels_4(&mask_plane, NON_MASK, None, self.pool());
        let (outer, inner) = pixels_to_contours(&mask_plane, &border, MASK);

        if verbose {
            println!(
                "Traced {} outer and {} inner contours for {}",
                outer.len(),
                inner.len(),
                asset_name
            );
        }

        if !skip_intermediates {
            let mut overlay = image.to_rgba8();
            for contour in &outer {
                draw_contour_mut(&mut overlay, contour, Rgba([255, 0, 0, 255]));
            }
            for contour in &inner {
                draw_contour_mut(&mut overlay, contour, Rgba([0, 0, 255, 255]));
            }
            for block in &blocks {
                draw_bounding_box_mut(&mut overlay, &block.bounding_box(), Rgba([0, 255, 0, 255]));
            }
            let overlay_path = output_dir.join(format!("{}_overlay.png", asset_name));
            overlay
                .save(&overlay_path)
                .with_context(|| format!("failed to save overlay {}", overlay_path.display()))?;
        }

        let mut contour_records = Vec::with_capacity(outer.len() + inner.len());
        for (contours, is_outer) in [(&outer, true), (&inner, false)] {
            for contour in contours.iter() {
                contour_records.push(self.contour_record(contour, is_outer));
            }
        }

        let contours_path = output_dir.join(format!("{}_contours.json", asset_name));
        let contours_file = File::create(&contours_path)
            .with_context(|| format!("failed to create {}", contours_path.display()))?;
        serde_json::to_writer_pretty(contours_file, &contour_records)?;

        // Rebuild a mask from the traced contours as a fidelity check
        if !skip_intermediates {
            let mut rebuilt = vec![NON_MASK; width as usize * height as usize];
            let mut rebuilt_plane = PlaneMut::new(&mut rebuilt, width, height, 0);

            for contour in &outer {
                if contour.is_dense() && contour.is_distinct() {
                    dense_contour_to_inclusive_mask(&mut rebuilt_plane, contour, MASK);
                } else {
                    let simplified = contour.simplified();
                    if contour_to_inclusive_mask_by_triangulation(
                        &mut rebuilt_plane,
                        &simplified,
                        MASK,
                        self.pool(),
                    )
                    .is_err()
                        && verbose
                    {
                        println!("Could not rasterize a contour of {}", asset_name);
                    }
                }
            }

            let rebuilt_path = output_dir.join(format!("{}_rebuilt.png", asset_name));
            BinaryImage::from_mask_plane(&rebuilt_plane.as_plane(), NON_MASK)
                .to_gray_image()
                .save(&rebuilt_path)
                .with_context(|| format!("failed to save rebuilt mask {}", rebuilt_path.display()))?;
        }

        if let Some(metric) = self.config.processing.distance_metric {
            self.save_distance_transform(&mask_plane, metric, &output_dir, &asset_name)?;
        }

        if self.config.processing.smooth_iterations > 0 {
            self.save_smoothed_mask(&mask_buffer, width, height, &output_dir, &asset_name)?;
        }

        Ok(FileOutcome {
            contours: outer.len() + inner.len(),
            blocks: blocks.len(),
        })
    }

    fn contour_record(&self, contour: &PixelContour, outer: bool) -> ContourRecord {
        let tolerance = self.config.processing.simplify_tolerance;
        let line_string = if tolerance > 0.0 {
            contour.simplified().to_line_string().simplify(&tolerance)
        } else {
            contour.simplified().to_line_string()
        };

        ContourRecord {
            outer,
            area: contour.area(),
            points: line_string.coords().map(|coord| [coord.x, coord.y]).collect(),
        }
    }

    fn save_distance_transform(
        &self,
        mask_plane: &Plane<u8>,
        metric: DistanceMetric,
        output_dir: &Path,
        asset_name: &str,
    ) -> Result<()> {
        let width = mask_plane.width();
        let height = mask_plane.height();

        let normalized: Option<Vec<u8>> = match metric {
            DistanceMetric::Chessboard | DistanceMetric::L1 => {
                let mut distances = vec![0u32; width as usize * height as usize];
                let mut target = PlaneMut::new(&mut distances, width, height, 0);
                let found = match metric {
                    DistanceMetric::Chessboard => {
                        compute_chessboard_distance_transform_8bit(mask_plane, MASK, &mut target)
                    }
                    _ => compute_l1_distance_transform_8bit(mask_plane, MASK, &mut target),
                };
                found.then(|| {
                    let max = distances.iter().copied().max().unwrap_or(0).max(1);
                    distances
                        .iter()
                        .map(|&distance| ((distance as u64 * 255) / max as u64) as u8)
                        .collect()
                })
            }
            DistanceMetric::L2 => {
                let mut distances = vec![0f32; width as usize * height as usize];
                let mut target = PlaneMut::new(&mut distances, width, height, 0);
                let found = compute_l2_distance_transform_8bit(mask_plane, MASK, &mut target);
                found.then(|| {
                    let max = distances.iter().copied().fold(0f32, f32::max).max(1.0);
                    distances
                        .iter()
                        .map(|&distance| ((distance / max) * 255.0).round() as u8)
                        .collect()
                })
            }
        };

        let Some(normalized) = normalized else {
            if self.config.processing.verbose {
                println!("No mask pixels for {}, skipping distance transform", asset_name);
            }
            return Ok(());
        };

        let distance_path = output_dir.join(format!("{}_distance.png", asset_name));
        GrayImage::from_raw(width, height, normalized)
            .context("distance buffer does not match image dimensions")?
            .save(&distance_path)
            .with_context(|| format!("failed to save distance transform {}", distance_path.display()))?;
        Ok(())
    }

    fn save_smoothed_mask(
        &self,
        mask_buffer: &[u8],
        width: u32,
        height: u32,
        output_dir: &Path,
        asset_name: &str,
    ) -> Result<()> {
        let iterations = self.config.processing.smooth_iterations;
        let increment = self.config.processing.smooth_increment;
        ensure!(
            iterations as u16 * increment as u16 <= u8::MAX as u16,
            "smooth_iterations * smooth_increment must not exceed 255"
        );

        let mut smoothed = mask_buffer.to_vec();
        let mut smooth_plane = PlaneMut::new(&mut smoothed, width, height, 0);
        smooth_mask(&mut smooth_plane, iterations, increment);

        let smooth_path = output_dir.join(format!("{}_smooth.png", asset_name));
        GrayImage::from_raw(width, height, smoothed)
            .context("smoothed buffer does not match image dimensions")?
            .save(&smooth_path)
            .with_context(|| format!("failed to save smoothed mask {}", smooth_path.display()))?;
        Ok(())
    }

    fn generate_binary_mask(image: &DynamicImage, method: MaskMethod, threshold: u8) -> Result<BinaryImage> {
        let binary = match method {
            MaskMethod::Luminance => {
                let gray = image.to_luma8();
                let binary_data: Vec<u8> = gray
                    .pixels()
                    .map(|pixel| if pixel.0[0] > threshold { 255 } else { 0 })
                    .collect();
                BinaryImage::from_raw(gray.width(), gray.height(), &binary_data)?
            }
            MaskMethod::Alpha => {
                let rgba = image.to_rgba8();
                let binary_data: Vec<u8> = rgba
                    .pixels()
                    .map(|pixel| if pixel.0[3] > threshold { 255 } else { 0 })
                    .collect();
                BinaryImage::from_raw(rgba.width(), rgba.height(), &binary_data)?
            }
            MaskMethod::Red => {
                let rgb = image.to_rgb8();
                let binary_data: Vec<u8> = rgb
                    .pixels()
                    .map(|pixel| if pixel.0[0] > threshold { 255 } else { 0 })
                    .collect();
                BinaryImage::from_raw(rgb.width(), rgb.height(), &binary_data)?
            }
            MaskMethod::Green => {
                let rgb = image.to_rgb8();
                let binary_data: Vec<u8> = rgb
                    .pixels()
                    .map(|pixel| if pixel.0[1] > threshold { 255 } else { 0 })
                    .collect();
                BinaryImage::from_raw(rgb.width(), rgb.height(), &binary_data)?
            }
            MaskMethod::Blue => {
                let rgb = image.to_rgb8();
                let binary_data: Vec<u8> = rgb
                    .pixels()
                    .map(|pixel| if pixel.0[2] > threshold { 255 } else { 0 })
                    .collect();
                BinaryImage::from_raw(rgb.width(), rgb.height(), &binary_data)?
            }
        };
        Ok(binary)
    }
}
