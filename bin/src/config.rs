use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, ValueEnum, Debug, Default, Serialize, Deserialize)]
pub(crate) enum MaskMethod {
    /// Use luminance/brightness to generate the mask
    Luminance,
    /// Use the alpha channel to generate the mask
    #[default]
    Alpha,
    /// Use the red channel to generate the mask
    Red,
    /// Use the green channel to generate the mask
    Green,
    /// Use the blue channel to generate the mask
    Blue,
}

#[derive(Clone, Copy, ValueEnum, Debug, Serialize, Deserialize)]
pub(crate) enum DistanceMetric {
    /// Chessboard (maximum-axis) distance
    Chessboard,
    /// Manhattan distance
    L1,
    /// Approximated Euclidean distance
    L2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Config {
    /// Input settings
    pub input: InputConfig,
    /// Processing parameters
    pub processing: ProcessingConfig,
    /// Batch processing settings
    pub batch: BatchConfig,
    /// Output settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct InputConfig {
    /// Input image file path or directory path
    pub input: PathBuf,
    /// Optional binary mask image path
    pub mask: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ProcessingConfig {
    /// Threshold for binary mask generation (0-255)
    #[serde(default)]
    pub threshold: u8,
    /// Method for generating the binary mask from the image
    #[serde(default)]
    pub mask_method: MaskMethod,
    /// Simplification tolerance for the exported contours; 0 disables the
    /// extra Ramer-Douglas-Peucker pass
    #[serde(default)]
    pub simplify_tolerance: f64,
    /// Use the 4-neighborhood instead of the 8-neighborhood for
    /// connected-component merging
    #[serde(default)]
    pub four_connected: bool,
    /// Drop connected components smaller than this pixel count
    #[serde(default)]
    pub min_block_size: usize,
    /// Distance transform to compute, if any
    #[serde(default)]
    pub distance_metric: Option<DistanceMetric>,
    /// Number of mask smoothing iterations; 0 disables smoothing
    #[serde(default)]
    pub smooth_iterations: u8,
    /// Mask value increment per smoothing iteration
    #[serde(default)]
    pub smooth_increment: u8,
    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct BatchConfig {
    /// File patterns to include in batch processing
    #[serde(default)]
    pub include_patterns: Vec<String>,
    /// File patterns to exclude from batch processing
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    /// Number of parallel workers
    #[serde(default)]
    pub workers: usize,
    /// Continue batch processing even if some files fail
    #[serde(default)]
    pub continue_on_error: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct OutputConfig {
    /// Output folder for processed files
    #[serde(default)]
    pub output_folder: PathBuf,
    /// Skip saving intermediate images (mask, overlay, rebuilt mask)
    #[serde(default)]
    pub skip_intermediates: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input: InputConfig {
                input: PathBuf::from("image.png"),
                mask: None,
            },
            processing: ProcessingConfig {
                threshold: 128,
                mask_method: MaskMethod::Alpha,
                simplify_tolerance: 0.0,
                four_connected: false,
                min_block_size: 0,
                distance_metric: None,
                smooth_iterations: 0,
                smooth_increment: 32,
                verbose: false,
            },
            batch: BatchConfig {
                include_patterns: vec![
                    "*.png".to_string(),
                    "*.jpg".to_string(),
                    "*.jpeg".to_string(),
                    "*.bmp".to_string(),
                    "*.tiff".to_string(),
                    "*.tga".to_string(),
                ],
                exclude_patterns: vec![],
                workers: 1,
                continue_on_error: false,
            },
            output: OutputConfig {
                output_folder: PathBuf::from("output"),
                skip_intermediates: false,
            },
        }
    }
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Config> {
        let config_str = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config file {}", config_path.display()))?;

        let config: Config = match config_path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&config_str)?,
            Some("toml") => toml::from_str(&config_str)?,
            _ => bail!("unsupported config file format, use .json or .toml"),
        };
        Ok(config)
    }

    pub fn save_default(config_path: &Path) -> Result<()> {
        let config = Config::default();
        let config_str = match config_path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::to_string_pretty(&config)?,
            _ => serde_json::to_string_pretty(&config)?, // default to JSON
        };

        let mut file = File::create(config_path)
            .with_context(|| format!("failed to create {}", config_path.display()))?;
        file.write_all(config_str.as_bytes())?;
        println!("Generated default configuration file: {}", config_path.display());
        Ok(())
    }
}
