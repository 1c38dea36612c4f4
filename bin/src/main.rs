mod config;
mod processing;
mod stats;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use perigram::worker::RayonPool;

use crate::config::{Config, DistanceMetric, MaskMethod};
use crate::processing::Processor;
use crate::stats::ProcessingStats;

#[derive(Parser)]
#[command(name = "perigram")]
#[command(about = "Trace, analyze and rasterize contours from binary image masks")]
#[command(version = "1.0")]
struct Args {
    /// Input image path or directory for batch processing
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Optional binary mask image path (if not provided, mask will be generated from the image)
    #[arg(short, long)]
    mask: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Generate default configuration file and exit
    #[arg(long)]
    generate_config: bool,

    /// File patterns to include in batch processing (e.g., "*.png,*.jpg")
    #[arg(long, default_value = "*.png,*.jpg,*.jpeg,*.bmp,*.tiff,*.tga")]
    include_patterns: Option<String>,

    /// File patterns to exclude from batch processing
    #[arg(long)]
    exclude_patterns: Option<String>,

    /// Number of parallel workers (0 disables the worker pool)
    #[arg(long)]
    workers: Option<usize>,

    /// Continue batch processing even if some files fail
    #[arg(long)]
    continue_on_error: Option<bool>,

    /// Simplification tolerance for the Ramer-Douglas-Peucker pass on exported contours
    #[arg(long)]
    simplify_tolerance: Option<f64>,

    /// Threshold for binary mask generation (0-255)
    #[arg(long)]
    threshold: Option<u8>,

    /// Method for generating the binary mask from the image
    #[arg(long)]
    mask_method: Option<MaskMethod>,

    /// Use the 4-neighborhood for connected-component merging
    #[arg(long)]
    four_connected: Option<bool>,

    /// Drop connected components smaller than this pixel count
    #[arg(long)]
    min_block_size: Option<usize>,

    /// Distance transform to compute and save
    #[arg(long)]
    distance_metric: Option<DistanceMetric>,

    /// Number of mask smoothing iterations (0 disables smoothing)
    #[arg(long)]
    smooth_iterations: Option<u8>,

    /// Mask value increment per smoothing iteration
    #[arg(long)]
    smooth_increment: Option<u8>,

    /// Skip saving intermediate images (mask, overlay, rebuilt mask)
    #[arg(long)]
    skip_intermediates: Option<bool>,

    /// Verbose output
    #[arg(long)]
    verbose: bool,
}

fn matches_patterns(filename: &str, patterns: &[String]) -> bool {
    if patterns.is_empty() {
        return false;
    }

    patterns.iter().any(|pattern| {
        if pattern.contains('*') {
            // Simple glob matching
            let pattern = pattern.replace('*', "");
            if pattern.starts_with('.') {
                filename.ends_with(&pattern)
            } else {
                filename.contains(&pattern)
            }
        } else {
            filename == pattern
        }
    })
}

fn find_input_files(
    input_path: &Path,
    include_patterns: &[String],
    exclude_patterns: &[String],
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else if input_path.is_dir() {
        for entry in fs::read_dir(input_path)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() {
                if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
                    let matches_include = matches_patterns(filename, include_patterns);
                    let matches_exclude = matches_patterns(filename, exclude_patterns);

                    if matches_include && !matches_exclude {
                        files.push(path);
                    }
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Handle config generation
    if args.generate_config {
        let config_path = args.config.unwrap_or_else(|| PathBuf::from("perigram_config.json"));
        Config::save_default(&config_path)?;
        return Ok(());
    }

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        Config::load(config_path)?
    } else {
        Config::default()
    };

    // Override config with command line arguments
    if let Some(input) = args.input {
        config.input.input = input;
    }
    if args.mask.is_some() {
        config.input.mask = args.mask;
    }
    if let Some(simplify_tolerance) = args.simplify_tolerance {
        config.processing.simplify_tolerance = simplify_tolerance;
    }
    if let Some(threshold) = args.threshold {
        config.processing.threshold = threshold;
    }
    if let Some(mask_method) = args.mask_method {
        config.processing.mask_method = mask_method;
    }
    if let Some(four_connected) = args.four_connected {
        config.processing.four_connected = four_connected;
    }
    if let Some(min_block_size) = args.min_block_size {
        config.processing.min_block_size = min_block_size;
    }
    if args.distance_metric.is_some() {
        config.processing.distance_metric = args.distance_metric;
    }
    if let Some(smooth_iterations) = args.smooth_iterations {
        config.processing.smooth_iterations = smooth_iterations;
    }
    if let Some(smooth_increment) = args.smooth_increment {
        config.processing.smooth_increment = smooth_increment;
    }
    if args.verbose {
        config.processing.verbose = true;
    }
    if let Some(workers) = args.workers {
        config.batch.workers = workers;
    }
    if let Some(output) = args.output {
        config.output.output_folder = output;
    }
    if let Some(continue_on_error) = args.continue_on_error {
        config.batch.continue_on_error = continue_on_error;
    }
    if let Some(skip_intermediates) = args.skip_intermediates {
        config.output.skip_intermediates = skip_intermediates;
    }

    // Parse include patterns from command line
    if let Some(include_patterns) = args.include_patterns {
        let mut include_patterns: Vec<String> = include_patterns
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();
        config.batch.include_patterns.append(&mut include_patterns);
    }
    if let Some(exclude_patterns) = args.exclude_patterns {
        let mut exclude_patterns: Vec<String> = exclude_patterns
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();
        config.batch.exclude_patterns.append(&mut exclude_patterns);
    }

    config.batch.exclude_patterns.push("*_mask*".to_string());

    // Find input files
    let input_files = find_input_files(
        &config.input.input,
        &config.batch.include_patterns,
        &config.batch.exclude_patterns,
    )?;

    if input_files.is_empty() {
        eprintln!("No input files found matching the criteria");
        std::process::exit(1);
    }

    let batch = config.input.input.is_dir();

    if config.processing.verbose {
        println!("Found {} input files", input_files.len());
        for file in &input_files {
            println!("  - {}", file.display());
        }
    }

    // Create output directory
    fs::create_dir_all(&config.output.output_folder)
        .context("failed to create output directory")?;

    // Configure the worker pool
    let pool = if config.batch.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.batch.workers)
            .build_global()
            .context("failed to configure worker threads")?;
        Some(RayonPool::new())
    } else {
        None
    };

    let mut stats = ProcessingStats::new(input_files.len());
    let processor = Processor::new(config.clone(), pool);

    for input_file in &input_files {
        let mask = if batch {
            // Batch mode pairs each image with an optional "{stem}_mask.png" sibling
            let stem = input_file.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            let mask_filename = format!("{}_mask.png", stem);
            let mask_path = input_file.with_file_name(mask_filename);
            if !mask_path.exists() { None } else { Some(mask_path) }
        } else {
            config.input.mask.clone()
        };

        match processor.process(input_file, mask.as_deref()) {
            Ok(outcome) => {
                stats.processed += 1;
                stats.total_contours += outcome.contours;
                stats.total_blocks += outcome.blocks;
                if config.processing.verbose {
                    println!(
                        "Successfully processed: {} ({} contours, {} components)",
                        input_file.display(),
                        outcome.contours,
                        outcome.blocks
                    );
                }
            }
            Err(e) => {
                stats.failed += 1;
                eprintln!("Failed to process {}: {:#}", input_file.display(), e);
                if !config.batch.continue_on_error {
                    return Err(e);
                }
            }
        }

        if config.processing.verbose && input_files.len() > 1 {
            stats.print_progress();
        }
    }

    // Print final summary
    if input_files.len() > 1 {
        stats.print_summary();
    } else {
        println!(
            "Successfully traced {} contours in: {}",
            stats.total_contours,
            config.output.output_folder.display()
        );
    }

    Ok(())
}
