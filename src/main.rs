// batchpix/src/main.rs
use anyhow::Context;
use batchpix::{
    default_config_path, format_file_size, get_image_info, hex_to_rgb, BatchArgs, BatchPipeline,
    BatchResult, Cli, Commands, ConfigStore, Operation, OperationRequest, ProcessParams,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use std::path::Path;
use std::sync::atomic::AtomicBool;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    match cli.command {
        Commands::Batch(args) => process_batch(args)?,
        Commands::Info { input } => process_info(&input)?,
    }

    Ok(())
}

fn process_batch(args: BatchArgs) -> anyhow::Result<()> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut config = ConfigStore::load(&config_path);

    let request = build_request(&args, &config)?;
    let pipeline = BatchPipeline::new(request)?;

    let pb = create_progress_bar();
    let cancel = AtomicBool::new(false);

    let result = pipeline.process_with(
        &args.input,
        &args.output,
        |progress| {
            pb.set_length(progress.total as u64);
            pb.set_position(progress.index as u64);
            pb.set_message(progress.filename.clone());
        },
        &cancel,
    )?;
    pb.finish_and_clear();

    config.add_recent_folder(&args.input, 5);
    if let Err(err) = config.save() {
        log::warn!("could not save config {}: {err}", config_path.display());
    }

    render_result(&result, args.json)
}

/// Seed the parameter bag from the config's `image_processing.*` defaults,
/// then apply explicit flags on top. Config defaults only fill parameters
/// that an operation in the pipeline actually consumes.
fn build_request(args: &BatchArgs, config: &ConfigStore) -> anyhow::Result<OperationRequest> {
    let defaults = config.default_params();
    let mut params = ProcessParams::default();

    params.width = args.width;
    params.height = args.height;
    params.scale = args.scale;
    if args.ops.contains(&Operation::Resize)
        && params.width.is_none()
        && params.height.is_none()
        && params.scale.is_none()
    {
        params.width = defaults.width;
        params.height = defaults.height;
        params.scale = defaults.scale;
    }

    params.format = args.format;
    if params.format.is_none() && args.ops.contains(&Operation::Convert) {
        params.format = defaults.format;
    }
    params.quality = args.quality.or(defaults.quality);

    params.watermark = defaults.watermark;
    if let Some(text) = &args.text {
        params.watermark.text = Some(text.clone());
    }
    if args.font.is_some() {
        params.watermark.font = args.font.clone();
    }
    if let Some(size) = args.font_size {
        params.watermark.font_size = size;
    }
    if let Some(opacity) = args.opacity {
        params.watermark.opacity = opacity;
    }
    if let Some(color) = &args.color {
        params.watermark.color = hex_to_rgb(color)?;
    }
    if let Some(position) = args.position {
        params.watermark.position = position;
    }
    if let Some(margin) = args.margin {
        params.watermark.margin = margin;
    }

    params.rotate.degrees = args.degrees.unwrap_or(defaults.rotate.degrees);
    params.rotate.expand = !args.no_expand;
    if let Some(mode) = args.flip_mode {
        params.flip = mode;
    }
    params.crop = args.crop_box;

    OperationRequest::new(args.ops.clone(), params).context("invalid operation request")
}

fn render_result(result: &BatchResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!(
        "Processed {} files: {} succeeded, {} failed",
        result.total(),
        result.successes.len(),
        result.failures.len()
    );
    for (filename, message) in &result.failures {
        println!("  {filename}: {message}");
    }
    Ok(())
}

fn process_info(input: &Path) -> anyhow::Result<()> {
    let metadata = std::fs::metadata(input)
        .with_context(|| format!("cannot read {}", input.display()))?;
    let (width, height, format) = get_image_info(input)?;

    println!("File: {}", input.display());
    println!("Size: {}", format_file_size(metadata.len()));
    println!("Dimensions: {width} x {height} pixels");
    println!("Format: {format}");

    Ok(())
}

fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}
