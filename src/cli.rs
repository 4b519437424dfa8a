// batchpix/src/cli.rs
use crate::core::{AnchorPosition, CropBox, FlipMode, Operation, OutputFormat};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "batchpix",
    version,
    about = "Apply an ordered pipeline of transforms to every image in a folder"
)]
pub struct Cli {
    /// Verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process every supported image in a folder
    Batch(BatchArgs),

    /// Show dimensions, format and size for one image
    Info {
        input: PathBuf,
    },
}

#[derive(Args)]
pub struct BatchArgs {
    /// Input folder (subdirectories are not recursed)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output folder, created if missing
    #[arg(short, long)]
    pub output: PathBuf,

    /// Ordered operations: resize, convert, compress, watermark, rotate, flip, crop
    #[arg(long, value_delimiter = ',', required = true)]
    pub ops: Vec<Operation>,

    /// Target width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Target height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Uniform scale factor; takes priority over width/height
    #[arg(long)]
    pub scale: Option<f32>,

    /// Export format: jpeg, png, gif, bmp or webp
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Encode quality 1-100 (JPEG)
    #[arg(short, long)]
    pub quality: Option<u8>,

    /// Watermark text
    #[arg(long)]
    pub text: Option<String>,

    /// TrueType font file for the watermark
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Watermark font size in pixels
    #[arg(long)]
    pub font_size: Option<u32>,

    /// Watermark opacity, 0.0-1.0
    #[arg(long)]
    pub opacity: Option<f32>,

    /// Watermark color as #RRGGBB
    #[arg(long)]
    pub color: Option<String>,

    /// Watermark anchor: {top,center,bottom}-{left,center,right} or center
    #[arg(long)]
    pub position: Option<AnchorPosition>,

    /// Watermark margin in pixels
    #[arg(long)]
    pub margin: Option<u32>,

    /// Rotation in degrees, counterclockwise
    #[arg(long)]
    pub degrees: Option<f32>,

    /// Keep the original canvas when rotating (corners clip)
    #[arg(long)]
    pub no_expand: bool,

    /// Flip axis: horizontal or vertical
    #[arg(long)]
    pub flip_mode: Option<FlipMode>,

    /// Crop box as left,upper,right,lower
    #[arg(long)]
    pub crop_box: Option<CropBox>,

    /// Config file (defaults to the per-user location)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the batch result as JSON instead of a text summary
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_command_parses_an_operation_pipeline() {
        let cli = Cli::try_parse_from([
            "batchpix", "batch", "-i", "in", "-o", "out", "--ops", "resize,watermark,convert",
            "--width", "800", "--format", "png",
        ])
        .unwrap();

        let Commands::Batch(args) = cli.command else {
            panic!("expected batch command");
        };
        assert_eq!(
            args.ops,
            vec![Operation::Resize, Operation::Watermark, Operation::Convert]
        );
        assert_eq!(args.width, Some(800));
        assert_eq!(args.format, Some(OutputFormat::Png));
    }

    #[test]
    fn unknown_operation_fails_parsing() {
        let result = Cli::try_parse_from([
            "batchpix", "batch", "-i", "in", "-o", "out", "--ops", "resize,sharpen",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn crop_box_flag_parses_four_coordinates() {
        let cli = Cli::try_parse_from([
            "batchpix", "batch", "-i", "in", "-o", "out", "--ops", "crop", "--crop-box",
            "10,20,110,220",
        ])
        .unwrap();

        let Commands::Batch(args) = cli.command else {
            panic!("expected batch command");
        };
        let bx = args.crop_box.unwrap();
        assert_eq!((bx.left, bx.upper, bx.right, bx.lower), (10, 20, 110, 220));
    }
}
