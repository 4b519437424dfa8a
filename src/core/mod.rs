// batchpix/src/core/mod.rs
pub mod processor;

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("unsupported flip mode: {0}")]
    UnsupportedMode(String),

    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("image too large: {0}")]
    ImageTooLarge(String),

    #[error("no usable font: {0}")]
    FontUnavailable(String),
}

pub type Result<T> = std::result::Result<T, ProcessError>;

/// The fixed catalog of batch operations. `convert` and `compress` are
/// identity transforms during the fold; they take effect at encode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Resize,
    Convert,
    Compress,
    Watermark,
    Rotate,
    Flip,
    Crop,
}

impl FromStr for Operation {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resize" => Ok(Self::Resize),
            "convert" => Ok(Self::Convert),
            "compress" => Ok(Self::Compress),
            "watermark" => Ok(Self::Watermark),
            "rotate" => Ok(Self::Rotate),
            "flip" => Ok(Self::Flip),
            "crop" => Ok(Self::Crop),
            other => Err(ProcessError::UnsupportedOperation(other.to_string())),
        }
    }
}

/// Export formats. TIFF can be read but not written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    WebP,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::WebP => "webp",
        }
    }

    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::Gif => image::ImageFormat::Gif,
            Self::Bmp => image::ImageFormat::Bmp,
            Self::WebP => image::ImageFormat::WebP,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Gif => "GIF",
            Self::Bmp => "BMP",
            Self::WebP => "WEBP",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "gif" => Ok(Self::Gif),
            "bmp" => Ok(Self::Bmp),
            "webp" => Ok(Self::WebP),
            other => Err(ProcessError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlipMode {
    #[default]
    Horizontal,
    Vertical,
}

impl FromStr for FlipMode {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Ok(Self::Horizontal),
            "vertical" => Ok(Self::Vertical),
            other => Err(ProcessError::UnsupportedMode(other.to_string())),
        }
    }
}

/// The nine named watermark placements. Unrecognized names fall back to
/// bottom-right rather than failing; parsing is infallible on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorPosition {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    #[default]
    BottomRight,
}

impl FromStr for AnchorPosition {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "top-left" => Self::TopLeft,
            "top-center" => Self::TopCenter,
            "top-right" => Self::TopRight,
            "center-left" => Self::CenterLeft,
            "center" => Self::Center,
            "center-right" => Self::CenterRight,
            "bottom-left" => Self::BottomLeft,
            "bottom-center" => Self::BottomCenter,
            _ => Self::BottomRight,
        })
    }
}

/// Crop rectangle in pixel coordinates, `left < right`, `upper < lower`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub left: u32,
    pub upper: u32,
    pub right: u32,
    pub lower: u32,
}

impl CropBox {
    pub fn validate(&self) -> Result<()> {
        if self.left >= self.right || self.upper >= self.lower {
            return Err(ProcessError::InvalidParameter(format!(
                "crop box {self} is not ordered left < right, upper < lower"
            )));
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.lower - self.upper
    }
}

impl fmt::Display for CropBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.left, self.upper, self.right, self.lower)
    }
}

impl FromStr for CropBox {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(ProcessError::InvalidParameter(format!(
                "crop box must be left,upper,right,lower, got {s:?}"
            )));
        }
        let mut values = [0u32; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| {
                ProcessError::InvalidParameter(format!("invalid crop coordinate {part:?}"))
            })?;
        }
        let bx = Self {
            left: values[0],
            upper: values[1],
            right: values[2],
            lower: values[3],
        };
        bx.validate()?;
        Ok(bx)
    }
}

#[derive(Debug, Clone)]
pub struct WatermarkParams {
    pub text: Option<String>,
    pub font: Option<PathBuf>,
    pub font_size: u32,
    pub opacity: f32,
    pub color: [u8; 3],
    pub position: AnchorPosition,
    pub margin: u32,
}

impl Default for WatermarkParams {
    fn default() -> Self {
        Self {
            text: None,
            font: None,
            font_size: 30,
            opacity: 0.7,
            color: [255, 255, 255],
            position: AnchorPosition::BottomRight,
            margin: 10,
        }
    }
}

impl WatermarkParams {
    /// Watermarking is a no-op unless non-blank text is configured.
    pub fn enabled(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RotateParams {
    pub degrees: f32,
    pub expand: bool,
}

impl Default for RotateParams {
    fn default() -> Self {
        Self {
            degrees: 0.0,
            expand: true,
        }
    }
}

/// The shared parameter bag. Every operation in a request receives the
/// whole bag and reads only the fields it recognizes.
#[derive(Debug, Clone, Default)]
pub struct ProcessParams {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub scale: Option<f32>,
    pub format: Option<OutputFormat>,
    pub quality: Option<u8>,
    pub watermark: WatermarkParams,
    pub rotate: RotateParams,
    pub flip: FlipMode,
    pub crop: Option<CropBox>,
}

/// An ordered operation sequence plus its parameter bag, validated once
/// at construction. Treated as read-only by the pipeline.
#[derive(Debug, Clone)]
pub struct OperationRequest {
    operations: Vec<Operation>,
    params: ProcessParams,
}

impl OperationRequest {
    pub fn new(operations: Vec<Operation>, params: ProcessParams) -> Result<Self> {
        Self::validate(&params)?;
        Ok(Self { operations, params })
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn params(&self) -> &ProcessParams {
        &self.params
    }

    fn validate(params: &ProcessParams) -> Result<()> {
        if let Some(quality) = params.quality {
            if !(1..=100).contains(&quality) {
                return Err(ProcessError::InvalidParameter(
                    "quality must be between 1 and 100".to_string(),
                ));
            }
        }
        if let Some(scale) = params.scale {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(ProcessError::InvalidParameter(format!(
                    "scale must be a positive number, got {scale}"
                )));
            }
        }
        let watermark = &params.watermark;
        if !(0.0..=1.0).contains(&watermark.opacity) {
            return Err(ProcessError::InvalidParameter(format!(
                "watermark opacity must be within 0.0-1.0, got {}",
                watermark.opacity
            )));
        }
        if watermark.font_size == 0 {
            return Err(ProcessError::InvalidParameter(
                "watermark font size must be at least 1".to_string(),
            ));
        }
        if !params.rotate.degrees.is_finite() {
            return Err(ProcessError::InvalidParameter(
                "rotation degrees must be finite".to_string(),
            ));
        }
        if let Some(crop) = params.crop {
            crop.validate()?;
        }
        Ok(())
    }
}

/// Aggregate outcome of one batch run: ordered successes and
/// `(filename, error message)` failures.
#[derive(Debug, Default, Serialize)]
pub struct BatchResult {
    pub successes: Vec<String>,
    pub failures: Vec<(String, String)>,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }
}

/// Emitted after each file completes, success or not. `index` counts
/// completed files starting at 1.
#[derive(Debug, Clone)]
pub struct Progress {
    pub index: usize,
    pub total: usize,
    pub filename: String,
}
