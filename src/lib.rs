// batchpix/src/lib.rs
mod cli;
mod config;
mod core;
mod processors;
mod utils;

pub use cli::{BatchArgs, Cli, Commands};
pub use config::{default_config, default_config_path, ConfigStore};
pub use core::processor::ImageProcessor;
pub use core::{
    AnchorPosition, BatchResult, CropBox, FlipMode, Operation, OperationRequest, OutputFormat,
    ProcessError, ProcessParams, Progress, Result, RotateParams, WatermarkParams,
};
pub use processors::{transforms, BatchPipeline, Encoder, Loader, Watermarker};
pub use utils::{
    find_system_font, format_file_size, get_image_info, hex_to_rgb, is_supported_input,
    SUPPORTED_INPUT_EXTENSIONS,
};

pub mod prelude {
    pub use crate::{
        BatchPipeline, BatchResult, Operation, OperationRequest, ProcessParams, Progress,
    };
}

// Re-export the image type callers hold between operations
pub use image::DynamicImage;
