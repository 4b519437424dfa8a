// batchpix/src/processors/loader.rs
use crate::core::{ProcessError, Result};
use image::{DynamicImage, ImageReader};
use std::path::Path;

// Decompression-bomb guard: anything claiming more than this per side is
// rejected from the header alone, before the pixel data is touched.
const MAX_DIMENSION: u32 = 20_000;

pub struct Loader {
    max_dimension: u32,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
        }
    }

    pub fn with_max_dimension(mut self, limit: u32) -> Self {
        self.max_dimension = limit;
        self
    }

    pub fn load(&self, path: &Path) -> Result<DynamicImage> {
        log::debug!("loading image from {}", path.display());

        let (width, height) = ImageReader::open(path)?
            .with_guessed_format()?
            .into_dimensions()?;

        if width > self.max_dimension || height > self.max_dimension {
            return Err(ProcessError::ImageTooLarge(format!(
                "{}x{} exceeds the {} px per-side limit",
                width, height, self.max_dimension
            )));
        }

        let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;

        log::debug!("loaded {}x{}, color {:?}", width, height, image.color());
        Ok(image)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
