// batchpix/src/core/processor.rs
use super::{Operation, OperationRequest, ProcessError, Result};
use crate::processors::{transforms, Encoder, Loader, Watermarker};
use image::DynamicImage;
use std::path::{Path, PathBuf};

/// Runs the decode -> fold -> encode chain for a single file. Constructed
/// once per batch so the watermark font is loaded exactly once.
pub struct ImageProcessor {
    request: OperationRequest,
    loader: Loader,
    encoder: Encoder,
    watermarker: Option<Watermarker>,
}

impl ImageProcessor {
    pub fn new(request: OperationRequest) -> Result<Self> {
        let watermarker = if request.operations().contains(&Operation::Watermark) {
            Watermarker::from_params(&request.params().watermark)?
        } else {
            None
        };
        let encoder = Encoder::new(request.params().quality);

        Ok(Self {
            request,
            loader: Loader::new(),
            encoder,
            watermarker,
        })
    }

    /// Process one file and return the path that was written.
    pub fn process_file(&self, input_path: &Path, output_dir: &Path) -> Result<PathBuf> {
        let mut image = self.loader.load(input_path)?;

        for &op in self.request.operations() {
            image = self.apply_operation(image, op)?;
        }

        let output_path = self.output_path(input_path, output_dir)?;
        self.encoder.save(&image, &output_path, self.request.params().format)?;

        Ok(output_path)
    }

    fn apply_operation(&self, image: DynamicImage, op: Operation) -> Result<DynamicImage> {
        let params = self.request.params();
        match op {
            Operation::Resize => transforms::resize(image, params),
            Operation::Rotate => transforms::rotate(image, &params.rotate),
            Operation::Flip => Ok(transforms::flip(image, params.flip)),
            Operation::Crop => transforms::crop(image, params.crop),
            Operation::Watermark => match &self.watermarker {
                Some(watermarker) => watermarker.apply(image),
                // no text configured: watermarking is a no-op
                None => Ok(image),
            },
            // format and quality are applied by the encoder at save time
            Operation::Convert | Operation::Compress => Ok(image),
        }
    }

    /// Same base name as the input, under `output_dir`; a target format
    /// replaces the extension with its conventional one.
    fn output_path(&self, input_path: &Path, output_dir: &Path) -> Result<PathBuf> {
        let file_name = input_path.file_name().ok_or_else(|| {
            ProcessError::InvalidParameter(format!(
                "invalid file name: {}",
                input_path.display()
            ))
        })?;

        let mut path = output_dir.join(file_name);
        if let Some(format) = self.request.params().format {
            path.set_extension(format.extension());
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{OutputFormat, ProcessParams};

    fn processor(params: ProcessParams) -> ImageProcessor {
        let request = OperationRequest::new(vec![Operation::Resize], params).unwrap();
        ImageProcessor::new(request).unwrap()
    }

    #[test]
    fn output_path_keeps_name_and_extension_without_target_format() {
        let p = processor(ProcessParams::default());
        let out = p
            .output_path(Path::new("/in/photo.JPG"), Path::new("/out"))
            .unwrap();
        assert_eq!(out, PathBuf::from("/out/photo.JPG"));
    }

    #[test]
    fn output_path_swaps_extension_for_target_format() {
        let mut params = ProcessParams::default();
        params.format = Some(OutputFormat::Png);
        let p = processor(params);
        let out = p
            .output_path(Path::new("/in/photo.jpg"), Path::new("/out"))
            .unwrap();
        assert_eq!(out, PathBuf::from("/out/photo.png"));
    }
}
