// batchpix/src/processors/encoder.rs
use crate::core::{OutputFormat, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Derives encode settings from the parameter bag and writes the final
/// image. `quality` only affects JPEG; PNG always gets the fixed default
/// compression level.
pub struct Encoder {
    quality: Option<u8>,
}

impl Encoder {
    pub fn new(quality: Option<u8>) -> Self {
        Self {
            quality: quality.map(|q| q.clamp(1, 100)),
        }
    }

    /// With no explicit format the output keeps the format implied by the
    /// path's extension (which the pipeline carried over from the input).
    pub fn save(
        &self,
        image: &DynamicImage,
        path: &Path,
        format: Option<OutputFormat>,
    ) -> Result<()> {
        let image_format = match format {
            Some(f) => f.to_image_format(),
            None => ImageFormat::from_path(path)?,
        };

        log::debug!(
            "saving {} as {:?} (quality {:?})",
            path.display(),
            image_format,
            self.quality
        );

        match image_format {
            ImageFormat::Jpeg => self.save_jpeg(image, path),
            ImageFormat::Png => self.save_png(image, path),
            ImageFormat::WebP => self.save_webp(image, path),
            other => self.save_generic(image, path, other),
        }
    }

    fn save_jpeg(&self, image: &DynamicImage, path: &Path) -> Result<()> {
        let flattened = flatten_alpha(image);
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let encoder = JpegEncoder::new_with_quality(
            &mut writer,
            self.quality.unwrap_or(DEFAULT_JPEG_QUALITY),
        );
        flattened.write_with_encoder(encoder)?;
        Ok(())
    }

    fn save_png(&self, image: &DynamicImage, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        // fixed compression level for PNG; `quality` does not apply
        let encoder =
            PngEncoder::new_with_quality(writer, CompressionType::Default, PngFilter::Adaptive);
        image.write_with_encoder(encoder)?;
        Ok(())
    }

    fn save_webp(&self, image: &DynamicImage, path: &Path) -> Result<()> {
        // the image crate encodes WebP losslessly; `quality` is ignored
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        let encoder = WebPEncoder::new_lossless(writer);
        let rgba = image.to_rgba8();
        encoder.write_image(&rgba, rgba.width(), rgba.height(), ExtendedColorType::Rgba8)?;
        Ok(())
    }

    fn save_generic(&self, image: &DynamicImage, path: &Path, format: ImageFormat) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        match format {
            // the GIF encoder only accepts RGBA frames
            ImageFormat::Gif => {
                DynamicImage::ImageRgba8(image.to_rgba8()).write_to(&mut writer, format)?
            }
            _ => image.write_to(&mut writer, format)?,
        }
        Ok(())
    }
}

/// JPEG has no alpha channel: composite transparent images over a white
/// background instead of failing at encode time.
fn flatten_alpha(image: &DynamicImage) -> DynamicImage {
    if !image.color().has_alpha() {
        return image.clone();
    }

    let rgba = image.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (dst, src) in rgb.pixels_mut().zip(rgba.pixels()) {
        let alpha = src[3] as u16;
        for c in 0..3 {
            let channel = src[c] as u16;
            dst[c] = ((channel * alpha + 255 * (255 - alpha)) / 255) as u8;
        }
    }
    DynamicImage::ImageRgb8(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    #[test]
    fn flatten_keeps_opaque_pixels() {
        let rgba = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        let flat = flatten_alpha(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(flat.to_rgb8().get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn flatten_blends_transparency_toward_white() {
        let rgba = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0]));
        let flat = flatten_alpha(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(flat.to_rgb8().get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn jpeg_accepts_images_with_alpha() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.jpeg");
        let rgba = RgbaImage::from_pixel(4, 4, Rgba([200, 100, 50, 128]));

        Encoder::new(Some(90))
            .save(
                &DynamicImage::ImageRgba8(rgba),
                &path,
                Some(OutputFormat::Jpeg),
            )
            .unwrap();

        let written = image::open(&path).unwrap();
        assert_eq!((written.width(), written.height()), (4, 4));
    }

    #[test]
    fn png_round_trips_pixel_data() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.png");
        let rgb = image::RgbImage::from_fn(5, 3, |x, y| image::Rgb([x as u8, y as u8, 7]));
        let original = DynamicImage::ImageRgb8(rgb);

        Encoder::new(None)
            .save(&original, &path, Some(OutputFormat::Png))
            .unwrap();

        let written = image::open(&path).unwrap();
        assert_eq!(written.to_rgb8().as_raw(), original.to_rgb8().as_raw());
    }

    #[test]
    fn format_falls_back_to_the_path_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.bmp");
        let rgb = image::RgbImage::new(2, 2);

        Encoder::new(None)
            .save(&DynamicImage::ImageRgb8(rgb), &path, None)
            .unwrap();

        assert_eq!(
            image::ImageFormat::from_path(&path).unwrap(),
            image::ImageFormat::Bmp
        );
        assert!(image::open(&path).is_ok());
    }
}
