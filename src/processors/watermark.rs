// batchpix/src/processors/watermark.rs
use crate::core::{AnchorPosition, ProcessError, Result, WatermarkParams};
use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::fs;

/// Draws configured text onto a transparent overlay and composites it over
/// the image. Holds the loaded font for the lifetime of a batch.
pub struct Watermarker {
    font: FontVec,
    text: String,
    scale: PxScale,
    color: Rgba<u8>,
    position: AnchorPosition,
    margin: u32,
}

impl Watermarker {
    /// `None` when no text is configured: the operation is a no-op and no
    /// font is loaded. With text, a missing font is an up-front error.
    pub fn from_params(params: &WatermarkParams) -> Result<Option<Self>> {
        let text = match params.text.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => return Ok(None),
        };

        let font_path = match &params.font {
            Some(path) => path.clone(),
            None => crate::utils::find_system_font().ok_or_else(|| {
                ProcessError::FontUnavailable(
                    "no TrueType font found in the system font directories; \
                     pass an explicit font path"
                        .to_string(),
                )
            })?,
        };
        log::debug!("watermark font: {}", font_path.display());

        let bytes = fs::read(&font_path)?;
        let font = FontVec::try_from_vec_and_index(bytes, 0).map_err(|_| {
            ProcessError::FontUnavailable(format!(
                "{} is not a usable font file",
                font_path.display()
            ))
        })?;

        let [r, g, b] = params.color;
        let alpha = (255.0 * params.opacity).round() as u8;

        Ok(Some(Self {
            font,
            text,
            scale: PxScale::from(params.font_size as f32),
            color: Rgba([r, g, b, alpha]),
            position: params.position,
            margin: params.margin,
        }))
    }

    pub fn apply(&self, image: DynamicImage) -> Result<DynamicImage> {
        let (text_w, text_h) = text_size(self.scale, &self.font, &self.text);
        let (x, y) = anchor_offset(
            (image.width(), image.height()),
            (text_w, text_h),
            self.position,
            self.margin,
        );

        let mut overlay = RgbaImage::from_pixel(image.width(), image.height(), Rgba([0, 0, 0, 0]));
        draw_text_mut(&mut overlay, self.color, x, y, self.scale, &self.font, &self.text);

        // composite over an alpha-capable version of the base
        let mut base = image.to_rgba8();
        image::imageops::overlay(&mut base, &overlay, 0, 0);
        Ok(DynamicImage::ImageRgba8(base))
    }
}

/// Pixel offset of the text block for one of the nine named anchors.
/// Oversized text yields negative offsets and clips, as the overlay does.
fn anchor_offset(
    image: (u32, u32),
    text: (u32, u32),
    position: AnchorPosition,
    margin: u32,
) -> (i32, i32) {
    let (iw, ih) = (image.0 as i32, image.1 as i32);
    let (tw, th) = (text.0 as i32, text.1 as i32);
    let m = margin as i32;

    use AnchorPosition::*;
    match position {
        TopLeft => (m, m),
        TopCenter => ((iw - tw) / 2, m),
        TopRight => (iw - tw - m, m),
        CenterLeft => (m, (ih - th) / 2),
        Center => ((iw - tw) / 2, (ih - th) / 2),
        CenterRight => (iw - tw - m, (ih - th) / 2),
        BottomLeft => (m, ih - th - m),
        BottomCenter => ((iw - tw) / 2, ih - th - m),
        BottomRight => (iw - tw - m, ih - th - m),
    }
}
