// batchpix/src/processors/transforms.rs
use crate::core::{CropBox, FlipMode, ProcessError, ProcessParams, Result, RotateParams};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

/// Resize priority: `scale` beats explicit dimensions; a single dimension
/// preserves aspect ratio; both dimensions resize to the exact box.
pub fn resize(image: DynamicImage, params: &ProcessParams) -> Result<DynamicImage> {
    let (orig_w, orig_h) = (image.width(), image.height());

    let target = if let Some(scale) = params.scale {
        let scale = scale as f64;
        Some((
            (orig_w as f64 * scale).floor() as u32,
            (orig_h as f64 * scale).floor() as u32,
        ))
    } else {
        match (params.width, params.height) {
            (Some(w), Some(h)) => Some((w, h)),
            (Some(w), None) => {
                let ratio = w as f64 / orig_w as f64;
                Some((w, (orig_h as f64 * ratio).round() as u32))
            }
            (None, Some(h)) => {
                let ratio = h as f64 / orig_h as f64;
                Some(((orig_w as f64 * ratio).round() as u32, h))
            }
            (None, None) => None,
        }
    };

    let Some((width, height)) = target else {
        return Ok(image);
    };

    if width == 0 || height == 0 {
        return Err(ProcessError::InvalidParameter(format!(
            "resize target {width}x{height} has a zero dimension"
        )));
    }
    if (width, height) == (orig_w, orig_h) {
        log::debug!("resize target matches current size, skipping");
        return Ok(image);
    }

    log::debug!("resizing {orig_w}x{orig_h} -> {width}x{height}");
    Ok(image.resize_exact(width, height, FilterType::Lanczos3))
}

/// Counterclockwise rotation about the image center. With `expand` the
/// canvas grows to the full rotated bounds; otherwise corners clip.
pub fn rotate(image: DynamicImage, params: &RotateParams) -> Result<DynamicImage> {
    let normalized = params.degrees.rem_euclid(360.0);
    if normalized == 0.0 {
        return Ok(image);
    }

    // exact right-angle paths keep the color type and skip resampling
    if normalized == 180.0 {
        return Ok(image.rotate180());
    }
    if params.expand {
        if normalized == 90.0 {
            return Ok(image.rotate270());
        }
        if normalized == 270.0 {
            return Ok(image.rotate90());
        }
    }

    log::debug!(
        "rotating by {} degrees (expand: {})",
        params.degrees,
        params.expand
    );

    // imageproc rotates clockwise for positive theta
    let theta = -params.degrees.to_radians();
    let rgba = image.to_rgba8();
    let canvas = if params.expand {
        expand_canvas(&rgba, normalized)
    } else {
        rgba
    };
    let rotated = rotate_about_center(&canvas, theta, Interpolation::Bilinear, Rgba([0, 0, 0, 0]));
    Ok(DynamicImage::ImageRgba8(rotated))
}

// Pad to the bounding box of the rotated image so no corner is lost.
fn expand_canvas(image: &RgbaImage, degrees: f32) -> RgbaImage {
    let (w, h) = image.dimensions();
    let theta = (degrees as f64).to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let new_w = (w as f64 * cos + h as f64 * sin).ceil() as u32;
    let new_h = (w as f64 * sin + h as f64 * cos).ceil() as u32;

    let mut canvas = RgbaImage::from_pixel(new_w, new_h, Rgba([0, 0, 0, 0]));
    image::imageops::overlay(
        &mut canvas,
        image,
        ((new_w - w) / 2) as i64,
        ((new_h - h) / 2) as i64,
    );
    canvas
}

pub fn flip(image: DynamicImage, mode: FlipMode) -> DynamicImage {
    match mode {
        FlipMode::Horizontal => image.fliph(),
        FlipMode::Vertical => image.flipv(),
    }
}

/// Crop to `box_` if given; the box must lie within the current image.
pub fn crop(image: DynamicImage, box_: Option<CropBox>) -> Result<DynamicImage> {
    let Some(bx) = box_ else {
        return Ok(image);
    };
    bx.validate()?;
    if bx.right > image.width() || bx.lower > image.height() {
        return Err(ProcessError::InvalidParameter(format!(
            "crop box {} exceeds image bounds {}x{}",
            bx,
            image.width(),
            image.height()
        )));
    }
    Ok(image.crop_imm(bx.left, bx.upper, bx.width(), bx.height()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn gradient(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            image::Rgb([(x * 17 % 256) as u8, (y * 29 % 256) as u8, 128])
        }))
    }

    fn params_with(width: Option<u32>, height: Option<u32>, scale: Option<f32>) -> ProcessParams {
        ProcessParams {
            width,
            height,
            scale,
            ..ProcessParams::default()
        }
    }

    #[test]
    fn resize_scale_floors_both_dimensions() {
        let out = resize(gradient(5, 3), &params_with(None, None, Some(0.5))).unwrap();
        assert_eq!((out.width(), out.height()), (2, 1));
    }

    #[test]
    fn resize_scale_takes_priority_over_dimensions() {
        let out = resize(gradient(10, 10), &params_with(Some(3), Some(3), Some(2.0))).unwrap();
        assert_eq!((out.width(), out.height()), (20, 20));
    }

    #[test]
    fn resize_width_only_preserves_aspect_ratio() {
        let out = resize(gradient(100, 50), &params_with(Some(40), None, None)).unwrap();
        assert_eq!((out.width(), out.height()), (40, 20));
    }

    #[test]
    fn resize_height_only_preserves_aspect_ratio() {
        let out = resize(gradient(100, 50), &params_with(None, Some(25), None)).unwrap();
        assert_eq!((out.width(), out.height()), (50, 25));
    }

    #[test]
    fn resize_exact_box_ignores_aspect_ratio() {
        let out = resize(gradient(100, 50), &params_with(Some(30), Some(30), None)).unwrap();
        assert_eq!((out.width(), out.height()), (30, 30));
    }

    #[test]
    fn resize_without_parameters_is_a_no_op() {
        let image = gradient(8, 8);
        let out = resize(image.clone(), &params_with(None, None, None)).unwrap();
        assert_eq!(out.to_rgb8().as_raw(), image.to_rgb8().as_raw());
    }

    #[test]
    fn resize_to_zero_is_an_error() {
        let err = resize(gradient(10, 10), &params_with(None, None, Some(0.01))).unwrap_err();
        assert!(matches!(err, ProcessError::InvalidParameter(_)));
    }

    #[test]
    fn flip_twice_restores_the_original() {
        let image = gradient(7, 5);
        let twice = flip(flip(image.clone(), FlipMode::Horizontal), FlipMode::Horizontal);
        assert_eq!(twice.to_rgb8().as_raw(), image.to_rgb8().as_raw());

        let twice = flip(flip(image.clone(), FlipMode::Vertical), FlipMode::Vertical);
        assert_eq!(twice.to_rgb8().as_raw(), image.to_rgb8().as_raw());
    }

    #[test]
    fn crop_full_image_is_identity() {
        let image = gradient(6, 4);
        let bx = CropBox {
            left: 0,
            upper: 0,
            right: 6,
            lower: 4,
        };
        let out = crop(image.clone(), Some(bx)).unwrap();
        assert_eq!(out.to_rgb8().as_raw(), image.to_rgb8().as_raw());
    }

    #[test]
    fn crop_without_box_is_a_no_op() {
        let image = gradient(6, 4);
        let out = crop(image.clone(), None).unwrap();
        assert_eq!((out.width(), out.height()), (6, 4));
    }

    #[test]
    fn crop_outside_bounds_is_an_error() {
        let bx = CropBox {
            left: 0,
            upper: 0,
            right: 10,
            lower: 10,
        };
        assert!(crop(gradient(6, 4), Some(bx)).is_err());
    }

    #[test]
    fn rotate_zero_degrees_is_a_no_op() {
        let image = gradient(6, 4);
        let out = rotate(
            image.clone(),
            &RotateParams {
                degrees: 0.0,
                expand: true,
            },
        )
        .unwrap();
        assert_eq!(out.to_rgb8().as_raw(), image.to_rgb8().as_raw());
    }

    #[test]
    fn rotate_90_with_expand_swaps_dimensions() {
        let out = rotate(
            gradient(6, 4),
            &RotateParams {
                degrees: 90.0,
                expand: true,
            },
        )
        .unwrap();
        assert_eq!((out.width(), out.height()), (4, 6));
    }

    #[test]
    fn rotate_45_with_expand_grows_the_canvas() {
        let out = rotate(
            gradient(10, 10),
            &RotateParams {
                degrees: 45.0,
                expand: true,
            },
        )
        .unwrap();
        assert!(out.width() > 10 && out.height() > 10);
    }

    #[test]
    fn rotate_45_without_expand_keeps_the_canvas() {
        let out = rotate(
            gradient(10, 10),
            &RotateParams {
                degrees: 45.0,
                expand: false,
            },
        )
        .unwrap();
        assert_eq!((out.width(), out.height()), (10, 10));
    }
}
