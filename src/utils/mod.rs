// batchpix/src/utils/mod.rs
use crate::core::{ProcessError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Extensions accepted during input enumeration (case-insensitive).
pub const SUPPORTED_INPUT_EXTENSIONS: [&str; 7] =
    ["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff"];

pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_INPUT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let base = 1024_f64;
    let bytes_f64 = bytes as f64;
    let exponent = (bytes_f64.log10() / base.log10()).floor() as i32;
    let exponent = exponent.clamp(0, UNITS.len() as i32 - 1);
    let size = bytes_f64 / base.powi(exponent);

    format!("{:.2} {}", size, UNITS[exponent as usize])
}

/// Parse `#RRGGBB` or `RRGGBB` into an RGB triple.
pub fn hex_to_rgb(hex: &str) -> Result<[u8; 3]> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(ProcessError::InvalidParameter(format!(
            "color must be #RRGGBB, got {hex:?}"
        )));
    }

    let mut channels = [0u8; 3];
    for (slot, chunk) in channels
        .iter_mut()
        .zip([&hex[0..2], &hex[2..4], &hex[4..6]])
    {
        *slot = u8::from_str_radix(chunk, 16).map_err(|_| {
            ProcessError::InvalidParameter(format!("invalid hex color: {hex:?}"))
        })?;
    }
    Ok(channels)
}

/// Width, height and detected format for one image, from the header only.
pub fn get_image_info(path: &Path) -> Result<(u32, u32, String)> {
    let reader = image::ImageReader::open(path)?.with_guessed_format()?;
    let format = reader
        .format()
        .map(format_name)
        .unwrap_or_else(|| "Unknown".to_string());
    let (width, height) = reader.into_dimensions()?;
    Ok((width, height, format))
}

fn format_name(format: image::ImageFormat) -> String {
    match format {
        image::ImageFormat::Jpeg => "JPEG".to_string(),
        image::ImageFormat::Png => "PNG".to_string(),
        image::ImageFormat::Gif => "GIF".to_string(),
        image::ImageFormat::Bmp => "BMP".to_string(),
        image::ImageFormat::WebP => "WebP".to_string(),
        image::ImageFormat::Tiff => "TIFF".to_string(),
        other => format!("{other:?}"),
    }
}

/// Probe the platform font directories for a usable TrueType font, the
/// same way a desktop front-end would pick its default label font.
pub fn find_system_font() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        let fonts_dir = PathBuf::from(env::var_os("WINDIR")?).join("Fonts");
        return first_existing(&fonts_dir, &["arial.ttf", "segoeui.ttf", "verdana.ttf"]);
    }

    if cfg!(target_os = "macos") {
        for (dir, names) in [
            ("/System/Library/Fonts", &["Helvetica.ttc", "Geneva.ttf"][..]),
            ("/Library/Fonts", &["Arial.ttf"][..]),
        ] {
            if let Some(found) = first_existing(Path::new(dir), names) {
                return Some(found);
            }
        }
        return None;
    }

    for (dir, names) in [
        ("/usr/share/fonts/truetype/dejavu", &["DejaVuSans.ttf"][..]),
        (
            "/usr/share/fonts/truetype/liberation",
            &["LiberationSans-Regular.ttf"][..],
        ),
        ("/usr/share/fonts/TTF", &["DejaVuSans.ttf"][..]),
    ] {
        if let Some(found) = first_existing(Path::new(dir), names) {
            return Some(found);
        }
    }
    None
}

fn first_existing(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    names
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}
