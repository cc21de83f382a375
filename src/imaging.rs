//! Image codec helpers: base64 <-> pixel buffers, reference image loading,
//! thumbnails and upload-size compression.

use crate::error::{GridError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::path::Path;

/// Default upload ceiling for reference images.
pub const MAX_REFERENCE_BYTES: usize = 3 * 1024 * 1024;

const MAX_COMPRESS_DIMENSION: u32 = 2048;

/// Drops a leading `data:<mime>;base64,` header if present.
pub fn strip_data_uri_prefix(data: &str) -> &str {
    let trimmed = data.trim();
    if trimmed.starts_with("data:") {
        if let Some((_, payload)) = trimmed.split_once(',') {
            return payload;
        }
    }
    trimmed
}

pub fn decode_base64_image(data: &str) -> Result<DynamicImage> {
    let bytes = BASE64.decode(strip_data_uri_prefix(data).as_bytes())?;
    Ok(image::load_from_memory(&bytes)?)
}

pub fn encode_png_base64(image: &DynamicImage) -> Result<String> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(BASE64.encode(buffer.into_inner()))
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let rgb = image.to_rgb8();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder.encode_image(&rgb)?;
    Ok(bytes)
}

/// Approximate decoded size of a base64 payload.
pub fn decoded_len(base64_data: &str) -> usize {
    (base64_data.len() * 3).div_ceil(4)
}

pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => "image/png",
    }
}

/// Reads an image file into base64 (no data-URI prefix) plus its MIME type.
pub fn file_to_base64(path: &Path) -> Result<(String, &'static str)> {
    let bytes = std::fs::read(path)
        .map_err(|e| GridError::IoError(format!("failed to read {}: {}", path.display(), e)))?;
    if image::guess_format(&bytes).is_err() {
        return Err(GridError::ImageError(format!(
            "{} is not a supported image file",
            path.display()
        )));
    }
    Ok((BASE64.encode(bytes), mime_for_path(path)))
}

/// Writes decoded base64 image bytes to `path` without re-encoding.
pub fn save_base64_image(path: &Path, data: &str) -> Result<()> {
    let bytes = BASE64.decode(strip_data_uri_prefix(data).as_bytes())?;
    std::fs::write(path, bytes)
        .map_err(|e| GridError::IoError(format!("failed to write {}: {}", path.display(), e)))
}

/// Aspect-preserving thumbnail whose longest side is at most `max_side`.
/// Images already within bounds are re-encoded at their original size.
pub fn thumbnail_base64(data: &str, max_side: u32) -> Result<String> {
    let image = decode_base64_image(data)?;
    let (width, height) = image.dimensions();
    let thumb = if width.max(height) > max_side {
        image.thumbnail(max_side, max_side)
    } else {
        image
    };
    encode_png_base64(&thumb)
}

/// Shrinks a base64 image until its decoded size fits in `max_bytes`.
///
/// The returned MIME type is `None` when the input already fits and is
/// returned unchanged. Otherwise the output is JPEG: quality steps down from
/// 90 to 30, then the scale steps down to 30% with quality reset to 80. If
/// even the smallest attempt is too large, that attempt is returned.
pub fn compress_to_size(data: &str, max_bytes: usize) -> Result<(String, Option<&'static str>)> {
    let payload = strip_data_uri_prefix(data);
    let original_len = decoded_len(payload);
    if original_len <= max_bytes {
        return Ok((payload.to_string(), None));
    }

    log::info!(
        "Compressing reference image: {:.2} MB exceeds {:.2} MB",
        original_len as f64 / 1_048_576.0,
        max_bytes as f64 / 1_048_576.0
    );

    let image = decode_base64_image(payload)?;
    let (width, height) = image.dimensions();

    let mut scale_pct: u32 = 100;
    if width > MAX_COMPRESS_DIMENSION || height > MAX_COMPRESS_DIMENSION {
        let longest = width.max(height);
        scale_pct = (MAX_COMPRESS_DIMENSION * 100 / longest).max(1);
    }
    let mut quality: u8 = 90;

    loop {
        let target_w = (width * scale_pct / 100).max(1);
        let target_h = (height * scale_pct / 100).max(1);
        let scaled = if scale_pct == 100 {
            image.clone()
        } else {
            image.resize_exact(target_w, target_h, FilterType::Triangle)
        };

        let bytes = encode_jpeg(&scaled, quality)?;
        if bytes.len() <= max_bytes {
            log::info!(
                "Compressed reference image to {:.2} MB (quality {}%, scale {}%)",
                bytes.len() as f64 / 1_048_576.0,
                quality,
                scale_pct
            );
            return Ok((BASE64.encode(bytes), Some("image/jpeg")));
        }

        if quality > 30 {
            quality -= 10;
        } else if scale_pct > 30 {
            scale_pct -= 10;
            quality = 80;
        } else {
            log::warn!(
                "Reference image still {:.2} MB at minimum quality and scale",
                bytes.len() as f64 / 1_048_576.0
            );
            return Ok((BASE64.encode(bytes), Some("image/jpeg")));
        }
    }
}
