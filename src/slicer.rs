//! Cuts a composite grid image into its individual cells.

use crate::error::{GridError, Result};
use crate::imaging::{decode_base64_image, encode_png_base64};
use crate::models::GenerationResult;
use image::{DynamicImage, GenericImageView};

/// Crops `image` into `rows * cols` equal cells, row-major.
///
/// Each cell is `floor(width / cols)` x `floor(height / rows)` pixels. Any
/// remainder on the right or bottom edge is discarded. Pixels are copied,
/// never resampled.
pub fn slice_image(image: &DynamicImage, rows: u32, cols: u32) -> Result<Vec<DynamicImage>> {
    if rows == 0 || cols == 0 {
        return Err(GridError::ConfigError(format!(
            "cannot slice into {}x{} cells",
            rows, cols
        )));
    }

    let (width, height) = image.dimensions();
    let cell_w = width / cols;
    let cell_h = height / rows;
    if cell_w == 0 || cell_h == 0 {
        return Err(GridError::ConfigError(format!(
            "image {}x{} is too small for a {}x{} grid",
            width, height, rows, cols
        )));
    }

    let mut slices = Vec::with_capacity((rows * cols) as usize);
    for row in 0..rows {
        for col in 0..cols {
            slices.push(image.crop_imm(col * cell_w, row * cell_h, cell_w, cell_h));
        }
    }

    log::debug!(
        "Sliced {}x{} image into {} cells of {}x{}",
        width,
        height,
        slices.len(),
        cell_w,
        cell_h
    );
    Ok(slices)
}

/// Decodes a base64 image, slices it and re-encodes each cell as PNG base64.
pub fn slice_base64(data: &str, rows: u32, cols: u32) -> Result<Vec<String>> {
    let image = decode_base64_image(data)?;
    slice_image(&image, rows, cols)?
        .iter()
        .map(encode_png_base64)
        .collect()
}

/// Splits a generation result into per-asset images. A single-asset result
/// is passed through untouched.
pub fn split_composite(result: &GenerationResult) -> Result<Vec<String>> {
    let grid = result.grid_size.value();
    if grid == 1 {
        return Ok(vec![result.image_base64.clone()]);
    }
    slice_base64(&result.image_base64, grid, grid)
}
