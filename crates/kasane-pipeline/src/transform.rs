//! Whole-raster geometric transforms.
//!
//! These rewrite the source raster itself rather than appearing in the
//! operation list, so the session drops the entire stage cache after
//! applying one. Rotations are clockwise.

use crate::types::RgbaImage;

/// Rotate a quarter turn clockwise. Width and height swap.
#[must_use]
pub fn rotate90(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    RgbaImage::from_fn(height, width, |x, y| *image.get_pixel(y, height - 1 - x))
}

/// Rotate a half turn.
#[must_use]
pub fn rotate180(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    RgbaImage::from_fn(width, height, |x, y| {
        *image.get_pixel(width - 1 - x, height - 1 - y)
    })
}

/// Rotate three quarter turns clockwise. Width and height swap.
#[must_use]
pub fn rotate270(image: &RgbaImage) -> RgbaImage {
    let (width, _) = image.dimensions();
    RgbaImage::from_fn(image.height(), width, |x, y| {
        *image.get_pixel(width - 1 - y, x)
    })
}

/// Flip top to bottom: row order reverses.
#[must_use]
pub fn mirror_vertical(image: &RgbaImage) -> RgbaImage {
    let height = image.height();
    RgbaImage::from_fn(image.width(), height, |x, y| {
        *image.get_pixel(x, height - 1 - y)
    })
}

/// Flip left to right: column order reverses.
#[must_use]
pub fn mirror_horizontal(image: &RgbaImage) -> RgbaImage {
    let width = image.width();
    RgbaImage::from_fn(width, image.height(), |x, y| {
        *image.get_pixel(width - 1 - x, y)
    })
}
