//! The pixel transform library: pure functions implementing each
//! operation kind over an RGBA raster.
//!
//! Point operations (brightness, contrast, saturation, tint, greyscale,
//! negative, sepia) map each pixel independently. Convolution
//! operations sample a `kernel_size` x `kernel_size` neighborhood with
//! border-clamped coordinates. Every function returns a new image; the
//! input is never mutated, so stages never observe aliasing.
//!
//! Channel values are clamped to `[0, 255]` after each formula. Alpha
//! is carried through from the source pixel unchanged, matching the
//! behavior of every operation in the reference implementation.
//!
//! Convolution is row-parallel via rayon. Rows are reassembled in
//! row-major order, so output bytes are independent of scheduling.

use rayon::prelude::*;

use crate::kernel::{Kernel, KernelKind};
use crate::types::{OperationDescriptor, PipelineError, Rgb, RgbaImage};

/// Rec. 601 luma weights used by greyscale and saturation.
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Clamp a channel value to `[0, 255]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_channel(value: f32) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

fn luma(r: u8, g: u8, b: u8) -> f32 {
    LUMA_B.mul_add(
        f32::from(b),
        LUMA_R.mul_add(f32::from(r), LUMA_G * f32::from(g)),
    )
}

/// Apply a per-pixel channel map, preserving alpha.
fn map_pixels(image: &RgbaImage, f: impl Fn([u8; 4]) -> [u8; 4]) -> RgbaImage {
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        image::Rgba(f(image.get_pixel(x, y).0))
    })
}

/// Add `level` to every color channel.
#[must_use]
pub fn brightness(image: &RgbaImage, level: i32) -> RgbaImage {
    let add = |c: u8| {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let v = (i32::from(c) + level).clamp(0, 255) as u8;
        v
    };
    map_pixels(image, |[r, g, b, a]| [add(r), add(g), add(b), a])
}

/// Scale channel distance from mid-grey by the standard contrast factor
/// `(259 * (level + 255)) / (255 * (259 - level))`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn contrast(image: &RgbaImage, level: i32) -> RgbaImage {
    let l = level as f32;
    let factor = (259.0 * (l + 255.0)) / (255.0 * (259.0 - l));
    let adjust = |c: u8| clamp_channel(factor.mul_add(f32::from(c) - 128.0, 128.0));
    map_pixels(image, |[r, g, b, a]| [adjust(r), adjust(g), adjust(b), a])
}

/// Interpolate each channel between the pixel's luminance and its
/// original value. `level` 0 is the identity; -100 collapses to
/// greyscale; +100 doubles the distance from luminance.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn saturation(image: &RgbaImage, level: i32) -> RgbaImage {
    let factor = (level + 100) as f32 / 100.0;
    map_pixels(image, |[r, g, b, a]| {
        let l = luma(r, g, b);
        let mix = |c: u8| clamp_channel(f32::from(c).mul_add(factor, l * (1.0 - factor)));
        [mix(r), mix(g), mix(b), a]
    })
}

/// Blend each channel toward `color` by `level / 100`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn tint(image: &RgbaImage, level: i32, color: Rgb) -> RgbaImage {
    let t = (level as f32 / 100.0).clamp(0.0, 1.0);
    let blend =
        |c: u8, target: u8| clamp_channel(f32::from(c).mul_add(1.0 - t, f32::from(target) * t));
    map_pixels(image, |[r, g, b, a]| {
        [
            blend(r, color.r),
            blend(g, color.g),
            blend(b, color.b),
            a,
        ]
    })
}

/// Replace every channel with the pixel's Rec. 601 luminance.
#[must_use]
pub fn greyscale(image: &RgbaImage) -> RgbaImage {
    map_pixels(image, |[r, g, b, a]| {
        let grey = clamp_channel(luma(r, g, b));
        [grey, grey, grey, a]
    })
}

/// Invert every color channel.
#[must_use]
pub fn negative(image: &RgbaImage) -> RgbaImage {
    map_pixels(image, |[r, g, b, a]| [255 - r, 255 - g, 255 - b, a])
}

/// Apply the standard sepia channel-mixing matrix.
#[must_use]
pub fn sepia(image: &RgbaImage) -> RgbaImage {
    map_pixels(image, |[r, g, b, a]| {
        let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
        [
            clamp_channel(r.mul_add(0.393, g.mul_add(0.769, b * 0.189))),
            clamp_channel(r.mul_add(0.349, g.mul_add(0.686, b * 0.168))),
            clamp_channel(r.mul_add(0.272, g.mul_add(0.534, b * 0.131))),
            a,
        ]
    })
}

/// Clamp a neighbor coordinate to the image edge.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_coord(v: i64, max: u32) -> u32 {
    v.clamp(0, i64::from(max) - 1) as u32
}

/// Convolve the image with `kernel`, sampling out-of-bounds neighbors
/// at the nearest edge pixel.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]
pub fn convolve(image: &RgbaImage, kernel: &Kernel) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }
    let n = kernel.size();
    let half = (n / 2) as i64;
    let divisor = kernel.divisor() as f32;
    let bias = kernel.bias() as f32;
    let weights = kernel.weights();

    let row_len = width as usize * 4;
    let mut out = vec![0u8; image.as_raw().len()];
    out.par_chunks_exact_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width as usize {
                let mut sum = [0.0f32; 3];
                for ky in 0..n {
                    let sy = clamp_coord(y as i64 + ky as i64 - half, height);
                    for kx in 0..n {
                        let w = weights[ky * n + kx];
                        if w == 0 {
                            continue;
                        }
                        let w = w as f32;
                        let sx = clamp_coord(x as i64 + kx as i64 - half, width);
                        let p = image.get_pixel(sx, sy).0;
                        sum[0] = w.mul_add(f32::from(p[0]), sum[0]);
                        sum[1] = w.mul_add(f32::from(p[1]), sum[1]);
                        sum[2] = w.mul_add(f32::from(p[2]), sum[2]);
                    }
                }
                let alpha = image.get_pixel(x as u32, y as u32).0[3];
                let base = x * 4;
                row[base] = clamp_channel(sum[0] / divisor + bias);
                row[base + 1] = clamp_channel(sum[1] / divisor + bias);
                row[base + 2] = clamp_channel(sum[2] / divisor + bias);
                row[base + 3] = alpha;
            }
        });

    // The buffer was sized from the source image, so reconstruction
    // cannot fail.
    #[allow(clippy::unreachable)]
    RgbaImage::from_raw(width, height, out)
        .unwrap_or_else(|| unreachable!("output buffer length matches source dimensions"))
}

/// Apply one operation descriptor to an image, producing a new image.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidKernelSize`] if a convolution
/// descriptor carries an invalid kernel size. Descriptors admitted
/// through [`OperationDescriptor::validate`] never fail here.
pub fn apply(
    descriptor: OperationDescriptor,
    image: &RgbaImage,
) -> Result<RgbaImage, PipelineError> {
    let convolved = |kind: KernelKind, size: u32| -> Result<RgbaImage, PipelineError> {
        Ok(convolve(image, &Kernel::build(kind, size)?))
    };
    match descriptor {
        OperationDescriptor::Brightness { level } => Ok(brightness(image, level)),
        OperationDescriptor::Contrast { level } => Ok(contrast(image, level)),
        OperationDescriptor::Saturation { level } => Ok(saturation(image, level)),
        OperationDescriptor::Tint { level, color } => Ok(tint(image, level, color)),
        OperationDescriptor::Greyscale => Ok(greyscale(image)),
        OperationDescriptor::Negative => Ok(negative(image)),
        OperationDescriptor::Sepia => Ok(sepia(image)),
        OperationDescriptor::BoxBlur { kernel_size } => convolved(KernelKind::Box, kernel_size),
        OperationDescriptor::MotionBlur { kernel_size } => {
            convolved(KernelKind::Motion, kernel_size)
        }
        OperationDescriptor::Sharpen { kernel_size } => convolved(KernelKind::Sharpen, kernel_size),
        OperationDescriptor::Emboss { kernel_size } => convolved(KernelKind::Emboss, kernel_size),
        OperationDescriptor::EdgesHorizontal { kernel_size } => {
            convolved(KernelKind::EdgesHorizontal, kernel_size)
        }
        OperationDescriptor::EdgesVertical { kernel_size } => {
            convolved(KernelKind::EdgesVertical, kernel_size)
        }
        OperationDescriptor::Outline { kernel_size } => convolved(KernelKind::Outline, kernel_size),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, px: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, image::Rgba(px))
    }

    #[test]
    fn brightness_adds_and_clamps() {
        let img = solid(2, 2, [200, 100, 0, 255]);
        let out = brightness(&img, 80);
        assert_eq!(out.get_pixel(0, 0).0, [255, 180, 80, 255]);

        let out = brightness(&img, -120);
        assert_eq!(out.get_pixel(1, 1).0, [80, 0, 0, 255]);
    }

    #[test]
    fn brightness_zero_is_identity() {
        let img = solid(3, 3, [12, 34, 56, 200]);
        assert_eq!(brightness(&img, 0), img);
    }

    #[test]
    fn contrast_zero_is_identity() {
        // factor = (259*255)/(255*259) = 1 exactly.
        let img = solid(2, 2, [7, 128, 250, 255]);
        assert_eq!(contrast(&img, 0), img);
    }

    #[test]
    fn contrast_positive_pushes_away_from_mid_grey() {
        let img = solid(1, 1, [200, 60, 128, 255]);
        let out = contrast(&img, 100).get_pixel(0, 0).0;
        assert!(out[0] > 200, "bright channel got brighter: {}", out[0]);
        assert!(out[1] < 60, "dark channel got darker: {}", out[1]);
        assert_eq!(out[2], 128, "mid-grey is a fixed point");
    }

    #[test]
    fn saturation_zero_is_identity() {
        let img = solid(2, 2, [180, 90, 30, 255]);
        assert_eq!(saturation(&img, 0), img);
    }

    #[test]
    fn saturation_minus_hundred_is_greyscale() {
        let img = solid(2, 2, [180, 90, 30, 255]);
        assert_eq!(saturation(&img, -100), greyscale(&img));
    }

    #[test]
    fn saturation_preserves_grey_pixels() {
        let img = solid(2, 2, [100, 100, 100, 255]);
        assert_eq!(saturation(&img, 80), img);
    }

    #[test]
    fn tint_zero_is_identity_and_hundred_is_target() {
        let img = solid(2, 2, [10, 20, 30, 200]);
        let color = Rgb::new(250, 150, 50);
        assert_eq!(tint(&img, 0, color), img);

        let out = tint(&img, 100, color);
        assert_eq!(out.get_pixel(0, 0).0, [250, 150, 50, 200]);
    }

    #[test]
    fn greyscale_uses_rec601_weights() {
        let img = solid(1, 1, [255, 0, 0, 255]);
        let out = greyscale(&img).get_pixel(0, 0).0;
        // 0.299 * 255 = 76.245
        assert_eq!(out, [76, 76, 76, 255]);
    }

    #[test]
    fn negative_inverts_channels_not_alpha() {
        let img = solid(1, 1, [0, 128, 255, 200]);
        let out = negative(&img).get_pixel(0, 0).0;
        assert_eq!(out, [255, 127, 0, 200]);
    }

    #[test]
    fn sepia_matches_reference_matrix() {
        let img = solid(1, 1, [100, 150, 200, 255]);
        let out = sepia(&img).get_pixel(0, 0).0;
        // r' = 100*0.393 + 150*0.769 + 200*0.189 = 192.45
        // g' = 100*0.349 + 150*0.686 + 200*0.168 = 171.4
        // b' = 100*0.272 + 150*0.534 + 200*0.131 = 133.5
        assert_eq!(out, [192, 171, 133, 255]);
    }

    #[test]
    fn sepia_clamps_bright_pixels() {
        let img = solid(1, 1, [255, 255, 255, 255]);
        let out = sepia(&img).get_pixel(0, 0).0;
        assert_eq!(out[0], 255);
    }

    #[test]
    fn box_blur_leaves_uniform_image_unchanged() {
        for size in [3, 5, 7] {
            let img = solid(9, 9, [90, 140, 200, 255]);
            let k = Kernel::build(KernelKind::Box, size).unwrap();
            assert_eq!(convolve(&img, &k), img, "kernel size {size}");
        }
    }

    #[test]
    fn motion_blur_leaves_uniform_image_unchanged() {
        let img = solid(6, 6, [33, 66, 99, 255]);
        let k = Kernel::build(KernelKind::Motion, 5).unwrap();
        assert_eq!(convolve(&img, &k), img);
    }

    #[test]
    fn sharpen_leaves_flat_regions_unchanged() {
        let img = solid(8, 8, [120, 60, 180, 255]);
        let k = Kernel::build(KernelKind::Sharpen, 3).unwrap();
        assert_eq!(convolve(&img, &k), img);
    }

    #[test]
    fn edges_are_zero_on_uniform_input() {
        let img = solid(8, 8, [120, 120, 120, 255]);
        for kind in [
            KernelKind::EdgesHorizontal,
            KernelKind::EdgesVertical,
            KernelKind::Outline,
        ] {
            let k = Kernel::build(kind, 3).unwrap();
            let out = convolve(&img, &k);
            assert_eq!(out.get_pixel(4, 4).0, [0, 0, 0, 255], "{kind:?}");
        }
    }

    #[test]
    fn emboss_maps_uniform_input_to_mid_grey() {
        let img = solid(8, 8, [37, 210, 99, 255]);
        let k = Kernel::build(KernelKind::Emboss, 3).unwrap();
        let out = convolve(&img, &k);
        assert_eq!(out.get_pixel(4, 4).0, [128, 128, 128, 255]);
    }

    #[test]
    fn convolution_clamps_at_borders() {
        // Left half black, right half white; a box blur must produce
        // intermediate values at the boundary but keep far corners pure
        // because out-of-bounds samples clamp to the edge pixel.
        let img = RgbaImage::from_fn(10, 10, |x, _| {
            if x < 5 {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        });
        let k = Kernel::build(KernelKind::Box, 3).unwrap();
        let out = convolve(&img, &k);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(9, 9).0, [255, 255, 255, 255]);
        let boundary = out.get_pixel(4, 5).0[0];
        assert!(
            boundary > 0 && boundary < 255,
            "expected intermediate value at boundary, got {boundary}",
        );
    }

    #[test]
    fn convolution_preserves_alpha() {
        let img = solid(5, 5, [10, 20, 30, 42]);
        let k = Kernel::build(KernelKind::Box, 3).unwrap();
        assert_eq!(convolve(&img, &k).get_pixel(2, 2).0[3], 42);
    }

    #[test]
    fn apply_dispatches_every_kind() {
        let img = solid(4, 4, [50, 100, 150, 255]);
        let descriptors = [
            OperationDescriptor::Brightness { level: 10 },
            OperationDescriptor::Contrast { level: 10 },
            OperationDescriptor::Saturation { level: 10 },
            OperationDescriptor::Tint {
                level: 10,
                color: Rgb::new(255, 0, 0),
            },
            OperationDescriptor::Greyscale,
            OperationDescriptor::Negative,
            OperationDescriptor::Sepia,
            OperationDescriptor::BoxBlur { kernel_size: 3 },
            OperationDescriptor::MotionBlur { kernel_size: 3 },
            OperationDescriptor::Sharpen { kernel_size: 3 },
            OperationDescriptor::Emboss { kernel_size: 3 },
            OperationDescriptor::EdgesHorizontal { kernel_size: 3 },
            OperationDescriptor::EdgesVertical { kernel_size: 3 },
            OperationDescriptor::Outline { kernel_size: 3 },
        ];
        for d in descriptors {
            let out = apply(d, &img).unwrap();
            assert_eq!(out.dimensions(), img.dimensions(), "{:?}", d.kind());
        }
    }

    #[test]
    fn apply_rejects_invalid_kernel_size() {
        let img = solid(2, 2, [0, 0, 0, 255]);
        let result = apply(OperationDescriptor::BoxBlur { kernel_size: 2 }, &img);
        assert!(matches!(result, Err(PipelineError::InvalidKernelSize(2))));
    }
}
