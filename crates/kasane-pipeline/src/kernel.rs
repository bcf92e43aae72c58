//! Convolution kernel construction.
//!
//! Each convolution operation kind maps to a fixed kernel shape whose
//! spatial extent scales with the requested size: a box blur of size 5
//! is a 5x5 uniform matrix, a size-7 emboss widens the relief radius,
//! and so on. Kernels carry integer weights plus a normalization
//! divisor, and an output bias for kinds whose weights sum to zero
//! (relief output is centered on mid-grey).
//!
//! Blur kinds normalize so a uniform input image is unchanged; edge and
//! outline kinds sum to zero so uniform input maps to zero (plus bias).

use serde::{Deserialize, Serialize};

use crate::types::PipelineError;

/// Largest accepted kernel edge length.
///
/// Bounds per-pixel convolution cost and keeps every edge-kernel weight
/// inside `i32`: at size 29 the largest product of a binomial smoothing
/// weight and a derivative offset is `C(28, 14) * 14 = 561_632_400`.
pub const MAX_KERNEL_SIZE: u32 = 29;

/// The shape of a convolution kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelKind {
    /// Uniform average over the full neighborhood.
    Box,
    /// Average along the main diagonal.
    Motion,
    /// High-pass: negative ring, amplified center, weights sum to one.
    Sharpen,
    /// Directional relief gradient, output biased around mid-grey.
    Emboss,
    /// Sobel-style smoothing x derivative, derivative across columns.
    EdgesHorizontal,
    /// Sobel-style smoothing x derivative, derivative across rows.
    EdgesVertical,
    /// Laplacian: negative ring, center balances to zero sum.
    Outline,
}

/// A square convolution kernel: integer weights in row-major order, a
/// normalization divisor, and an additive output bias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kernel {
    size: usize,
    weights: Vec<i32>,
    divisor: i32,
    bias: i32,
}

impl Kernel {
    /// Build the kernel for `kind` with edge length `size`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidKernelSize`] unless `size` is a
    /// positive odd integer no larger than [`MAX_KERNEL_SIZE`]. Even
    /// sizes have no well-defined center pixel.
    pub fn build(kind: KernelKind, size: u32) -> Result<Self, PipelineError> {
        if size == 0 || size % 2 == 0 || size > MAX_KERNEL_SIZE {
            return Err(PipelineError::InvalidKernelSize(size));
        }
        let n = size as usize;
        let center = n / 2;
        let mut weights = vec![0i32; n * n];
        let mut divisor = 1i32;
        let mut bias = 0i32;

        #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
        match kind {
            KernelKind::Box => {
                weights.fill(1);
                divisor = (n * n) as i32;
            }
            KernelKind::Motion => {
                for i in 0..n {
                    weights[i * n + i] = 1;
                }
                divisor = n as i32;
            }
            KernelKind::Sharpen => {
                weights.fill(-1);
                weights[center * n + center] = (n * n) as i32;
            }
            KernelKind::Outline => {
                weights.fill(-1);
                weights[center * n + center] = (n * n) as i32 - 1;
            }
            KernelKind::Emboss => {
                for i in 0..n {
                    for j in 0..n {
                        weights[i * n + j] = (i as i32 - center as i32) + (j as i32 - center as i32);
                    }
                }
                bias = 128;
            }
            KernelKind::EdgesHorizontal | KernelKind::EdgesVertical => {
                let smooth = binomial_row(n);
                for i in 0..n {
                    for j in 0..n {
                        let derivative = center as i32 - j as i32;
                        weights[i * n + j] = match kind {
                            KernelKind::EdgesHorizontal => smooth[i] * derivative,
                            _ => smooth[j] * (center as i32 - i as i32),
                        };
                    }
                }
            }
        }

        Ok(Self {
            size: n,
            weights,
            divisor,
            bias,
        })
    }

    /// Kernel edge length.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// The weight at `(row, col)`, or zero when out of range.
    #[must_use]
    pub fn weight(&self, row: usize, col: usize) -> i32 {
        if row < self.size && col < self.size {
            self.weights[row * self.size + col]
        } else {
            0
        }
    }

    /// Row-major weights.
    #[must_use]
    pub fn weights(&self) -> &[i32] {
        &self.weights
    }

    /// Normalization divisor (always positive).
    #[must_use]
    pub const fn divisor(&self) -> i32 {
        self.divisor
    }

    /// Additive output bias applied after normalization.
    #[must_use]
    pub const fn bias(&self) -> i32 {
        self.bias
    }

    /// Sum of all weights. Blur kinds equal the divisor; edge kinds are
    /// zero.
    #[must_use]
    pub fn weight_sum(&self) -> i32 {
        self.weights.iter().sum()
    }
}

/// Row `n - 1` of Pascal's triangle, the binomial smoothing weights used
/// by the Sobel-style edge kernels (`[1, 2, 1]` for size 3).
fn binomial_row(n: usize) -> Vec<i32> {
    let mut row = vec![0i32; n];
    row[0] = 1;
    for i in 1..n {
        for j in (1..=i).rev() {
            row[j] += row[j - 1];
        }
    }
    row
}
