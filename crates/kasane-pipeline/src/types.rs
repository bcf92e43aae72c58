//! Shared types for the kasane operation pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates can reference raster data
/// without depending on `image` directly.
pub use image::RgbaImage;

/// An 8-bit RGB color, used by the tint operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Create a new color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of the given image.
    #[must_use]
    pub fn of(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// The kind of a pipeline operation, without its parameters.
///
/// Used for kind comparisons (e.g. rejecting an update whose descriptor
/// does not match the entry being updated) and for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Additive per-channel brightness adjustment.
    Brightness,
    /// Contrast adjustment around mid-grey.
    Contrast,
    /// Saturation adjustment relative to pixel luminance.
    Saturation,
    /// Blend toward a fixed color.
    Tint,
    /// Luminance-weighted greyscale conversion.
    Greyscale,
    /// Per-channel inversion.
    Negative,
    /// Fixed sepia channel-mixing matrix.
    Sepia,
    /// Unweighted neighborhood average.
    BoxBlur,
    /// Average along the main diagonal of the neighborhood.
    MotionBlur,
    /// High-pass sharpening kernel.
    Sharpen,
    /// Directional relief kernel biased around mid-grey.
    Emboss,
    /// Sobel-style gradient, horizontal derivative.
    EdgesHorizontal,
    /// Sobel-style gradient, vertical derivative.
    EdgesVertical,
    /// Laplacian-style discontinuity highlight.
    Outline,
}

impl OperationKind {
    /// Human-readable name of this kind (e.g. `"box_blur"`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Brightness => "brightness",
            Self::Contrast => "contrast",
            Self::Saturation => "saturation",
            Self::Tint => "tint",
            Self::Greyscale => "greyscale",
            Self::Negative => "negative",
            Self::Sepia => "sepia",
            Self::BoxBlur => "box_blur",
            Self::MotionBlur => "motion_blur",
            Self::Sharpen => "sharpen",
            Self::Emboss => "emboss",
            Self::EdgesHorizontal => "edges_horizontal",
            Self::EdgesVertical => "edges_vertical",
            Self::Outline => "outline",
        }
    }

    /// Whether this kind runs a neighborhood convolution (and therefore
    /// carries a kernel size).
    #[must_use]
    pub const fn is_convolution(self) -> bool {
        matches!(
            self,
            Self::BoxBlur
                | Self::MotionBlur
                | Self::Sharpen
                | Self::Emboss
                | Self::EdgesHorizontal
                | Self::EdgesVertical
                | Self::Outline
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The serializable specification of one pipeline operation.
///
/// A tagged variant per operation kind, each case carrying only the
/// fields that kind requires. Fields irrelevant to a kind cannot be
/// expressed at all, so validation reduces to range checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationDescriptor {
    /// Add `level` to every channel.
    Brightness {
        /// Signed adjustment in [-255, 255].
        level: i32,
    },
    /// Scale channel distance from mid-grey.
    Contrast {
        /// Signed adjustment in [-255, 255].
        level: i32,
    },
    /// Scale channel distance from pixel luminance.
    Saturation {
        /// Signed adjustment in [-100, 100]; -100 collapses to greyscale.
        level: i32,
    },
    /// Blend each channel toward `color`.
    Tint {
        /// Blend strength in [0, 100].
        level: i32,
        /// Target color.
        color: Rgb,
    },
    /// Luminance-weighted greyscale.
    Greyscale,
    /// Per-channel inversion.
    Negative,
    /// Fixed sepia matrix.
    Sepia,
    /// Unweighted neighborhood average.
    BoxBlur {
        /// Positive odd kernel edge length.
        kernel_size: u32,
    },
    /// Diagonal streak average.
    MotionBlur {
        /// Positive odd kernel edge length.
        kernel_size: u32,
    },
    /// High-pass sharpening.
    Sharpen {
        /// Positive odd kernel edge length.
        kernel_size: u32,
    },
    /// Relief effect biased around mid-grey.
    Emboss {
        /// Positive odd kernel edge length.
        kernel_size: u32,
    },
    /// Horizontal-derivative edge detection.
    EdgesHorizontal {
        /// Positive odd kernel edge length.
        kernel_size: u32,
    },
    /// Vertical-derivative edge detection.
    EdgesVertical {
        /// Positive odd kernel edge length.
        kernel_size: u32,
    },
    /// Laplacian outline.
    Outline {
        /// Positive odd kernel edge length.
        kernel_size: u32,
    },
}

impl OperationDescriptor {
    /// The kind of this descriptor.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Brightness { .. } => OperationKind::Brightness,
            Self::Contrast { .. } => OperationKind::Contrast,
            Self::Saturation { .. } => OperationKind::Saturation,
            Self::Tint { .. } => OperationKind::Tint,
            Self::Greyscale => OperationKind::Greyscale,
            Self::Negative => OperationKind::Negative,
            Self::Sepia => OperationKind::Sepia,
            Self::BoxBlur { .. } => OperationKind::BoxBlur,
            Self::MotionBlur { .. } => OperationKind::MotionBlur,
            Self::Sharpen { .. } => OperationKind::Sharpen,
            Self::Emboss { .. } => OperationKind::Emboss,
            Self::EdgesHorizontal { .. } => OperationKind::EdgesHorizontal,
            Self::EdgesVertical { .. } => OperationKind::EdgesVertical,
            Self::Outline { .. } => OperationKind::Outline,
        }
    }

    /// The kernel edge length, for convolution kinds.
    #[must_use]
    pub const fn kernel_size(&self) -> Option<u32> {
        match *self {
            Self::BoxBlur { kernel_size }
            | Self::MotionBlur { kernel_size }
            | Self::Sharpen { kernel_size }
            | Self::Emboss { kernel_size }
            | Self::EdgesHorizontal { kernel_size }
            | Self::EdgesVertical { kernel_size }
            | Self::Outline { kernel_size } => Some(kernel_size),
            _ => None,
        }
    }

    /// Check that every field is in range for this descriptor's kind.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::LevelOutOfRange`] for an out-of-range
    /// level and [`PipelineError::InvalidKernelSize`] for a kernel size
    /// that is zero, even, or above
    /// [`MAX_KERNEL_SIZE`](crate::kernel::MAX_KERNEL_SIZE). A
    /// descriptor that validates always builds its kernel.
    pub fn validate(&self) -> Result<(), PipelineError> {
        match *self {
            Self::Brightness { level } | Self::Contrast { level } => {
                check_level(self.kind(), level, -255, 255)
            }
            Self::Saturation { level } => check_level(self.kind(), level, -100, 100),
            Self::Tint { level, .. } => check_level(self.kind(), level, 0, 100),
            Self::Greyscale | Self::Negative | Self::Sepia => Ok(()),
            Self::BoxBlur { kernel_size }
            | Self::MotionBlur { kernel_size }
            | Self::Sharpen { kernel_size }
            | Self::Emboss { kernel_size }
            | Self::EdgesHorizontal { kernel_size }
            | Self::EdgesVertical { kernel_size }
            | Self::Outline { kernel_size } => {
                if kernel_size == 0
                    || kernel_size % 2 == 0
                    || kernel_size > crate::kernel::MAX_KERNEL_SIZE
                {
                    Err(PipelineError::InvalidKernelSize(kernel_size))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Range check shared by the leveled kinds.
const fn check_level(
    kind: OperationKind,
    level: i32,
    min: i32,
    max: i32,
) -> Result<(), PipelineError> {
    if level < min || level > max {
        Err(PipelineError::LevelOutOfRange {
            kind,
            level,
            min,
            max,
        })
    } else {
        Ok(())
    }
}

/// One entry in the operation list: a descriptor plus its enable flag.
///
/// Disabled layers are a pass-through at execution time but still occupy
/// their pipeline position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    /// The operation this layer applies.
    pub descriptor: OperationDescriptor,
    /// Whether the operation participates in execution.
    pub enabled: bool,
}

impl Layer {
    /// Create an enabled layer for the given descriptor.
    #[must_use]
    pub const fn new(descriptor: OperationDescriptor) -> Self {
        Self {
            descriptor,
            enabled: true,
        }
    }
}

/// The materialized output of a pipeline run.
#[derive(Debug, Clone)]
pub struct Processed {
    /// The final stage image (or the base when the list is empty).
    pub image: RgbaImage,
    /// Dimensions of the final image.
    pub dimensions: Dimensions,
}

/// Errors that can occur in the pipeline engine.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// An operation-list index was out of bounds.
    #[error("index {index} out of bounds for operation list of length {len}")]
    IndexOutOfBounds {
        /// The rejected index.
        index: usize,
        /// Current list length.
        len: usize,
    },

    /// A descriptor level field was outside its kind's valid range.
    #[error("{kind} level {level} out of range [{min}, {max}]")]
    LevelOutOfRange {
        /// The descriptor kind.
        kind: OperationKind,
        /// The rejected value.
        level: i32,
        /// Minimum accepted value.
        min: i32,
        /// Maximum accepted value.
        max: i32,
    },

    /// A kernel size was zero or even.
    #[error("kernel size must be a positive odd integer, got {0}")]
    InvalidKernelSize(u32),

    /// An update supplied a descriptor of a different kind than the
    /// entry it targets.
    #[error("operation kind mismatch: entry is {expected}, update is {found}")]
    KindMismatch {
        /// Kind of the existing entry.
        expected: OperationKind,
        /// Kind of the supplied descriptor.
        found: OperationKind,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_kind_round_trip() {
        let d = OperationDescriptor::Tint {
            level: 40,
            color: Rgb::new(200, 120, 40),
        };
        assert_eq!(d.kind(), OperationKind::Tint);
        assert_eq!(d.kind().name(), "tint");
    }

    #[test]
    fn convolution_kinds_carry_kernel_size() {
        let d = OperationDescriptor::BoxBlur { kernel_size: 5 };
        assert!(d.kind().is_convolution());
        assert_eq!(d.kernel_size(), Some(5));
        let d = OperationDescriptor::Negative;
        assert!(!d.kind().is_convolution());
        assert_eq!(d.kernel_size(), None);
    }

    #[test]
    fn validate_accepts_in_range_levels() {
        assert!(OperationDescriptor::Brightness { level: -255 }.validate().is_ok());
        assert!(OperationDescriptor::Contrast { level: 255 }.validate().is_ok());
        assert!(OperationDescriptor::Saturation { level: 0 }.validate().is_ok());
        assert!(
            OperationDescriptor::Tint {
                level: 100,
                color: Rgb::new(0, 0, 0),
            }
            .validate()
            .is_ok()
        );
    }

    #[test]
    fn validate_rejects_out_of_range_levels() {
        let err = OperationDescriptor::Brightness { level: 300 }.validate();
        assert!(matches!(
            err,
            Err(PipelineError::LevelOutOfRange {
                kind: OperationKind::Brightness,
                level: 300,
                ..
            })
        ));
        assert!(OperationDescriptor::Saturation { level: -101 }.validate().is_err());
        assert!(
            OperationDescriptor::Tint {
                level: -1,
                color: Rgb::new(0, 0, 0),
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn validate_rejects_even_zero_or_oversized_kernel_sizes() {
        assert!(matches!(
            OperationDescriptor::BoxBlur { kernel_size: 0 }.validate(),
            Err(PipelineError::InvalidKernelSize(0)),
        ));
        assert!(matches!(
            OperationDescriptor::Sharpen { kernel_size: 4 }.validate(),
            Err(PipelineError::InvalidKernelSize(4)),
        ));
        assert!(matches!(
            OperationDescriptor::EdgesHorizontal { kernel_size: 33 }.validate(),
            Err(PipelineError::InvalidKernelSize(33)),
        ));
        assert!(OperationDescriptor::Outline { kernel_size: 3 }.validate().is_ok());
        assert!(
            OperationDescriptor::BoxBlur {
                kernel_size: crate::kernel::MAX_KERNEL_SIZE,
            }
            .validate()
            .is_ok()
        );
    }

    #[test]
    fn validate_and_kernel_build_agree_on_sizes() {
        // A descriptor the list commits must never fail kernel
        // construction later.
        for size in 0..40 {
            let validated = OperationDescriptor::EdgesVertical { kernel_size: size }
                .validate()
                .is_ok();
            let built = crate::kernel::Kernel::build(
                crate::kernel::KernelKind::EdgesVertical,
                size,
            )
            .is_ok();
            assert_eq!(validated, built, "size {size}");
        }
    }

    #[test]
    fn parameterless_kinds_always_validate() {
        assert!(OperationDescriptor::Greyscale.validate().is_ok());
        assert!(OperationDescriptor::Negative.validate().is_ok());
        assert!(OperationDescriptor::Sepia.validate().is_ok());
    }

    #[test]
    fn error_display_names_the_kind() {
        let err = PipelineError::LevelOutOfRange {
            kind: OperationKind::Saturation,
            level: 120,
            min: -100,
            max: 100,
        };
        assert_eq!(err.to_string(), "saturation level 120 out of range [-100, 100]");
    }

    #[test]
    fn descriptor_serde_round_trip() {
        #[allow(clippy::unwrap_used)]
        fn round_trip(d: OperationDescriptor) -> OperationDescriptor {
            let json = serde_json::to_string(&d).unwrap();
            serde_json::from_str(&json).unwrap()
        }

        let tint = OperationDescriptor::Tint {
            level: 55,
            color: Rgb::new(12, 34, 56),
        };
        assert_eq!(round_trip(tint), tint);

        let blur = OperationDescriptor::BoxBlur { kernel_size: 7 };
        assert_eq!(round_trip(blur), blur);

        let sepia = OperationDescriptor::Sepia;
        assert_eq!(round_trip(sepia), sepia);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn descriptor_json_is_kind_tagged() {
        let json =
            serde_json::to_string(&OperationDescriptor::MotionBlur { kernel_size: 3 }).unwrap();
        assert!(json.contains("\"kind\":\"motion_blur\""), "got {json}");
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn layer_serde_round_trip_preserves_enabled_flag() {
        let mut layer = Layer::new(OperationDescriptor::Greyscale);
        layer.enabled = false;
        let json = serde_json::to_string(&layer).unwrap();
        let back: Layer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, layer);
    }
}
