//! Incremental image-operation pipeline.
//!
//! An immutable base raster flows through an ordered, editable list of
//! operation descriptors. Each stage's output is cached by position, so
//! editing the list only recomputes the suffix downstream of the edit.
//! The crate is sans-IO: it never touches files, sockets, or encodings,
//! and callers own when and how rasters enter and leave.
//!
//! - [`Session`] owns one base raster, its [`OperationList`], and the
//!   [`StageCache`], and keeps them consistent across edits.
//! - [`OperationDescriptor`] is the serializable description of one
//!   operation; [`ops::apply`] executes one against a raster.
//! - [`transform`] holds the whole-raster rotations and mirrors that
//!   rewrite the base instead of joining the list.

pub mod cache;
pub mod kernel;
pub mod layers;
pub mod ops;
pub mod session;
pub mod transform;
pub mod types;

pub use cache::StageCache;
pub use kernel::{Kernel, KernelKind, MAX_KERNEL_SIZE};
pub use layers::{Invalidation, OperationList};
pub use session::Session;
pub use types::{
    Dimensions, Layer, OperationDescriptor, OperationKind, PipelineError, Processed, Rgb,
    RgbaImage,
};

/// Execute `layers` over `original` front to back with no caching.
///
/// The reference semantics for [`Session::process`]: a warm session and
/// a cold replay of the same list produce identical rasters.
///
/// # Errors
///
/// Returns the first operation failure.
pub fn replay(original: &RgbaImage, layers: &[Layer]) -> Result<RgbaImage, PipelineError> {
    let mut current = original.clone();
    for layer in layers {
        if layer.enabled {
            current = ops::apply(layer.descriptor, &current)?;
        }
    }
    Ok(current)
}
