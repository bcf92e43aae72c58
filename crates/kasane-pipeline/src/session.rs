//! An editing session: one base raster, one operation list, one stage
//! cache.
//!
//! Every list mutation goes through the session so the cache invariant
//! holds: each cached stage is the exact output of executing the
//! current list's prefix ending at that position. Processing then only
//! recomputes the suffix past the nearest valid stage.
//!
//! Geometric transforms (rotations, mirrors) rewrite the base raster
//! itself and drop the whole cache, since every stage downstream of the
//! base is stale.

use crate::cache::StageCache;
use crate::layers::OperationList;
use crate::ops;
use crate::transform;
use crate::types::{Dimensions, Layer, OperationDescriptor, PipelineError, Processed, RgbaImage};

/// Mutable pipeline state for one image being edited.
#[derive(Debug, Clone)]
pub struct Session {
    original: RgbaImage,
    list: OperationList,
    cache: StageCache,
}

impl Session {
    /// Start a session over `original` with an empty operation list.
    #[must_use]
    pub fn new(original: RgbaImage) -> Self {
        Self {
            original,
            list: OperationList::new(),
            cache: StageCache::new(),
        }
    }

    /// Rebuild a session from persisted state: a base raster plus the
    /// saved layers. The cache starts empty and refills on the next
    /// [`process`](Self::process).
    ///
    /// # Errors
    ///
    /// Returns the first descriptor validation failure among `layers`.
    pub fn restore(original: RgbaImage, layers: Vec<Layer>) -> Result<Self, PipelineError> {
        Ok(Self {
            original,
            list: OperationList::from_layers(layers)?,
            cache: StageCache::new(),
        })
    }

    /// The untouched base raster.
    #[must_use]
    pub const fn original(&self) -> &RgbaImage {
        &self.original
    }

    /// The operation list in execution order.
    #[must_use]
    pub const fn list(&self) -> &OperationList {
        &self.list
    }

    /// Read access to the stage cache.
    #[must_use]
    pub const fn cache(&self) -> &StageCache {
        &self.cache
    }

    /// Append an operation at the end of the list.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an out-of-range descriptor.
    pub fn append(&mut self, descriptor: OperationDescriptor) -> Result<(), PipelineError> {
        let invalidated = self.list.append(descriptor)?;
        self.cache.invalidate_from(invalidated);
        Ok(())
    }

    /// Remove the operation at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::IndexOutOfBounds`] for a bad index.
    pub fn remove_at(&mut self, index: usize) -> Result<(), PipelineError> {
        let invalidated = self.list.remove_at(index)?;
        self.cache.invalidate_from(invalidated);
        Ok(())
    }

    /// Change the parameters of the operation at `index` without
    /// changing its kind.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::IndexOutOfBounds`],
    /// [`PipelineError::KindMismatch`], or a validation error.
    pub fn update_at(
        &mut self,
        index: usize,
        descriptor: OperationDescriptor,
    ) -> Result<(), PipelineError> {
        let invalidated = self.list.update_at(index, descriptor)?;
        self.cache.invalidate_from(invalidated);
        Ok(())
    }

    /// Replace the operation at `index` with one of any kind.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::IndexOutOfBounds`] or a validation
    /// error.
    pub fn replace_at(
        &mut self,
        index: usize,
        descriptor: OperationDescriptor,
    ) -> Result<(), PipelineError> {
        let invalidated = self.list.replace_at(index, descriptor)?;
        self.cache.invalidate_from(invalidated);
        Ok(())
    }

    /// Move the operation at `old_index` to `new_index`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::IndexOutOfBounds`] if either index is
    /// out of range.
    pub fn move_to(&mut self, old_index: usize, new_index: usize) -> Result<(), PipelineError> {
        let invalidated = self.list.move_to(old_index, new_index)?;
        self.cache.invalidate_from(invalidated);
        Ok(())
    }

    /// Flip the enabled flag of the operation at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::IndexOutOfBounds`] for a bad index.
    pub fn toggle(&mut self, index: usize) -> Result<(), PipelineError> {
        let invalidated = self.list.toggle(index)?;
        self.cache.invalidate_from(invalidated);
        Ok(())
    }

    /// Execute the pipeline and return the final raster.
    ///
    /// `start_index` is a hint for where edits began; positions past
    /// the list length are clamped. Execution seeds from the nearest
    /// cached stage before the hint (or the base raster), recomputes
    /// forward, and caches every stage it produces. Disabled layers
    /// pass their input through unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first operation failure; stages computed before the
    /// failure stay cached.
    pub fn process(&mut self, start_index: usize) -> Result<Processed, PipelineError> {
        let len = self.list.len();
        let start = start_index.min(len);

        let (first, mut current) = match start
            .checked_sub(1)
            .and_then(|position| self.cache.nearest_at_or_before(position))
        {
            Some((position, image)) => (position + 1, image.clone()),
            None => (0, self.original.clone()),
        };

        for (position, layer) in self.list.layers().iter().enumerate().skip(first) {
            if layer.enabled {
                current = ops::apply(layer.descriptor, &current)?;
            }
            self.cache.put(position, current.clone());
        }

        Ok(Processed {
            dimensions: Dimensions::of(&current),
            image: current,
        })
    }

    /// Rotate the base raster a quarter turn clockwise.
    pub fn rotate90(&mut self) {
        self.original = transform::rotate90(&self.original);
        self.cache.clear();
    }

    /// Rotate the base raster a half turn.
    pub fn rotate180(&mut self) {
        self.original = transform::rotate180(&self.original);
        self.cache.clear();
    }

    /// Rotate the base raster three quarter turns clockwise.
    pub fn rotate270(&mut self) {
        self.original = transform::rotate270(&self.original);
        self.cache.clear();
    }

    /// Flip the base raster top to bottom.
    pub fn mirror_vertical(&mut self) {
        self.original = transform::mirror_vertical(&self.original);
        self.cache.clear();
    }

    /// Flip the base raster left to right.
    pub fn mirror_horizontal(&mut self) {
        self.original = transform::mirror_horizontal(&self.original);
        self.cache.clear();
    }

    /// Drop every operation and every cached stage, keeping the base
    /// raster.
    pub fn reset(&mut self) {
        self.list = OperationList::new();
        self.cache.clear();
    }
}
