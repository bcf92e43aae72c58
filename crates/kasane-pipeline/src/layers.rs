//! The ordered, editable list of pipeline operations.
//!
//! Every mutation validates its input first (the list is untouched on
//! failure) and reports the **first invalidated position**: the lowest
//! pipeline index whose cached stage no longer reflects the list.
//! `None` means nothing cached was invalidated (pure append). The
//! session pairs each mutation with the matching
//! [`StageCache::invalidate_from`](crate::cache::StageCache::invalidate_from)
//! call so the cache invariant holds after every edit.

use serde::{Deserialize, Serialize};

use crate::types::{Layer, OperationDescriptor, PipelineError};

/// The first cache position a mutation invalidated, if any.
pub type Invalidation = Option<usize>;

/// Ordered sequence of operation layers; insertion order is execution
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationList {
    layers: Vec<Layer>,
}

impl OperationList {
    /// Create an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Build a list from existing layers, validating every descriptor.
    ///
    /// # Errors
    ///
    /// Returns the first descriptor validation failure; no partial list
    /// is constructed.
    pub fn from_layers(layers: Vec<Layer>) -> Result<Self, PipelineError> {
        for layer in &layers {
            layer.descriptor.validate()?;
        }
        Ok(Self { layers })
    }

    /// Number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// The layer at `index`, if in range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// All layers in execution order.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    fn out_of_bounds(&self, index: usize) -> PipelineError {
        PipelineError::IndexOutOfBounds {
            index,
            len: self.layers.len(),
        }
    }

    /// Append a new enabled layer at the end.
    ///
    /// Previously cached stages all remain valid; only the new final
    /// stage needs computing.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an out-of-range descriptor; the
    /// list is unchanged.
    pub fn append(&mut self, descriptor: OperationDescriptor) -> Result<Invalidation, PipelineError> {
        descriptor.validate()?;
        self.layers.push(Layer::new(descriptor));
        Ok(None)
    }

    /// Remove the layer at `index`. Subsequent positions shift down.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::IndexOutOfBounds`] if `index` is out of
    /// range; the list is unchanged.
    pub fn remove_at(&mut self, index: usize) -> Result<Invalidation, PipelineError> {
        if index >= self.layers.len() {
            return Err(self.out_of_bounds(index));
        }
        self.layers.remove(index);
        Ok(Some(index))
    }

    /// Replace the parameter fields of the layer at `index` without
    /// changing its kind.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::IndexOutOfBounds`] for a bad index, a
    /// validation error for bad fields, or
    /// [`PipelineError::KindMismatch`] if `descriptor` is of a
    /// different kind than the existing entry. The list is unchanged on
    /// any failure.
    pub fn update_at(
        &mut self,
        index: usize,
        descriptor: OperationDescriptor,
    ) -> Result<Invalidation, PipelineError> {
        descriptor.validate()?;
        let len = self.layers.len();
        let layer = self
            .layers
            .get_mut(index)
            .ok_or(PipelineError::IndexOutOfBounds { index, len })?;
        if layer.descriptor.kind() != descriptor.kind() {
            return Err(PipelineError::KindMismatch {
                expected: layer.descriptor.kind(),
                found: descriptor.kind(),
            });
        }
        layer.descriptor = descriptor;
        Ok(Some(index))
    }

    /// Replace the layer at `index` with an operation of any kind,
    /// keeping the entry's enabled flag.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::IndexOutOfBounds`] for a bad index or a
    /// validation error for a bad descriptor; the list is unchanged.
    pub fn replace_at(
        &mut self,
        index: usize,
        descriptor: OperationDescriptor,
    ) -> Result<Invalidation, PipelineError> {
        descriptor.validate()?;
        let len = self.layers.len();
        let layer = self
            .layers
            .get_mut(index)
            .ok_or(PipelineError::IndexOutOfBounds { index, len })?;
        layer.descriptor = descriptor;
        Ok(Some(index))
    }

    /// Move the layer at `old_index` to `new_index`. Equal indices are
    /// a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::IndexOutOfBounds`] if either index is
    /// out of range; the list is unchanged.
    pub fn move_to(
        &mut self,
        old_index: usize,
        new_index: usize,
    ) -> Result<Invalidation, PipelineError> {
        let len = self.layers.len();
        if old_index >= len {
            return Err(self.out_of_bounds(old_index));
        }
        if new_index >= len {
            return Err(self.out_of_bounds(new_index));
        }
        if old_index == new_index {
            return Ok(None);
        }
        let layer = self.layers.remove(old_index);
        self.layers.insert(new_index, layer);
        // Order changed from the lower of the two positions onward.
        Ok(Some(old_index.min(new_index)))
    }

    /// Flip the enabled flag of the layer at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::IndexOutOfBounds`] if `index` is out of
    /// range; the list is unchanged.
    pub fn toggle(&mut self, index: usize) -> Result<Invalidation, PipelineError> {
        let len = self.layers.len();
        let layer = self
            .layers
            .get_mut(index)
            .ok_or(PipelineError::IndexOutOfBounds { index, len })?;
        layer.enabled = !layer.enabled;
        Ok(Some(index))
    }
}
