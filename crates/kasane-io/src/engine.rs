//! The engine facade: one call per GUI interaction.
//!
//! Wraps a [`Session`] behind base64 boundaries so a caller never
//! handles raw rasters. Until an image is loaded every other call
//! fails with [`EngineError::NoImage`]; failed calls never change
//! engine state.

use kasane_pipeline::{Layer, OperationDescriptor, Session};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{self, CodecError};

/// Failure at the engine boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No image has been loaded yet.
    #[error("no image loaded")]
    NoImage,
    /// A pipeline operation failed.
    #[error(transparent)]
    Pipeline(#[from] kasane_pipeline::PipelineError),
    /// A base64/PNG translation failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// The final pipeline output in boundary form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// PNG data URL of the processed raster.
    pub base64: String,
}

/// Stateful facade over one editing session.
#[derive(Debug, Default)]
pub struct Engine {
    session: Option<Session>,
}

impl Engine {
    /// Create an engine with no image loaded.
    #[must_use]
    pub const fn new() -> Self {
        Self { session: None }
    }

    /// Whether an image has been loaded.
    #[must_use]
    pub const fn has_image(&self) -> bool {
        self.session.is_some()
    }

    fn session_mut(&mut self) -> Result<&mut Session, EngineError> {
        self.session.as_mut().ok_or(EngineError::NoImage)
    }

    fn session(&self) -> Result<&Session, EngineError> {
        self.session.as_ref().ok_or(EngineError::NoImage)
    }

    /// Read access to the underlying session, if an image is loaded.
    ///
    /// Used by project persistence; GUI-facing callers stay on the
    /// base64 surface.
    #[must_use]
    pub const fn current_session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Adopt an already-built session (project restore).
    pub fn adopt_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    /// Load a new base image from a PNG data URL (or naked base64).
    ///
    /// Starts a fresh session: any prior operation list and cache are
    /// discarded. A decode failure leaves the existing session intact.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Codec`] if the payload cannot be decoded.
    pub fn set_original(&mut self, data: &str) -> Result<(), EngineError> {
        let image = codec::decode_data_url(data)?;
        tracing::info!(width = image.width(), height = image.height(), "image loaded");
        self.session = Some(Session::new(image));
        Ok(())
    }

    /// The untouched base raster as a PNG data URL.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoImage`] before the first load.
    pub fn original(&self) -> Result<String, EngineError> {
        Ok(codec::encode_data_url(self.session()?.original())?)
    }

    /// The current operation list in execution order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoImage`] before the first load.
    pub fn operations(&self) -> Result<&[Layer], EngineError> {
        Ok(self.session()?.list().layers())
    }

    /// Append an operation at the end of the list.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoImage`] or a pipeline validation error.
    pub fn append_operation(
        &mut self,
        descriptor: OperationDescriptor,
    ) -> Result<(), EngineError> {
        tracing::debug!(kind = %descriptor.kind(), "append operation");
        Ok(self.session_mut()?.append(descriptor)?)
    }

    /// Remove the operation at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoImage`] or an index error.
    pub fn remove_operation(&mut self, index: usize) -> Result<(), EngineError> {
        tracing::debug!(index, "remove operation");
        Ok(self.session_mut()?.remove_at(index)?)
    }

    /// Change the parameters of the operation at `index`, keeping its
    /// kind.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoImage`], an index error, a validation
    /// error, or a kind mismatch.
    pub fn update_operation(
        &mut self,
        index: usize,
        descriptor: OperationDescriptor,
    ) -> Result<(), EngineError> {
        tracing::debug!(index, kind = %descriptor.kind(), "update operation");
        Ok(self.session_mut()?.update_at(index, descriptor)?)
    }

    /// Replace the operation at `index` with one of any kind.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoImage`], an index error, or a
    /// validation error.
    pub fn replace_operation(
        &mut self,
        index: usize,
        descriptor: OperationDescriptor,
    ) -> Result<(), EngineError> {
        tracing::debug!(index, kind = %descriptor.kind(), "replace operation");
        Ok(self.session_mut()?.replace_at(index, descriptor)?)
    }

    /// Move the operation at `old_index` to `new_index`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoImage`] or an index error.
    pub fn move_operation(&mut self, old_index: usize, new_index: usize) -> Result<(), EngineError> {
        tracing::debug!(old_index, new_index, "move operation");
        Ok(self.session_mut()?.move_to(old_index, new_index)?)
    }

    /// Flip the enabled flag of the operation at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoImage`] or an index error.
    pub fn toggle_operation(&mut self, index: usize) -> Result<(), EngineError> {
        tracing::debug!(index, "toggle operation");
        Ok(self.session_mut()?.toggle(index)?)
    }

    /// Execute the pipeline from the edit hint `start` and return the
    /// final raster in boundary form.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoImage`], a pipeline failure, or an
    /// encoding failure.
    pub fn process(&mut self, start: usize) -> Result<ProcessedImage, EngineError> {
        let processed = self.session_mut()?.process(start)?;
        tracing::debug!(
            start,
            width = processed.dimensions.width,
            height = processed.dimensions.height,
            "processed",
        );
        Ok(ProcessedImage {
            width: processed.dimensions.width,
            height: processed.dimensions.height,
            base64: codec::encode_data_url(&processed.image)?,
        })
    }

    /// Rotate the base raster a quarter turn clockwise.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoImage`] before the first load.
    pub fn rotate90(&mut self) -> Result<(), EngineError> {
        self.session_mut()?.rotate90();
        Ok(())
    }

    /// Rotate the base raster a half turn.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoImage`] before the first load.
    pub fn rotate180(&mut self) -> Result<(), EngineError> {
        self.session_mut()?.rotate180();
        Ok(())
    }

    /// Rotate the base raster three quarter turns clockwise.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoImage`] before the first load.
    pub fn rotate270(&mut self) -> Result<(), EngineError> {
        self.session_mut()?.rotate270();
        Ok(())
    }

    /// Flip the base raster top to bottom.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoImage`] before the first load.
    pub fn mirror_vertical(&mut self) -> Result<(), EngineError> {
        self.session_mut()?.mirror_vertical();
        Ok(())
    }

    /// Flip the base raster left to right.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoImage`] before the first load.
    pub fn mirror_horizontal(&mut self) -> Result<(), EngineError> {
        self.session_mut()?.mirror_horizontal();
        Ok(())
    }

    /// Drop every operation, keeping any loaded base raster. Resetting
    /// an engine with no image loaded is a no-op.
    pub fn reset(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.reset();
        }
    }
}
