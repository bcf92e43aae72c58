//! Project persistence.
//!
//! A project is a JSON record of the base raster (PNG data URL) and the
//! ordered operation list with enabled flags. Cached stages are never
//! persisted; a restored session recomputes them on its first process
//! call.

use kasane_pipeline::{Layer, PipelineError, Session};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{self, CodecError};

/// Failure while saving or restoring a project.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// The project JSON was malformed.
    #[error("invalid project document: {0}")]
    Json(#[from] serde_json::Error),
    /// The embedded image payload could not be translated.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// A persisted operation descriptor failed validation.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Serializable snapshot of an editing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// The base raster as a PNG data URL.
    pub original: String,
    /// The operation list in execution order.
    pub operations: Vec<Layer>,
}

impl Project {
    /// Snapshot a live session.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::Codec`] if the base raster cannot be
    /// encoded.
    pub fn from_session(session: &Session) -> Result<Self, ProjectError> {
        Ok(Self {
            original: codec::encode_data_url(session.original())?,
            operations: session.list().layers().to_vec(),
        })
    }

    /// Rebuild a session from this snapshot with an empty stage cache.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::Codec`] for an unreadable image payload
    /// or [`ProjectError::Pipeline`] for an out-of-range persisted
    /// descriptor.
    pub fn into_session(self) -> Result<Session, ProjectError> {
        let original = codec::decode_data_url(&self.original)?;
        Ok(Session::restore(original, self.operations)?)
    }

    /// Serialize to a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::Json`] if serialization fails.
    pub fn save_to_string(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a JSON document produced by [`save_to_string`](Self::save_to_string).
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::Json`] for malformed JSON.
    pub fn load_from_string(document: &str) -> Result<Self, ProjectError> {
        Ok(serde_json::from_str(document)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgba;
    use kasane_pipeline::{OperationDescriptor, Rgb, RgbaImage, replay};

    #[allow(clippy::cast_possible_truncation)]
    fn session_with_ops() -> Session {
        let base = RgbaImage::from_fn(4, 4, |x, y| Rgba([(x * 60) as u8, (y * 60) as u8, 30, 255]));
        let mut session = Session::new(base);
        session
            .append(OperationDescriptor::Tint {
                level: 25,
                color: Rgb::new(255, 220, 180),
            })
            .unwrap();
        session
            .append(OperationDescriptor::BoxBlur { kernel_size: 3 })
            .unwrap();
        session.toggle(1).unwrap();
        session
    }

    #[test]
    fn save_load_round_trip() {
        let session = session_with_ops();
        let project = Project::from_session(&session).unwrap();
        let document = project.save_to_string().unwrap();
        let restored = Project::load_from_string(&document).unwrap();
        assert_eq!(restored, project);
    }

    #[test]
    fn restored_session_reproduces_the_output() {
        let mut session = session_with_ops();
        let expected = session.process(0).unwrap();

        let document = Project::from_session(&session)
            .unwrap()
            .save_to_string()
            .unwrap();
        let mut restored = Project::load_from_string(&document)
            .unwrap()
            .into_session()
            .unwrap();
        assert!(restored.cache().is_empty(), "cache is never persisted");
        assert_eq!(restored.process(0).unwrap().image, expected.image);
    }

    #[test]
    fn restored_layers_match_a_cold_replay() {
        let session = session_with_ops();
        let document = Project::from_session(&session)
            .unwrap()
            .save_to_string()
            .unwrap();
        let restored = Project::load_from_string(&document)
            .unwrap()
            .into_session()
            .unwrap();
        assert_eq!(
            replay(restored.original(), restored.list().layers()).unwrap(),
            replay(session.original(), session.list().layers()).unwrap(),
        );
    }

    #[test]
    fn malformed_document_is_rejected() {
        assert!(matches!(
            Project::load_from_string("{not json"),
            Err(ProjectError::Json(_)),
        ));
    }

    #[test]
    fn tampered_descriptor_fails_on_restore() {
        let session = session_with_ops();
        let mut project = Project::from_session(&session).unwrap();
        let document = project
            .save_to_string()
            .unwrap()
            .replace("\"kernel_size\": 3", "\"kernel_size\": 4");
        project = Project::load_from_string(&document).unwrap();
        assert!(matches!(
            project.into_session(),
            Err(ProjectError::Pipeline(_)),
        ));
    }
}
