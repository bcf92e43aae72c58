//! Boundary layer for the kasane pipeline.
//!
//! Everything that crosses the process edge lives here: the PNG
//! data-URL codec, the [`Engine`] facade that a GUI or CLI drives one
//! call at a time, and JSON [`Project`] persistence. The pipeline crate
//! itself stays sans-IO.

pub mod codec;
pub mod engine;
pub mod project;

pub use codec::{CodecError, DATA_URL_PREFIX, decode_data_url, encode_data_url};
pub use engine::{Engine, EngineError, ProcessedImage};
pub use project::{Project, ProjectError};
