//! Error kinds for the fatal paths through loading and rendering.
//!
//! Non-fatal problems (unknown scene commands, unsupported-but-ignorable
//! glTF extensions) are logged via `log::warn!` at the call site and do
//! not flow through this type.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("scene file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("failed to write output image {path}: {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse glTF document: {0}")]
    GltfParse(#[from] gltf::Error),

    #[error("unsupported glTF feature: {0}")]
    UnsupportedGltfFeature(String),

    #[error("glTF document is missing required data: {0}")]
    MalformedGltf(String),
}
