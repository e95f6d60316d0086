#[cfg(feature = "onnx")]
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid option `{name}`: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    #[error("Glyph classification failed: {0}")]
    Classifier(String),

    #[cfg(feature = "onnx")]
    #[error(transparent)]
    Runtime(#[from] ort::Error),

    #[cfg(feature = "onnx")]
    #[error("Failed to read glyph keys from {path:?}: {source}")]
    Keys {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
