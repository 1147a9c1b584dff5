//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.
//! Nutrition lookup failures have their own taxonomy in
//! [`crate::nutrition::LookupError`] because the pipeline turns them into a
//! user-visible outcome instead of propagating them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load captioning model: {0}")]
    ModelLoad(String),

    #[error("Captioning failed: {0}")]
    Caption(String),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unsupported image format: {0}")]
    UnsupportedImage(String),

    #[error("Internal invariant violated: {0}")]
    Invariant(String),
}

impl From<candle_core::Error> for Error {
    fn from(e: candle_core::Error) -> Self {
        Error::Caption(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
