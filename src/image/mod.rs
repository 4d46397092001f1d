//! Client-side image preprocessing
//!
//! Decodes, downsizes and re-encodes images before they are uploaded, keeping
//! the original whenever the re-encode does not pay off.

pub mod dimensions;
pub mod mime;
pub mod mock;
pub mod processor;

pub use mock::MockImageProcessor;
pub use processor::ImageProcessor;

use crate::error::CompressError;
use crate::models::{CompressOptions, InputFile, OutputFile};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait ImageCompressor: Send + Sync {
    /// Compress a single image file.
    ///
    /// Returns `OutputFile::Original` holding `file` itself when re-encoding
    /// would not make it smaller.
    async fn compress_image(
        &self,
        file: Arc<InputFile>,
        options: &CompressOptions,
    ) -> std::result::Result<OutputFile, CompressError>;
}
