//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.
//! Image compression has its own [`CompressError`] because those failures
//! never leave the pipeline: they are logged and the original file is kept.

use crate::models::ImageUploadResponse;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("File {name} is too large ({:.1} MiB, limit is {:.0} MiB)", mib(.size), mib(crate::app::MAX_UPLOAD_SIZE))]
    Oversize { name: String, size: u64 },

    #[error("Authentication required")]
    Unauthorized,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Upload stopped after {} image(s): {source}", .uploaded.images.len())]
    PartialUpload {
        uploaded: ImageUploadResponse,
        #[source]
        source: Box<Error>,
    },
}

fn mib<B: std::borrow::Borrow<u64>>(bytes: B) -> f64 {
    *bytes.borrow() as f64 / (1024.0 * 1024.0)
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the single-image compressor.
#[derive(Error, Debug)]
pub enum CompressError {
    /// The bytes are not a raster image the decoder accepts.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// No drawing surface could be provided for the resample.
    #[error("failed to prepare drawing surface: {0}")]
    Context(String),

    /// The encoder refused to produce output.
    #[error("failed to encode image: {0}")]
    Encode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversize_message_names_file_and_size() {
        let err = Error::Oversize {
            name: "holiday.jpg".to_string(),
            size: 12 * 1024 * 1024 + 512 * 1024,
        };
        let message = err.to_string();
        assert!(message.contains("holiday.jpg"));
        assert!(message.contains("12.5 MiB"));
        assert!(message.contains("10 MiB"));
    }

    #[test]
    fn test_partial_upload_reports_count_and_cause() {
        let err = Error::PartialUpload {
            uploaded: ImageUploadResponse {
                images: vec![crate::models::UploadedImage {
                    filename: "https://cdn.example.com/a.jpg".to_string(),
                    original_name: "a.jpg".to_string(),
                }],
                article_slug: "slug".to_string(),
            },
            source: Box::new(Error::Api {
                status: 500,
                message: "boom".to_string(),
            }),
        };
        let message = err.to_string();
        assert!(message.contains("1 image(s)"));
        assert!(message.contains("boom"));
    }
}
