//! Upload policy: one multipart request when possible, one file at a time otherwise.

use super::BlogApi;
use crate::models::{ImageUploadResponse, OutputFile};
use crate::{Error, Result};
use tracing::{info, warn};

/// Upload `files` for `topic`, falling back to sequential uploads if the batch fails.
///
/// Sequential uploads reuse the article slug returned by the first success.
/// If a sequential upload fails after others succeeded, the error is
/// [`Error::PartialUpload`] and carries what did make it, including when the
/// credentials are rejected midway.
pub async fn upload_images(
    api: &dyn BlogApi,
    files: &[OutputFile],
    topic: &str,
    article_slug: Option<&str>,
) -> Result<ImageUploadResponse> {
    if files.is_empty() {
        return Err(Error::Validation("No files to upload".to_string()));
    }

    match api.upload_batch(files, topic, article_slug).await {
        Ok(response) => {
            info!("Uploaded {} file(s) in one request", response.images.len());
            return Ok(response);
        }
        Err(Error::Unauthorized) => return Err(Error::Unauthorized),
        Err(e) if files.len() == 1 => return Err(e),
        Err(e) => warn!(
            "Batch upload of {} files failed: {}. Retrying one at a time",
            files.len(),
            e
        ),
    }

    let mut uploaded = ImageUploadResponse {
        images: Vec::new(),
        article_slug: article_slug.unwrap_or_default().to_string(),
    };

    for file in files {
        let slug = Some(uploaded.article_slug.as_str()).filter(|s| !s.is_empty());
        let result = api
            .upload_batch(std::slice::from_ref(file), topic, slug)
            .await;
        match result {
            Ok(response) => {
                uploaded.article_slug = response.article_slug;
                uploaded.images.extend(response.images);
            }
            Err(e) if uploaded.images.is_empty() => return Err(e),
            Err(e) => {
                warn!(
                    "Upload of {} failed after {} success(es): {}",
                    file.name(),
                    uploaded.images.len(),
                    e
                );
                return Err(Error::PartialUpload {
                    uploaded,
                    source: Box::new(e),
                });
            }
        }
    }

    info!("Uploaded {} file(s) one at a time", uploaded.images.len());
    Ok(uploaded)
}
