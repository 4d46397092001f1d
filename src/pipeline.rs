//! Batch orchestration of the image pipeline.
//!
//! Every eligible file is compressed on its own task; failures are contained
//! per file and replaced by the original, so the returned batch always lines
//! up index-for-index with the input.

use crate::image::ImageCompressor;
use crate::models::{CompressOptions, InputFile, OutputFile};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Whether `file` is worth decoding at all.
pub fn should_compress(file: &InputFile, options: &CompressOptions) -> bool {
    file.is_image() && file.size() > options.skip_threshold
}

/// Run every file through `compressor`, keeping input order.
pub async fn process_images(
    files: &[Arc<InputFile>],
    compressor: Arc<dyn ImageCompressor>,
    options: &CompressOptions,
) -> Vec<OutputFile> {
    let mut outputs: Vec<Option<OutputFile>> = (0..files.len()).map(|_| None).collect();
    let mut tasks = JoinSet::new();

    for (index, file) in files.iter().enumerate() {
        if !should_compress(file, options) {
            debug!(
                "Passing through {} ({}, {} bytes)",
                file.name,
                file.media_type,
                file.size()
            );
            outputs[index] = Some(OutputFile::Original(Arc::clone(file)));
            continue;
        }

        let compressor = Arc::clone(&compressor);
        let file = Arc::clone(file);
        let options = options.clone();
        tasks.spawn(async move {
            let result = compressor
                .compress_image(Arc::clone(&file), &options)
                .await;
            (index, file, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, _, Ok(output))) => {
                debug!("Compressed {} to {} bytes", output.name(), output.size());
                outputs[index] = Some(output);
            }
            Ok((index, file, Err(e))) => {
                warn!("Failed to compress {}, keeping original: {}", file.name, e);
                outputs[index] = Some(OutputFile::Original(file));
            }
            Err(e) => {
                // The slot stays empty and is filled with the original below.
                error!("Compression task failed: {}", e);
            }
        }
    }

    let outputs: Vec<OutputFile> = outputs
        .into_iter()
        .zip(files)
        .map(|(output, file)| output.unwrap_or_else(|| OutputFile::Original(Arc::clone(file))))
        .collect();

    let compressed = outputs.iter().filter(|o| !o.is_original()).count();
    info!(
        "Processed {} file(s): {} compressed, {} kept as-is",
        outputs.len(),
        compressed,
        outputs.len() - compressed
    );

    outputs
}
