use super::dimensions::target_dimensions;
use super::ImageCompressor;
use crate::error::CompressError;
use crate::models::{CompressOptions, CompressedFile, Dimensions, InputFile, OutputFile};
use async_trait::async_trait;
use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

pub const OUTPUT_MEDIA_TYPE: &str = "image/jpeg";
const OUTPUT_EXTENSION: &str = "jpg";

/// Downsizes and re-encodes photos to JPEG.
#[derive(Debug, Clone, Copy)]
pub struct ImageProcessor {
    filter: FilterType,
}

impl ImageProcessor {
    pub fn new() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }

    /// Decode and turn the pixels upright according to the EXIF orientation.
    fn decode(data: &[u8]) -> Result<DynamicImage, CompressError> {
        let mut decoder = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| CompressError::Decode(e.to_string()))?
            .into_decoder()
            .map_err(|e| CompressError::Decode(e.to_string()))?;
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

        let mut image = DynamicImage::from_decoder(decoder)
            .map_err(|e| CompressError::Decode(e.to_string()))?;
        image.apply_orientation(orientation);

        if image.width() == 0 || image.height() == 0 {
            return Err(CompressError::Decode("image has no pixels".to_string()));
        }
        Ok(image)
    }

    /// Draw the whole source into a surface of `target` size.
    fn render(&self, source: DynamicImage, target: Dimensions) -> DynamicImage {
        if source.width() == target.width && source.height() == target.height {
            return source;
        }
        source.resize_exact(target.width, target.height, self.filter)
    }

    fn encode(surface: &DynamicImage, quality: f32) -> Result<Vec<u8>, CompressError> {
        let mut buf = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality(quality));
        surface
            .to_rgb8()
            .write_with_encoder(encoder)
            .map_err(|e| CompressError::Encode(format!("JPEG encode failed: {}", e)))?;
        Ok(buf.into_inner())
    }

    /// Returns `None` when the re-encode is not smaller than the original.
    fn compress_sync(
        &self,
        file: &InputFile,
        options: &CompressOptions,
    ) -> Result<Option<CompressedFile>, CompressError> {
        let source = Self::decode(&file.data)?;
        let natural = Dimensions::new(source.width(), source.height());
        let target = target_dimensions(natural, options.max_width, options.max_height);
        tracing::debug!(
            "{}: {}x{} -> {}x{}",
            file.name,
            natural.width,
            natural.height,
            target.width,
            target.height
        );

        let surface = self.render(source, target);
        let mut data = Self::encode(&surface, options.quality)?;

        if data.len() as u64 >= file.size() {
            tracing::debug!(
                "{}: re-encode is {} bytes, original is {} bytes; keeping original",
                file.name,
                data.len(),
                file.size()
            );
            return Ok(None);
        }

        if data.len() as u64 > options.target_size {
            tracing::debug!(
                "{}: {} bytes still above {}, re-encoding at quality {}",
                file.name,
                data.len(),
                options.target_size,
                options.fallback_quality
            );
            data = Self::encode(&surface, options.fallback_quality)?;
        }

        Ok(Some(CompressedFile {
            name: output_name(&file.name),
            media_type: OUTPUT_MEDIA_TYPE.to_string(),
            data,
            dimensions: target,
            last_modified: Utc::now(),
        }))
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageCompressor for ImageProcessor {
    async fn compress_image(
        &self,
        file: Arc<InputFile>,
        options: &CompressOptions,
    ) -> Result<OutputFile, CompressError> {
        let compressed = run_blocking({
            let processor = *self;
            let file = Arc::clone(&file);
            let options = options.clone();
            move || processor.compress_sync(&file, &options)
        })
        .await??;

        Ok(match compressed {
            Some(compressed) => OutputFile::Compressed(compressed),
            None => OutputFile::Original(file),
        })
    }
}

/// Run pixel work off the async runtime. A worker that panics or is
/// cancelled surfaces as [`CompressError::Context`].
async fn run_blocking<T, F>(work: F) -> Result<T, CompressError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| CompressError::Context(format!("image worker failed: {}", e)))
}

/// Map a (0, 1] quality onto the encoder's 1..=100 scale.
fn jpeg_quality(quality: f32) -> u8 {
    ((quality * 100.0).round() as u8).clamp(1, 100)
}

/// Keep the base name, swap the extension for the output format's.
pub fn output_name(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(name);
    format!("{}.{}", stem, OUTPUT_EXTENSION)
}
