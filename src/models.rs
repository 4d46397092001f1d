//! Data models and structures
//!
//! Defines the files flowing through the image pipeline, the compression
//! options, and the request/response types of the blog API.

use crate::image::mime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

pub const MIB: u64 = 1024 * 1024;

/// A file handed to the pipeline by the caller. Never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct InputFile {
    pub name: String,
    pub media_type: String,
    pub data: Vec<u8>,
    pub last_modified: DateTime<Utc>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data,
            last_modified: Utc::now(),
        }
    }

    /// Read a file from disk, declaring its media type from its content or extension.
    pub async fn from_path(path: &Path) -> crate::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| crate::Error::Validation(format!("Not a file: {}", path.display())))?;

        let media_type = mime::declared_media_type(&data, path);
        let last_modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(Self {
            name,
            media_type: media_type.to_string(),
            data,
            last_modified,
        })
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// Width and height of a raster, both at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn fits_within(&self, max_width: u32, max_height: u32) -> bool {
        self.width <= max_width && self.height <= max_height
    }
}

/// A freshly encoded image produced by the compressor.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedFile {
    pub name: String,
    pub media_type: String,
    pub data: Vec<u8>,
    pub dimensions: Dimensions,
    pub last_modified: DateTime<Utc>,
}

/// Result of running one file through the pipeline.
#[derive(Debug, Clone)]
pub enum OutputFile {
    /// The caller's own file, passed through untouched.
    Original(Arc<InputFile>),
    Compressed(CompressedFile),
}

impl OutputFile {
    pub fn name(&self) -> &str {
        match self {
            OutputFile::Original(file) => &file.name,
            OutputFile::Compressed(file) => &file.name,
        }
    }

    pub fn media_type(&self) -> &str {
        match self {
            OutputFile::Original(file) => &file.media_type,
            OutputFile::Compressed(file) => &file.media_type,
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            OutputFile::Original(file) => &file.data,
            OutputFile::Compressed(file) => &file.data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data().len() as u64
    }

    pub fn is_original(&self) -> bool {
        matches!(self, OutputFile::Original(_))
    }

    /// True when this output is the very same allocation as `input`.
    pub fn is_same_as(&self, input: &Arc<InputFile>) -> bool {
        match self {
            OutputFile::Original(file) => Arc::ptr_eq(file, input),
            OutputFile::Compressed(_) => false,
        }
    }
}

/// Tuning for the single-image compressor and the batch orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// Encoder quality in (0, 1].
    pub quality: f32,
    /// Quality of the second pass when the first result is still above `target_size`.
    pub fallback_quality: f32,
    /// Files at or below this many bytes are never decoded.
    pub skip_threshold: u64,
    pub target_size: u64,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1080,
            quality: 0.9,
            fallback_quality: 0.7,
            skip_threshold: MIB,
            target_size: MIB,
        }
    }
}

impl CompressOptions {
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(crate::Error::Config(format!(
                "Maximum dimensions must be positive, got {}x{}",
                self.max_width, self.max_height
            )));
        }
        for (label, value) in [
            ("quality", self.quality),
            ("fallback quality", self.fallback_quality),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(crate::Error::Config(format!(
                    "Image {} must be in (0, 1], got {}",
                    label, value
                )));
            }
        }
        Ok(())
    }
}

// Blog API Request/Response models
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Done,
    Processing,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArticleListItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub status: ArticleStatus,
    pub is_published: bool,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub article: ArticleListItem,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageRef {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateArticleRequest {
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_context_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub images: Vec<ImageRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateArticleRequest {
    pub title: String,
    pub description: String,
    pub content: String,
    pub tag_ids: Vec<String>,
}

impl UpdateArticleRequest {
    /// Request that saves `detail` as it currently stands.
    pub fn from_detail(detail: &ArticleDetail) -> Self {
        Self {
            title: detail.article.title.clone(),
            description: detail.article.description.clone(),
            content: detail.content.clone(),
            tag_ids: detail.article.tags.iter().map(|t| t.id.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublishRequest {
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublishResponse {
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadedImage {
    /// Public URL of the stored image.
    pub filename: String,
    pub original_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageUploadResponse {
    pub images: Vec<UploadedImage>,
    pub article_slug: String,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub credentials_path: std::path::PathBuf,
    pub http_timeout_secs: u64,
    pub compress: CompressOptions,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = CompressOptions::default();
        let compress = CompressOptions {
            max_width: env_or("IMAGE_MAX_WIDTH", defaults.max_width)?,
            max_height: env_or("IMAGE_MAX_HEIGHT", defaults.max_height)?,
            quality: env_or("IMAGE_QUALITY", defaults.quality)?,
            fallback_quality: env_or("IMAGE_FALLBACK_QUALITY", defaults.fallback_quality)?,
            ..defaults
        };
        compress.validate()?;

        Ok(Self {
            api_base_url: std::env::var("BLOG_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.example.com".to_string()),
            credentials_path: std::env::var("BLOG_CREDENTIALS_PATH")
                .map(Into::into)
                .unwrap_or_else(|_| Path::new(".blog-admin").join("credentials.json")),
            http_timeout_secs: env_or("HTTP_TIMEOUT_SECS", 30)?,
            compress,
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> crate::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| crate::Error::Config(format!("{} is invalid ({}): {}", key, raw, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_article_list_item_deserialization() {
        let json = r#"{
            "id": "1",
            "title": "How to download a project",
            "description": "Export guide",
            "slug": "how-to-download-project",
            "status": "done",
            "is_published": true,
            "tags": [{"id": "1", "name": "Guide"}],
            "created_at": "2024-12-01T10:00:00Z"
        }"#;

        let article: ArticleListItem = serde_json::from_str(json).unwrap();
        assert_eq!(article.status, ArticleStatus::Done);
        assert_eq!(article.tags.len(), 1);
        assert!(article.is_published);
    }

    #[test]
    fn test_article_detail_flattens_list_fields() {
        let json = r##"{
            "id": "2",
            "title": "GitHub",
            "description": "Sync",
            "slug": "github-integration",
            "status": "processing",
            "is_published": false,
            "tags": [],
            "created_at": "2024-12-02T14:30:00Z",
            "content": "# GitHub"
        }"##;

        let detail: ArticleDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.article.slug, "github-integration");
        assert_eq!(detail.content, "# GitHub");
    }

    #[test]
    fn test_update_request_from_detail_keeps_tag_ids() {
        let detail = ArticleDetail {
            article: ArticleListItem {
                id: "1".to_string(),
                title: "Title".to_string(),
                description: "Desc".to_string(),
                slug: "title".to_string(),
                status: ArticleStatus::Done,
                is_published: false,
                tags: vec![
                    Tag {
                        id: "1".to_string(),
                        name: "Guide".to_string(),
                    },
                    Tag {
                        id: "2".to_string(),
                        name: "Export".to_string(),
                    },
                ],
                created_at: Utc::now(),
            },
            content: "Body".to_string(),
        };

        let request = UpdateArticleRequest::from_detail(&detail);
        assert_eq!(request.tag_ids, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(request.content, "Body");
    }

    #[test]
    fn test_create_request_omits_empty_optionals() {
        let request = CreateArticleRequest {
            topic: "Deploying".to_string(),
            additional_context_url: None,
            images: Vec::new(),
        };

        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"topic":"Deploying"}"#);
    }

    #[test]
    fn test_default_options_are_valid() {
        let options = CompressOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.max_width, 1920);
        assert_eq!(options.max_height, 1080);
        assert_eq!(options.skip_threshold, MIB);
    }

    #[test]
    fn test_options_reject_out_of_range_quality() {
        let zero = CompressOptions {
            quality: 0.0,
            ..CompressOptions::default()
        };
        assert!(matches!(zero.validate(), Err(crate::Error::Config(_))));

        let above_one = CompressOptions {
            fallback_quality: 1.5,
            ..CompressOptions::default()
        };
        assert!(above_one.validate().is_err());

        let zero_width = CompressOptions {
            max_width: 0,
            ..CompressOptions::default()
        };
        assert!(zero_width.validate().is_err());
    }

    #[test]
    fn test_output_file_identity() {
        let input = Arc::new(InputFile::new("a.txt", "text/plain", b"hello".to_vec()));
        let copy = Arc::new(InputFile::new("a.txt", "text/plain", b"hello".to_vec()));
        let output = OutputFile::Original(Arc::clone(&input));

        assert!(output.is_original());
        assert!(output.is_same_as(&input));
        assert!(!output.is_same_as(&copy));
        assert_eq!(output.size(), 5);
        assert_eq!(output.name(), "a.txt");
    }

    #[tokio::test]
    async fn test_input_file_from_path_sniffs_media_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.bin");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0, 0x00]).unwrap();

        let file = InputFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "upload.bin");
        assert_eq!(file.media_type, "image/jpeg");
        assert_eq!(file.size(), 5);
        assert!(file.is_image());
    }
}
