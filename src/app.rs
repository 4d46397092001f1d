//! Application wiring and the article upload workflow.

use crate::api::{upload_images, ApiClient, BlogApi, Credentials, FileCredentialStore, Session};
use crate::image::{ImageCompressor, ImageProcessor};
use crate::models::{
    ArticleListItem, CompressOptions, Config, CreateArticleRequest, ImageRef, InputFile,
    OutputFile, PublishResponse, UpdateArticleRequest, UploadedImage, MIB,
};
use crate::pipeline::process_images;
use crate::{Error, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// No single file above this size is accepted for upload.
pub const MAX_UPLOAD_SIZE: u64 = 10 * MIB;

/// Reject the batch if any file exceeds [`MAX_UPLOAD_SIZE`].
pub fn check_sizes(files: &[Arc<InputFile>]) -> Result<()> {
    match files.iter().find(|f| f.size() > MAX_UPLOAD_SIZE) {
        Some(file) => Err(Error::Oversize {
            name: file.name.clone(),
            size: file.size(),
        }),
        None => Ok(()),
    }
}

/// File names for writing `outputs` into one directory.
///
/// Repeated names get a `-2`, `-3`, ... suffix before the extension, so
/// `cover.png` and `cover.jpg` (both emitted as `cover.jpg`) do not overwrite
/// each other.
pub fn unique_file_names(outputs: &[OutputFile]) -> Vec<String> {
    let mut taken = HashSet::new();
    outputs
        .iter()
        .map(|output| {
            let name = output.name();
            let path = Path::new(name);
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
            let extension = path.extension().and_then(|e| e.to_str());

            let mut candidate = name.to_string();
            let mut n = 2;
            while !taken.insert(candidate.clone()) {
                candidate = match extension {
                    Some(ext) => format!("{}-{}.{}", stem, n, ext),
                    None => format!("{}-{}", stem, n),
                };
                n += 1;
            }
            candidate
        })
        .collect()
}

fn require_topic(topic: &str) -> Result<&str> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(Error::Validation("Article topic is required".to_string()));
    }
    Ok(topic)
}

/// Partial edit of an article; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ArticleEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub tag_ids: Option<Vec<String>>,
}

/// Collects uploaded images for a new article, then creates it.
pub struct UploadForm {
    api: Arc<dyn BlogApi>,
    compressor: Arc<dyn ImageCompressor>,
    options: CompressOptions,
    images: Vec<UploadedImage>,
    article_slug: Option<String>,
}

impl UploadForm {
    pub fn new(
        api: Arc<dyn BlogApi>,
        compressor: Arc<dyn ImageCompressor>,
        options: CompressOptions,
    ) -> Self {
        Self {
            api,
            compressor,
            options,
            images: Vec::new(),
            article_slug: None,
        }
    }

    pub fn images(&self) -> &[UploadedImage] {
        &self.images
    }

    pub fn article_slug(&self) -> Option<&str> {
        self.article_slug.as_deref()
    }

    /// Compress and upload `files` for `topic`.
    ///
    /// Returns every image uploaded through this form so far.
    pub async fn submit(&mut self, topic: &str, files: &[Arc<InputFile>]) -> Result<&[UploadedImage]> {
        let topic = require_topic(topic)?;
        check_sizes(files)?;

        let outputs = process_images(files, Arc::clone(&self.compressor), &self.options).await;
        let result = upload_images(
            self.api.as_ref(),
            &outputs,
            topic,
            self.article_slug.as_deref(),
        )
        .await;

        match result {
            Ok(response) => {
                self.record(response.images, response.article_slug);
                Ok(&self.images)
            }
            Err(Error::PartialUpload { uploaded, source }) => {
                self.record(uploaded.images.clone(), uploaded.article_slug.clone());
                Err(Error::PartialUpload { uploaded, source })
            }
            Err(e) => Err(e),
        }
    }

    fn record(&mut self, images: Vec<UploadedImage>, article_slug: String) {
        self.images.extend(images);
        if !article_slug.is_empty() {
            self.article_slug = Some(article_slug);
        }
    }

    /// Create the article from the topic and the images uploaded so far, then reset the form.
    pub async fn create_article(
        &mut self,
        topic: &str,
        additional_context_url: Option<String>,
    ) -> Result<ArticleListItem> {
        let request = CreateArticleRequest {
            topic: require_topic(topic)?.to_string(),
            additional_context_url: additional_context_url.filter(|url| !url.trim().is_empty()),
            images: self
                .images
                .iter()
                .map(|image| ImageRef {
                    url: image.filename.clone(),
                })
                .collect(),
        };

        let article = self.api.create_article(&request).await?;
        info!("Created article {} ({})", article.id, article.slug);

        self.images.clear();
        self.article_slug = None;
        Ok(article)
    }
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub api: Arc<dyn BlogApi>,
    pub compressor: Arc<dyn ImageCompressor>,
    pub session: Arc<Session>,
}

/// Entry point for the CLI: session, API client and image pipeline together.
pub struct App {
    api: Arc<dyn BlogApi>,
    compressor: Arc<dyn ImageCompressor>,
    session: Arc<Session>,
    options: CompressOptions,
}

impl App {
    pub fn with_services(services: AppServices, options: CompressOptions) -> Self {
        Self {
            api: services.api,
            compressor: services.compressor,
            session: services.session,
            options,
        }
    }

    /// Construct an app from configuration, restoring saved credentials.
    pub fn new(config: &Config) -> Result<Self> {
        let store = FileCredentialStore::new(&config.credentials_path);
        let session = Arc::new(Session::restore(Box::new(store))?);

        let api = ApiClient::new(
            Arc::clone(&session),
            Duration::from_secs(config.http_timeout_secs),
        )?
        .with_base_url(config.api_base_url.clone());
        info!("Using blog API at {}", config.api_base_url);

        Ok(Self::with_services(
            AppServices {
                api: Arc::new(api),
                compressor: Arc::new(ImageProcessor::new()),
                session,
            },
            config.compress.clone(),
        ))
    }

    pub fn api(&self) -> &dyn BlogApi {
        self.api.as_ref()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn upload_form(&self) -> UploadForm {
        UploadForm::new(
            Arc::clone(&self.api),
            Arc::clone(&self.compressor),
            self.options.clone(),
        )
    }

    /// Save `credentials` and check them against the API; forget them if rejected.
    pub async fn login(&self, credentials: Credentials) -> Result<()> {
        let username = credentials.username.clone();
        self.session.login(credentials)?;

        match self.api.verify_auth().await {
            Ok(()) => {
                info!("Logged in as {}", username);
                Ok(())
            }
            Err(e) => {
                if let Err(clear_err) = self.session.logout() {
                    warn!("Failed to clear rejected credentials: {}", clear_err);
                }
                Err(e)
            }
        }
    }

    pub fn logout(&self) -> Result<()> {
        self.session.logout()?;
        info!("Logged out");
        Ok(())
    }

    /// Read files from disk and run them through the image pipeline.
    pub async fn compress_files(&self, paths: &[PathBuf]) -> Result<Vec<OutputFile>> {
        let files = read_files(paths).await?;
        check_sizes(&files)?;
        Ok(process_images(&files, Arc::clone(&self.compressor), &self.options).await)
    }

    /// Flip the published flag of an article.
    pub async fn toggle_publish(&self, id: &str) -> Result<PublishResponse> {
        let detail = self.api.get_article(id).await?;
        self.api
            .publish_article(id, !detail.article.is_published)
            .await
    }

    pub async fn edit_article(&self, id: &str, edit: ArticleEdit) -> Result<ArticleListItem> {
        let detail = self.api.get_article(id).await?;
        let mut request = UpdateArticleRequest::from_detail(&detail);

        if let Some(title) = edit.title {
            request.title = title;
        }
        if let Some(description) = edit.description {
            request.description = description;
        }
        if let Some(content) = edit.content {
            request.content = content;
        }
        if let Some(tag_ids) = edit.tag_ids {
            request.tag_ids = tag_ids;
        }

        self.api.update_article(id, &request).await
    }
}

pub async fn read_files(paths: &[PathBuf]) -> Result<Vec<Arc<InputFile>>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(Arc::new(InputFile::from_path(path).await?));
    }
    Ok(files)
}
