use super::BlogApi;
use crate::models::{
    ArticleDetail, ArticleListItem, ArticleStatus, CreateArticleRequest, ImageUploadResponse,
    OutputFile, PublishResponse, Tag, UpdateArticleRequest, UploadedImage,
};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// In-memory blog backend.
#[derive(Clone)]
pub struct MockBlogApi {
    articles: Arc<Mutex<Vec<ArticleDetail>>>,
    base_url: String,
    upload_calls: Arc<Mutex<Vec<Vec<String>>>>,
    failing_uploads: Arc<Mutex<HashSet<String>>>,
    unauthorized_uploads: Arc<Mutex<HashSet<String>>>,
    reject_batches: bool,
    unauthorized: bool,
}

impl MockBlogApi {
    pub fn new() -> Self {
        Self {
            articles: Arc::new(Mutex::new(Vec::new())),
            base_url: "https://mock-cdn.example.com/images".to_string(),
            upload_calls: Arc::new(Mutex::new(Vec::new())),
            failing_uploads: Arc::new(Mutex::new(HashSet::new())),
            unauthorized_uploads: Arc::new(Mutex::new(HashSet::new())),
            reject_batches: false,
            unauthorized: false,
        }
    }

    pub fn with_article(self, article: ArticleDetail) -> Self {
        self.articles.lock().unwrap().push(article);
        self
    }

    /// Fail any multipart request carrying more than one file.
    pub fn with_batch_rejection(mut self) -> Self {
        self.reject_batches = true;
        self
    }

    /// Fail any upload that includes a file with this name.
    pub fn with_upload_failure(self, name: &str) -> Self {
        self.failing_uploads.lock().unwrap().insert(name.to_string());
        self
    }

    /// Reject credentials on any upload that includes a file with this name.
    pub fn with_upload_unauthorized(self, name: &str) -> Self {
        self.unauthorized_uploads
            .lock()
            .unwrap()
            .insert(name.to_string());
        self
    }

    /// Answer every call as if the credentials were wrong.
    pub fn with_unauthorized(mut self) -> Self {
        self.unauthorized = true;
        self
    }

    /// File names of every upload request, in call order.
    pub fn get_upload_calls(&self) -> Vec<Vec<String>> {
        self.upload_calls.lock().unwrap().clone()
    }

    pub fn get_articles(&self) -> Vec<ArticleDetail> {
        self.articles.lock().unwrap().clone()
    }

    fn check_auth(&self) -> Result<()> {
        if self.unauthorized {
            return Err(Error::Unauthorized);
        }
        Ok(())
    }

    fn not_found(id: &str) -> Error {
        Error::Api {
            status: 404,
            message: format!("Article not found: {}", id),
        }
    }
}

impl Default for MockBlogApi {
    fn default() -> Self {
        Self::new()
    }
}

pub fn slugify(topic: &str) -> String {
    topic
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[async_trait]
impl BlogApi for MockBlogApi {
    async fn verify_auth(&self) -> Result<()> {
        self.check_auth()
    }

    async fn list_articles(&self, limit: usize) -> Result<Vec<ArticleListItem>> {
        self.check_auth()?;
        Ok(self
            .articles
            .lock()
            .unwrap()
            .iter()
            .take(limit)
            .map(|a| a.article.clone())
            .collect())
    }

    async fn get_article(&self, id: &str) -> Result<ArticleDetail> {
        self.check_auth()?;
        self.articles
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.article.id == id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn create_article(&self, request: &CreateArticleRequest) -> Result<ArticleListItem> {
        self.check_auth()?;
        let mut articles = self.articles.lock().unwrap();
        let article = ArticleListItem {
            id: (articles.len() + 1).to_string(),
            title: request.topic.clone(),
            description: format!("Generated article about: {}", request.topic),
            slug: slugify(&request.topic),
            status: ArticleStatus::Processing,
            is_published: false,
            tags: vec![Tag {
                id: "1".to_string(),
                name: "Guide".to_string(),
            }],
            created_at: Utc::now(),
        };
        let content = request
            .images
            .iter()
            .map(|image| format!("![]({})", image.url))
            .collect::<Vec<_>>()
            .join("\n");

        articles.insert(
            0,
            ArticleDetail {
                article: article.clone(),
                content,
            },
        );
        Ok(article)
    }

    async fn update_article(
        &self,
        id: &str,
        request: &UpdateArticleRequest,
    ) -> Result<ArticleListItem> {
        self.check_auth()?;
        let mut articles = self.articles.lock().unwrap();
        let detail = articles
            .iter_mut()
            .find(|a| a.article.id == id)
            .ok_or_else(|| Self::not_found(id))?;

        detail.article.title = request.title.clone();
        detail.article.description = request.description.clone();
        detail.content = request.content.clone();
        detail
            .article
            .tags
            .retain(|tag| request.tag_ids.contains(&tag.id));
        Ok(detail.article.clone())
    }

    async fn publish_article(&self, id: &str, is_published: bool) -> Result<PublishResponse> {
        self.check_auth()?;
        if let Some(detail) = self
            .articles
            .lock()
            .unwrap()
            .iter_mut()
            .find(|a| a.article.id == id)
        {
            detail.article.is_published = is_published;
        }
        Ok(PublishResponse { is_published })
    }

    async fn delete_article(&self, id: &str) -> Result<()> {
        self.check_auth()?;
        self.articles.lock().unwrap().retain(|a| a.article.id != id);
        Ok(())
    }

    async fn upload_batch(
        &self,
        files: &[OutputFile],
        topic: &str,
        article_slug: Option<&str>,
    ) -> Result<ImageUploadResponse> {
        self.check_auth()?;

        let names: Vec<String> = files.iter().map(|f| f.name().to_string()).collect();
        self.upload_calls.lock().unwrap().push(names.clone());

        if self.reject_batches && files.len() > 1 {
            return Err(Error::Api {
                status: 413,
                message: "Request entity too large".to_string(),
            });
        }
        if names
            .iter()
            .any(|n| self.unauthorized_uploads.lock().unwrap().contains(n))
        {
            return Err(Error::Unauthorized);
        }
        let failing = self.failing_uploads.lock().unwrap();
        if let Some(name) = names.iter().find(|n| failing.contains(*n)) {
            return Err(Error::Api {
                status: 500,
                message: format!("Failed to store {}", name),
            });
        }

        Ok(ImageUploadResponse {
            images: names
                .into_iter()
                .map(|name| UploadedImage {
                    filename: format!("{}/{}", self.base_url, name),
                    original_name: name,
                })
                .collect(),
            article_slug: article_slug
                .map(str::to_string)
                .unwrap_or_else(|| slugify(topic)),
        })
    }
}
