//! Blog backend integration
//!
//! Article CRUD and image uploads against the remote REST API, authenticated
//! with the admin's Basic credentials.

pub mod client;
pub mod mock;
pub mod session;
pub mod upload;

pub use client::ApiClient;
pub use mock::MockBlogApi;
pub use session::{Credentials, CredentialStore, FileCredentialStore, MemoryCredentialStore, Session};
pub use upload::upload_images;

use crate::models::{
    ArticleDetail, ArticleListItem, CreateArticleRequest, ImageUploadResponse, OutputFile,
    PublishResponse, UpdateArticleRequest,
};
use crate::Result;
use async_trait::async_trait;

pub const DEFAULT_LIST_LIMIT: usize = 10;

#[async_trait]
pub trait BlogApi: Send + Sync {
    async fn verify_auth(&self) -> Result<()>;
    async fn list_articles(&self, limit: usize) -> Result<Vec<ArticleListItem>>;
    async fn get_article(&self, id: &str) -> Result<ArticleDetail>;
    async fn create_article(&self, request: &CreateArticleRequest) -> Result<ArticleListItem>;
    async fn update_article(
        &self,
        id: &str,
        request: &UpdateArticleRequest,
    ) -> Result<ArticleListItem>;
    async fn publish_article(&self, id: &str, is_published: bool) -> Result<PublishResponse>;
    async fn delete_article(&self, id: &str) -> Result<()>;
    /// Send `files` in one multipart request.
    async fn upload_batch(
        &self,
        files: &[OutputFile],
        topic: &str,
        article_slug: Option<&str>,
    ) -> Result<ImageUploadResponse>;
}
