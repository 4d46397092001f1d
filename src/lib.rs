//! Admin tooling for a blog backend - prepares article images before upload
//!
//! Images picked for an article are downsized and re-encoded locally so large
//! photos never cross the network at full size, then uploaded to the blog API
//! together with the article's topic.

pub mod api;
pub mod app;
pub mod error;
pub mod image;
pub mod models;
pub mod pipeline;

pub use error::{CompressError, Error, Result};
