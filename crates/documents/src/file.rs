//! Newsletter document read from a local text file.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use pipeline::{Article, ArticleSource, DocumentId, SourceError};
use tracing::info;

use crate::parse_document;

/// Reads the newsletter from a local UTF-8 text file.
///
/// The [`DocumentId`] passed to `fetch_articles` is only used for error
/// messages; the file path is fixed at construction.
#[derive(Debug, Clone)]
pub struct FileDocumentSource {
    path: PathBuf,
}

impl FileDocumentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ArticleSource for FileDocumentSource {
    async fn fetch_articles(&self, document: &DocumentId) -> Result<Vec<Article>, SourceError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidData => SourceError::Unreadable {
                    document: document.to_string(),
                    message: format!("{} is not valid UTF-8", self.path.display()),
                },
                _ => SourceError::Unavailable {
                    document: document.to_string(),
                    message: format!("{}: {e}", self.path.display()),
                },
            })?;

        let articles = parse_document(&text);
        info!(path = %self.path.display(), articles = articles.len(), "Read newsletter document from file");
        Ok(articles)
    }
}
