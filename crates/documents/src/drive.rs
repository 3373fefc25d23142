//! Newsletter document exported from Google Drive as plain text.

use std::time::Duration;

use async_trait::async_trait;
use pipeline::{Article, ArticleSource, DocumentId, SourceError};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use crate::parse_document;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Exports a Google Docs document as plain text through the Drive v3 API.
///
/// Authentication is a caller-supplied OAuth access token with at least the
/// `drive.readonly` scope. Token acquisition and refresh happen outside this
/// crate.
pub struct DriveDocumentSource {
    client: Client,
    base_url: String,
    access_token: String,
}

impl DriveDocumentSource {
    /// Creates a source against the public Drive endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(access_token: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: access_token.into(),
        })
    }

    /// Points the source at another Drive-compatible endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn export_url(&self, document: &DocumentId) -> String {
        format!("{}/drive/v3/files/{}/export", self.base_url, document)
    }
}

#[async_trait]
impl ArticleSource for DriveDocumentSource {
    async fn fetch_articles(&self, document: &DocumentId) -> Result<Vec<Article>, SourceError> {
        let url = self.export_url(document);
        debug!(%url, "Exporting document");

        let response = self
            .client
            .get(&url)
            .query(&[("mimeType", "text/plain")])
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| SourceError::Unavailable {
                document: document.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, document = %document, "Drive export failed");
            let message = format!("Drive returned {status}: {}", body.trim());
            return Err(
                if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    SourceError::Unavailable {
                        document: document.to_string(),
                        message,
                    }
                } else {
                    SourceError::Unreadable {
                        document: document.to_string(),
                        message,
                    }
                },
            );
        }

        let text = response.text().await.map_err(|e| SourceError::Unreadable {
            document: document.to_string(),
            message: e.to_string(),
        })?;

        let articles = parse_document(&text);
        info!(document = %document, articles = articles.len(), "Read newsletter document from Drive");
        Ok(articles)
    }
}
