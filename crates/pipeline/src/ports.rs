//! Port traits implemented by the infrastructure crates.
//!
//! | Trait | Implemented in | External system |
//! |-------|----------------|-----------------|
//! | [`ArticleSource`] | `documents` | Document store / local export |
//! | [`InsightExtractor`] | `llm` | Language model |
//! | [`PostComposer`] | `llm` | Language model |
//! | [`Publisher`] | `publisher` | Social platform |
//! | [`StateStore`] | `storage` | Durable rotation record |
//!
//! Each trait's error type lives beside it and reports a [`RetryPolicy`]
//! where retrying can make sense.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::composition::{effective_length, CompositionRequest};
use crate::{Article, DocumentId, InsightExtraction, PublishReceipt, RetryPolicy, RotationState};

// ---------------------------------------------------------------------------
// Document source
// ---------------------------------------------------------------------------

/// Failure to obtain the article set.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("document {document} could not be fetched: {message}")]
    Unavailable { document: String, message: String },

    #[error("document {document} could not be read as articles: {message}")]
    Unreadable { document: String, message: String },
}

impl SourceError {
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Unavailable { .. } => RetryPolicy::Retryable { after: None },
            Self::Unreadable { .. } => RetryPolicy::NonRetryable,
        }
    }
}

/// Supplies the ordered article set of one newsletter document.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch_articles(&self, document: &DocumentId) -> Result<Vec<Article>, SourceError>;
}

// ---------------------------------------------------------------------------
// Language model
// ---------------------------------------------------------------------------

/// Failure of a language-model call.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("language model request failed: {message}")]
    Request { message: String },

    #[error("language model rate limit reached")]
    RateLimited { retry_after: Option<Duration> },

    #[error("language model returned an unusable response: {message}")]
    InvalidResponse { message: String },

    #[error("language model is not configured: {message}")]
    Configuration { message: String },
}

impl LlmError {
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Request { .. } => RetryPolicy::Retryable { after: None },
            Self::RateLimited { retry_after } => RetryPolicy::Retryable {
                after: *retry_after,
            },
            Self::InvalidResponse { .. } => RetryPolicy::Retryable { after: None },
            Self::Configuration { .. } => RetryPolicy::NonRetryable,
        }
    }
}

/// Extracts strategic insights from one article.
///
/// Output is untrusted and may hold fewer (or more) than seven insights; the
/// orchestrator normalises it into an [`crate::Analysis`].
#[async_trait]
pub trait InsightExtractor: Send + Sync {
    async fn extract(&self, article: &Article) -> Result<InsightExtraction, LlmError>;
}

/// Writes the body text of one post featuring one insight.
///
/// Called once per variation, sequentially. The returned text should respect
/// `request.max_chars`; longer text is cut by the caller.
#[async_trait]
pub trait PostComposer: Send + Sync {
    async fn compose(&self, request: &CompositionRequest) -> Result<String, LlmError>;
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// Failure to publish a post. Rotation state is never advanced after one.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("post is {effective_length} characters after link shortening, limit is {limit}")]
    TooLong { effective_length: usize, limit: usize },

    #[error("platform rate limit reached")]
    RateLimited { retry_after: Option<Duration> },

    #[error("platform rejected the post (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("platform could not be reached: {message}")]
    Transport { message: String },

    #[error("publishing credentials are missing: {message}")]
    MissingCredentials { message: String },
}

impl PublishError {
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::RateLimited { retry_after } => RetryPolicy::Retryable {
                after: *retry_after,
            },
            Self::Transport { .. } => RetryPolicy::Retryable { after: None },
            Self::TooLong { .. } | Self::Rejected { .. } | Self::MissingCredentials { .. } => {
                RetryPolicy::NonRetryable
            }
        }
    }
}

/// Publishes finished post text to the social platform.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, text: &str) -> Result<PublishReceipt, PublishError>;

    /// Length the platform charges for `text`.
    fn effective_length(&self, text: &str) -> usize {
        effective_length(text)
    }
}

// ---------------------------------------------------------------------------
// State store
// ---------------------------------------------------------------------------

/// Failure to read or write the rotation record.
#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("state record {path} could not be accessed: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("state record {path} is corrupt: {message}")]
    Corrupt { path: String, message: String },

    #[error("state record could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable home of the single [`RotationState`] record.
///
/// `load` returns [`RotationState::default`] when no record exists. `save`
/// writes the whole record in one operation and returns only once it is
/// durable; a reader never observes a partial record.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self) -> Result<RotationState, StateStoreError>;
    async fn save(&self, state: &RotationState) -> Result<(), StateStoreError>;
}
