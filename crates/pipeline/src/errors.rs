//! Run-level error, step and retry-policy types for the Cadence domain.
//!
//! [`PipelineError`] covers every condition that stops an orchestrator or
//! scheduler run. Component-level errors (document source, language model,
//! publisher, state store) are defined next to their port traits in
//! [`crate::ports`] and wrapped here.
//!
//! [`RetryPolicy`] is a cross-cutting concern: the core never retries, but the
//! operator is told whether re-running the same command is likely to help.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::{LlmError, PublishError, SourceError, StateStoreError};
use crate::{ArticleNumber, ValidationError, VariationNumber};

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// - `Retryable`: timeouts, transport failures, rate-limit responses.
/// - `NonRetryable`: invalid data, integrity failures, rejected content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt. `None` means retry
        /// immediately or apply the caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// A human must change something before the run can succeed.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Run steps
// ---------------------------------------------------------------------------

/// The orchestrator step at which a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStep {
    LoadState,
    ProjectSchedule,
    LoadArticles,
    ResolveArticle,
    ResolveAnalysis,
    CheckIntegrity,
    Compose,
    Publish,
    PersistState,
}

impl std::fmt::Display for RunStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::LoadState => "load_state",
            Self::ProjectSchedule => "project_schedule",
            Self::LoadArticles => "load_articles",
            Self::ResolveArticle => "resolve_article",
            Self::ResolveAnalysis => "resolve_analysis",
            Self::CheckIntegrity => "check_integrity",
            Self::Compose => "compose",
            Self::Publish => "publish",
            Self::PersistState => "persist_state",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Pipeline-level errors
// ---------------------------------------------------------------------------

/// Errors that stop a run.
///
/// Validation failures aggregate every violation; everything else fails fast
/// on the first occurrence.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Freshly ingested articles failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The document source could not deliver articles.
    #[error("source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    /// The rotation pointer names an article outside the known set.
    ///
    /// Indicates a corrupted or externally edited state record. No automatic
    /// recovery is attempted.
    #[error("article #{article} not found among {known} known articles")]
    ArticleNotFound {
        article: ArticleNumber,
        known: usize,
    },

    /// The article cache and the analysis cache disagree on the article URL.
    ///
    /// Never auto-repaired: the two caches describe different documents.
    #[error(
        "URL integrity check failed for article #{article}: article has '{article_url}', analysis has '{analysis_url}'"
    )]
    UrlIntegrity {
        article: ArticleNumber,
        article_url: String,
        analysis_url: String,
    },

    /// The insight extractor failed.
    #[error("insight extraction failed for article #{article}: {source}")]
    Extraction {
        article: ArticleNumber,
        #[source]
        source: LlmError,
    },

    /// The analysis holds no insights at all.
    #[error("article #{article} has no insights to compose from")]
    EmptyInsightPool { article: ArticleNumber },

    /// The composer failed for one variation.
    #[error("composing variation {variation} of article #{article} failed: {source}")]
    Composition {
        article: ArticleNumber,
        variation: VariationNumber,
        #[source]
        source: LlmError,
    },

    /// A preview asked for more weeks than a single run projects.
    #[error("preview of {weeks} weeks exceeds the maximum of {max}")]
    PreviewTooLong { weeks: u32, max: u32 },

    /// The rotation pointer names a variation the batch does not contain.
    #[error("variation {variation} is outside the composed batch of {batch_size}")]
    VariationOutOfRange {
        variation: VariationNumber,
        batch_size: usize,
    },

    /// Publishing failed. Rotation state is left unchanged.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Loading or persisting the rotation record failed.
    #[error(transparent)]
    State(#[from] StateStoreError),
}

impl PipelineError {
    /// Whether re-running the same command may succeed without intervention.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::SourceUnavailable(e) => e.retry_policy(),
            Self::Extraction { source, .. } | Self::Composition { source, .. } => {
                source.retry_policy()
            }
            Self::Publish(e) => e.retry_policy(),
            Self::State(StateStoreError::Io { .. }) => RetryPolicy::Retryable { after: None },
            _ => RetryPolicy::NonRetryable,
        }
    }
}

/// A [`PipelineError`] tagged with the step that produced it.
#[derive(Debug, Error)]
#[error("{step} failed: {error}")]
pub struct RunFailure {
    pub step: RunStep,
    #[source]
    pub error: PipelineError,
}

impl RunFailure {
    pub fn new(step: RunStep, error: impl Into<PipelineError>) -> Self {
        Self {
            step,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_failure_names_step() {
        let failure = RunFailure::new(
            RunStep::ResolveArticle,
            PipelineError::ArticleNotFound {
                article: ArticleNumber::new(9),
                known: 5,
            },
        );
        assert_eq!(
            failure.to_string(),
            "resolve_article failed: article #9 not found among 5 known articles"
        );
    }

    #[test]
    fn test_retry_policy_follows_component() {
        let rate_limited = PipelineError::Publish(PublishError::RateLimited {
            retry_after: Some(Duration::from_secs(60)),
        });
        assert_eq!(
            rate_limited.retry_policy(),
            RetryPolicy::Retryable {
                after: Some(Duration::from_secs(60))
            }
        );

        let integrity = PipelineError::UrlIntegrity {
            article: ArticleNumber::new(1),
            article_url: "a".into(),
            analysis_url: "b".into(),
        };
        assert_eq!(integrity.retry_policy(), RetryPolicy::NonRetryable);
    }
}
