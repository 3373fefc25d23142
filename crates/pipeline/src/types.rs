//! Shared records for the Cadence domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! content with invariants (an analysis holds at most seven distinct insights,
//! a variant's character count is the effective platform length) and are what
//! the orchestrator caches, composes and publishes.
//!
//! Persisted records use `deny_unknown_fields`: a state file written by
//! something else is rejected at the load boundary instead of being
//! half-understood.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::composition::FocusTheme;
use crate::{ArticleNumber, PostId, VariationNumber};

/// Number of insights an extraction is expected to yield per article.
pub const INSIGHTS_PER_ANALYSIS: usize = 7;

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

/// One numbered source document parsed out of the newsletter.
///
/// An empty `url` means the document carried no link for this article; only
/// the allowed-incomplete article may be in that state (see
/// [`crate::validation`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Article {
    /// Position within the document.
    pub number: ArticleNumber,
    /// Article headline. Never used in composed posts.
    pub title: String,
    /// Canonical link, or empty.
    #[serde(default)]
    pub url: String,
    /// Body text.
    pub content: String,
    /// Whitespace-separated token count of `content`.
    pub word_count: usize,
}

impl Article {
    /// Creates an article, deriving `word_count` from `content`.
    pub fn new(
        number: ArticleNumber,
        title: impl Into<String>,
        url: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let content = content.into();
        let word_count = content.split_whitespace().count();
        Self {
            number,
            title: title.into().trim().to_string(),
            url: url.into().trim().to_string(),
            content,
            word_count,
        }
    }

    /// Returns `true` if the article carries a non-blank URL.
    pub fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }

    /// Returns `true` if the article carries a non-blank title.
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Raw output of the insight extractor before normalisation.
///
/// Language-model output is untrusted: it may contain blanks, duplicates or
/// more (or fewer) than [`INSIGHTS_PER_ANALYSIS`] insights.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightExtraction {
    #[serde(default)]
    pub key_insights: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub expert_references: Vec<String>,
    #[serde(default, alias = "frameworks_mentioned")]
    pub frameworks: Vec<String>,
}

/// Cached insight analysis for one article.
///
/// `article_url` is copied from the source article when the analysis is built
/// and is compared against the article cache on every run. A mismatch means
/// the two caches describe different documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Analysis {
    pub article_number: ArticleNumber,
    pub article_title: String,
    pub article_url: String,
    /// Ordered, distinct, at most [`INSIGHTS_PER_ANALYSIS`] entries.
    pub key_insights: Vec<String>,
    pub themes: BTreeSet<String>,
    #[serde(default)]
    pub expert_references: Vec<String>,
    #[serde(default)]
    pub frameworks: Vec<String>,
}

impl Analysis {
    /// Builds a normalised analysis for `article` from raw extractor output.
    ///
    /// Insights are trimmed, blanks and repeats are dropped, and the list is
    /// cut to [`INSIGHTS_PER_ANALYSIS`]. A short list is kept as-is; the
    /// composer cycles through whatever pool exists.
    pub fn from_extraction(article: &Article, extraction: InsightExtraction) -> Self {
        let mut seen = HashSet::new();
        let key_insights = extraction
            .key_insights
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .take(INSIGHTS_PER_ANALYSIS)
            .collect();

        Self {
            article_number: article.number,
            article_title: article.title.clone(),
            article_url: article.url.clone(),
            key_insights,
            themes: clean(extraction.themes).collect(),
            expert_references: clean(extraction.expert_references).collect(),
            frameworks: clean(extraction.frameworks).collect(),
        }
    }

    /// Returns `true` when the extractor yielded the full insight count.
    pub fn is_complete(&self) -> bool {
        self.key_insights.len() == INSIGHTS_PER_ANALYSIS
    }
}

fn clean(values: Vec<String>) -> impl Iterator<Item = String> {
    values
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Composition and publication
// ---------------------------------------------------------------------------

/// One composed post for an article. Recomposed on every run; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedVariant {
    pub article_number: ArticleNumber,
    pub variation_number: VariationNumber,
    pub focus: FocusTheme,
    /// Full post text: body, link and hashtags.
    pub content: String,
    /// Effective length of `content` (links counted at the shortened width).
    pub character_count: usize,
    pub hashtags: Vec<String>,
    pub insights_used: Vec<String>,
}

/// Confirmation returned by the publisher for a post that went live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub post_id: PostId,
    pub published_at: Timestamp,
    pub effective_length: usize,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the underlying representation can change without affecting the
/// domain API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
