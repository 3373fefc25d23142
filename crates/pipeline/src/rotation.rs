//! Rotation pointer and the persisted rotation record.
//!
//! The pointer walks `(article, variation)` pairs in a fixed total order:
//!
//! | current variation | next |
//! |-------------------|------|
//! | `< V` | same article, variation + 1 |
//! | `== V` | variation 1 of the next article, wrapping to article 1 after the last |
//!
//! so it cycles with period `article_count * V`. [`RotationPointer::advance`]
//! is pure; [`RotationState::advance`] applies it to a copy of the record and
//! leaves the publish counters alone. Counters change only through
//! [`RotationState::record_publish`], which the orchestrator calls once a
//! publish is confirmed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Analysis, Article, ArticleNumber, Timestamp, VariationNumber};

/// Number of composed variations per article.
pub const VARIATIONS_PER_ARTICLE: u32 = 4;

/// The `(current_article, current_variation)` pair naming the next unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RotationPointer {
    pub article: ArticleNumber,
    pub variation: VariationNumber,
}

impl RotationPointer {
    pub fn new(article: ArticleNumber, variation: VariationNumber) -> Self {
        Self { article, variation }
    }

    /// `(1, 1)`.
    pub fn start() -> Self {
        Self::new(ArticleNumber::first(), VariationNumber::first())
    }

    /// Returns the pointer that follows `self` for a set of `article_count`
    /// articles with `variations` posts each.
    pub fn advance_with(self, article_count: u32, variations: u32) -> Self {
        if self.variation.get() < variations {
            return Self::new(self.article, VariationNumber::new(self.variation.get() + 1));
        }
        let next_article = if self.article.get() >= article_count {
            ArticleNumber::first()
        } else {
            ArticleNumber::new(self.article.get() + 1)
        };
        Self::new(next_article, VariationNumber::first())
    }

    /// [`advance_with`](Self::advance_with) using [`VARIATIONS_PER_ARTICLE`].
    pub fn advance(self, article_count: u32) -> Self {
        self.advance_with(article_count, VARIATIONS_PER_ARTICLE)
    }

    /// Returns `true` if both ordinals are within `1..=article_count` and
    /// `1..=VARIATIONS_PER_ARTICLE`.
    pub fn is_within(self, article_count: u32) -> bool {
        (1..=article_count).contains(&self.article.get())
            && (1..=VARIATIONS_PER_ARTICLE).contains(&self.variation.get())
    }
}

impl std::fmt::Display for RotationPointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "article #{} variation {}", self.article, self.variation)
    }
}

/// The single persisted record: pointer, publish counters and caches.
///
/// Written as a complete snapshot on every save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RotationState {
    pub current_article: ArticleNumber,
    pub current_variation: VariationNumber,
    pub last_published: Option<Timestamp>,
    pub total_published: u64,
    #[serde(default)]
    pub articles_cache: Vec<Article>,
    #[serde(default)]
    pub analysis_cache: BTreeMap<ArticleNumber, Analysis>,
}

impl Default for RotationState {
    fn default() -> Self {
        let start = RotationPointer::start();
        Self {
            current_article: start.article,
            current_variation: start.variation,
            last_published: None,
            total_published: 0,
            articles_cache: Vec::new(),
            analysis_cache: BTreeMap::new(),
        }
    }
}

impl RotationState {
    /// The current rotation pointer.
    pub fn pointer(&self) -> RotationPointer {
        RotationPointer::new(self.current_article, self.current_variation)
    }

    /// Returns a copy of this state with the pointer moved one step.
    ///
    /// Counters and caches are carried over unchanged.
    #[must_use]
    pub fn advance(&self, article_count: u32) -> Self {
        let next = self.pointer().advance(article_count);
        Self {
            current_article: next.article,
            current_variation: next.variation,
            ..self.clone()
        }
    }

    /// Records a confirmed publish at `at`.
    pub fn record_publish(&mut self, at: Timestamp) {
        self.last_published = Some(at);
        self.total_published += 1;
    }

    /// Looks up a cached article by number.
    pub fn article(&self, number: ArticleNumber) -> Option<&Article> {
        self.articles_cache.iter().find(|a| a.number == number)
    }

    /// Looks up a cached analysis by article number.
    pub fn analysis(&self, number: ArticleNumber) -> Option<&Analysis> {
        self.analysis_cache.get(&number)
    }
}
