//! Cache-or-compute resolution of articles and analyses.
//!
//! Every function here works on a caller-owned working copy of the
//! [`RotationState`]. Newly fetched articles or freshly built analyses are
//! written into that copy; whether and when the copy is persisted is the
//! caller's decision.

use pipeline::{
    Analysis, Article, ArticleNumber, ArticleOrigin, ArticleSource, ArticleValidator, DocumentId,
    InsightExtractor, PipelineError, RotationState,
};
use tracing::{debug, info, warn};

/// Returns where the article cache came from after making sure it is filled.
///
/// An empty cache is filled from `source` and validated; a failure aborts.
/// A filled cache is revalidated because upstream edits can make it stale;
/// a failure there is logged and the cached set is used anyway.
pub async fn resolve_articles(
    state: &mut RotationState,
    source: &dyn ArticleSource,
    document: &DocumentId,
    validator: &ArticleValidator,
) -> Result<ArticleOrigin, PipelineError> {
    if state.articles_cache.is_empty() {
        info!(document = %document, "Fetching articles from document source");
        let articles = source.fetch_articles(document).await?;
        let report = validator.validate(&articles)?;
        for warning in &report.warnings {
            warn!(%warning, "Article warning");
        }
        info!(
            total = report.total_articles,
            valid = report.valid_articles,
            "Fetched articles validated"
        );
        state.articles_cache = articles;
        return Ok(ArticleOrigin::Fresh);
    }

    match validator.validate(&state.articles_cache) {
        Ok(report) => debug!(
            total = report.total_articles,
            "Cached articles revalidated"
        ),
        Err(e) => warn!(error = %e, "Cached articles failed validation; continuing with cached data"),
    }
    Ok(ArticleOrigin::Cached)
}

/// Finds the article a rotation pointer names.
pub fn resolve_article(
    articles: &[Article],
    number: ArticleNumber,
) -> Result<&Article, PipelineError> {
    articles
        .iter()
        .find(|a| a.number == number)
        .ok_or(PipelineError::ArticleNotFound {
            article: number,
            known: articles.len(),
        })
}

/// Returns the analysis for `article`, building and caching it when absent.
///
/// The boolean is `true` when the analysis was built by this call. An
/// extraction yielding no usable insight is not cached.
pub async fn resolve_analysis(
    state: &mut RotationState,
    extractor: &dyn InsightExtractor,
    article: &Article,
) -> Result<(Analysis, bool), PipelineError> {
    if let Some(cached) = state.analysis(article.number) {
        debug!(article = %article.number, insights = cached.key_insights.len(), "Using cached analysis");
        return Ok((cached.clone(), false));
    }

    info!(article = %article.number, "Extracting insights");
    let extraction = extractor
        .extract(article)
        .await
        .map_err(|source| PipelineError::Extraction {
            article: article.number,
            source,
        })?;
    let analysis = Analysis::from_extraction(article, extraction);

    if analysis.key_insights.is_empty() {
        return Err(PipelineError::EmptyInsightPool {
            article: article.number,
        });
    }
    if !analysis.is_complete() {
        warn!(
            article = %article.number,
            insights = analysis.key_insights.len(),
            "Extraction returned fewer insights than expected; variations will reuse insights"
        );
    }

    state
        .analysis_cache
        .insert(article.number, analysis.clone());
    Ok((analysis, true))
}

/// Fails unless the article and its analysis point at the same URL.
pub fn check_integrity(article: &Article, analysis: &Analysis) -> Result<(), PipelineError> {
    if article.url == analysis.article_url {
        return Ok(());
    }
    Err(PipelineError::UrlIntegrity {
        article: article.number,
        article_url: article.url.clone(),
        analysis_url: analysis.article_url.clone(),
    })
}
