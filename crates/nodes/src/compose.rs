//! Sequential composition of a variation batch.

use pipeline::{
    body_budget, build_variant, select_hashtags, select_insight, Analysis, Article,
    ComposedVariant, CompositionRequest, FocusTheme, PipelineError, PostComposer,
    VariationNumber, PLATFORM_LIMIT,
};
use tracing::{debug, warn};

/// Composes `variations` posts for `article`, one composer call at a time.
///
/// Each variation features an insight not yet used in this batch until the
/// pool runs out, after which insights cycle. Calls are not parallelised:
/// insight tracking depends on order and the composer is rate limited.
pub async fn compose_batch(
    composer: &dyn PostComposer,
    article: &Article,
    analysis: &Analysis,
    variations: u32,
) -> Result<Vec<ComposedVariant>, PipelineError> {
    let pool = &analysis.key_insights;
    if pool.is_empty() {
        return Err(PipelineError::EmptyInsightPool {
            article: article.number,
        });
    }
    if pool.len() < variations as usize {
        warn!(
            article = %article.number,
            insights = pool.len(),
            variations,
            "Fewer insights than variations; insights will repeat"
        );
    }

    let hashtags = select_hashtags(&analysis.themes);
    let max_chars = body_budget(&hashtags);
    let mut used: Vec<String> = Vec::new();
    let mut batch = Vec::with_capacity(variations as usize);

    for v in 1..=variations {
        let variation = VariationNumber::new(v);
        let Some(insight) = select_insight(pool, &used, variation) else {
            break;
        };
        let request = CompositionRequest {
            variation,
            focus: FocusTheme::for_variation(variation),
            insight: insight.clone(),
            max_chars,
        };

        let body = composer
            .compose(&request)
            .await
            .map_err(|source| PipelineError::Composition {
                article: article.number,
                variation,
                source,
            })?;

        let variant = build_variant(article, &request, &body, hashtags.clone());
        if variant.character_count > PLATFORM_LIMIT {
            warn!(
                article = %article.number,
                variation = %variation,
                length = variant.character_count,
                "Composed post exceeds the platform limit"
            );
        }
        debug!(variation = %variation, length = variant.character_count, "Variation composed");

        used.extend(variant.insights_used.iter().cloned());
        batch.push(variant);
    }

    Ok(batch)
}
