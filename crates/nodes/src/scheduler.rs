//! Multi-week pipeline preview.
//!
//! Walks [`pipeline::project`] over the next `weeks` posting slots and
//! composes the post each slot would carry. The rotation pointer is only ever
//! advanced on the projection's local copy. Analyses built along the way are
//! cached, and the cache is written once at the end if it changed.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use pipeline::{
    project, ArticleNumber, FocusTheme, PipelineError, PostingSchedule, RunFailure, RunId,
    RunStep, Timestamp, VariationNumber, MAX_PREVIEW_WEEKS, VARIATIONS_PER_ARTICLE,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, Instrument};

use crate::compose::compose_batch;
use crate::resolve::{check_integrity, resolve_analysis, resolve_article, resolve_articles};
use crate::{Collaborators, PipelineSettings};

/// One future post in the preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledItem {
    pub week: u32,
    pub scheduled_for: DateTime<FixedOffset>,
    pub article_number: ArticleNumber,
    pub variation_number: VariationNumber,
    pub article_title: String,
    pub focus: FocusTheme,
    pub content: String,
    pub character_count: usize,
    pub hashtags: Vec<String>,
}

/// Result of a preview run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelinePreview {
    pub run_id: RunId,
    pub schedule: PostingSchedule,
    pub generated_at: Timestamp,
    pub items: Vec<ScheduledItem>,
    /// `true` if analyses built during the preview were persisted.
    pub cache_written: bool,
}

/// Projects the rotation forward without advancing it.
pub struct Scheduler {
    collaborators: Arc<Collaborators>,
    settings: PipelineSettings,
    schedule: PostingSchedule,
}

impl Scheduler {
    pub fn new(
        collaborators: Arc<Collaborators>,
        settings: PipelineSettings,
        schedule: PostingSchedule,
    ) -> Self {
        Self {
            collaborators,
            settings,
            schedule,
        }
    }

    /// Previews the next `weeks` posts starting from the first slot after `now`.
    ///
    /// Fails at [`RunStep::ProjectSchedule`] when `weeks` exceeds
    /// [`MAX_PREVIEW_WEEKS`], before anything is loaded.
    pub async fn preview(
        &self,
        weeks: u32,
        now: DateTime<Utc>,
    ) -> Result<PipelinePreview, RunFailure> {
        let run_id = RunId::new_random();
        let span = info_span!("pipeline_preview", %run_id, weeks);
        self.walk(run_id, weeks, now).instrument(span).await
    }

    async fn walk(
        &self,
        run_id: RunId,
        weeks: u32,
        now: DateTime<Utc>,
    ) -> Result<PipelinePreview, RunFailure> {
        if weeks > MAX_PREVIEW_WEEKS {
            return Err(RunFailure::new(
                RunStep::ProjectSchedule,
                PipelineError::PreviewTooLong {
                    weeks,
                    max: MAX_PREVIEW_WEEKS,
                },
            ));
        }

        let c = &self.collaborators;
        let fail = |step: RunStep| move |e: PipelineError| RunFailure::new(step, e);

        let loaded = c.store.load().await.map_err(|e| RunFailure::new(RunStep::LoadState, e))?;
        let mut working = loaded.clone();

        resolve_articles(
            &mut working,
            c.source.as_ref(),
            &self.settings.document,
            &self.settings.validator,
        )
        .await
        .map_err(fail(RunStep::LoadArticles))?;

        let article_count = working.articles_cache.len() as u32;
        let slots = project(self.schedule, now, working.pointer(), article_count, weeks);
        let mut items = Vec::new();

        for slot in slots {
            let article = resolve_article(&working.articles_cache, slot.pointer.article)
                .map_err(fail(RunStep::ResolveArticle))?
                .clone();
            let (analysis, _) = resolve_analysis(&mut working, c.extractor.as_ref(), &article)
                .await
                .map_err(fail(RunStep::ResolveAnalysis))?;
            check_integrity(&article, &analysis).map_err(fail(RunStep::CheckIntegrity))?;

            let batch =
                compose_batch(c.composer.as_ref(), &article, &analysis, VARIATIONS_PER_ARTICLE)
                    .await
                    .map_err(fail(RunStep::Compose))?;
            let batch_size = batch.len();
            let variant = batch
                .into_iter()
                .find(|v| v.variation_number == slot.pointer.variation)
                .ok_or_else(|| {
                    RunFailure::new(
                        RunStep::Compose,
                        PipelineError::VariationOutOfRange {
                            variation: slot.pointer.variation,
                            batch_size,
                        },
                    )
                })?;

            debug!(week = slot.week, pointer = %slot.pointer, "Slot composed");
            items.push(ScheduledItem {
                week: slot.week,
                scheduled_for: slot.scheduled_for,
                article_number: article.number,
                variation_number: variant.variation_number,
                article_title: article.title.clone(),
                focus: variant.focus,
                content: variant.content,
                character_count: variant.character_count,
                hashtags: variant.hashtags,
            });
        }

        let cache_written = if working != loaded {
            c.store
                .save(&working)
                .await
                .map_err(|e| RunFailure::new(RunStep::PersistState, e))?;
            true
        } else {
            false
        };

        info!(items = items.len(), cache_written, "Pipeline preview generated");
        Ok(PipelinePreview {
            run_id,
            schedule: self.schedule,
            generated_at: Timestamp::now(),
            items,
            cache_written,
        })
    }
}
