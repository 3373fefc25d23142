//! Single-cycle orchestrator.
//!
//! One call to [`Orchestrator::run`] performs, in order and failing fast:
//!
//! 1. load the rotation record
//! 2. load or reuse the article set and validate it
//! 3. resolve the article the rotation pointer names
//! 4. resolve or build its analysis
//! 5. check the article/analysis URL integrity
//! 6. compose the full variation batch and pick the current variation
//! 7. depending on [`RunMode`]: return, persist caches, or publish then
//!    advance and persist
//!
//! A run makes at most one publish call and at most one state write.

use std::sync::Arc;

use pipeline::{
    ArticleValidator, ComposedVariant, DocumentId, PipelineError, PublishReceipt, RetryPolicy,
    RotationPointer, RotationState, RunFailure, RunId, RunStep, Timestamp, VARIATIONS_PER_ARTICLE,
};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn, Instrument};

use crate::compose::compose_batch;
use crate::resolve::{check_integrity, resolve_analysis, resolve_article, resolve_articles};
use crate::Collaborators;

/// What a run does once the current variation has been composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Compose only. Nothing is written, not even caches.
    Preview,
    /// Compose and persist any cache entries built during the run. The
    /// rotation pointer does not move.
    Generate,
    /// Compose, publish, and on confirmed success advance and persist.
    Publish,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Preview => "preview",
            Self::Generate => "generate",
            Self::Publish => "publish",
        };
        f.write_str(name)
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: RunId,
    pub mode: RunMode,
    /// Pointer the run worked on.
    pub target: RotationPointer,
    pub article_title: String,
    pub article_url: String,
    pub variant: ComposedVariant,
    /// Present only when the run published.
    pub receipt: Option<PublishReceipt>,
    /// Pointer the next run will work on.
    pub next: RotationPointer,
    pub state_written: bool,
    pub completed_at: Timestamp,
}

/// Terminal status of a run, as reported to the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Success {
        record: RunRecord,
    },
    Error {
        run_id: RunId,
        step: RunStep,
        reason: String,
        retry: RetryPolicy,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Settings shared by the orchestrator and the scheduler.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub document: DocumentId,
    pub validator: ArticleValidator,
}

/// Drives one rotation cycle against the injected collaborators.
pub struct Orchestrator {
    collaborators: Arc<Collaborators>,
    settings: PipelineSettings,
}

impl Orchestrator {
    pub fn new(collaborators: Arc<Collaborators>, settings: PipelineSettings) -> Self {
        Self {
            collaborators,
            settings,
        }
    }

    /// Runs one cycle and folds the result into a [`RunOutcome`].
    pub async fn execute(&self, mode: RunMode) -> RunOutcome {
        let run_id = RunId::new_random();
        match self.run_with_id(run_id, mode).await {
            Ok(record) => RunOutcome::Success { record },
            Err(failure) => {
                warn!(%run_id, step = %failure.step, error = %failure.error, "Run failed");
                RunOutcome::Error {
                    run_id,
                    step: failure.step,
                    retry: failure.error.retry_policy(),
                    reason: failure.error.to_string(),
                }
            }
        }
    }

    /// Runs one cycle.
    pub async fn run(&self, mode: RunMode) -> Result<RunRecord, RunFailure> {
        self.run_with_id(RunId::new_random(), mode).await
    }

    async fn run_with_id(&self, run_id: RunId, mode: RunMode) -> Result<RunRecord, RunFailure> {
        let span = info_span!("rotation_run", %run_id, %mode);
        self.cycle(run_id, mode).instrument(span).await
    }

    async fn cycle(&self, run_id: RunId, mode: RunMode) -> Result<RunRecord, RunFailure> {
        let c = &self.collaborators;
        let fail = |step: RunStep| move |e: PipelineError| RunFailure::new(step, e);

        let loaded = c.store.load().await.map_err(|e| RunFailure::new(RunStep::LoadState, e))?;
        let mut working = loaded.clone();
        let target = working.pointer();
        info!(%target, "Starting rotation cycle");

        resolve_articles(
            &mut working,
            c.source.as_ref(),
            &self.settings.document,
            &self.settings.validator,
        )
        .await
        .map_err(fail(RunStep::LoadArticles))?;

        let article = resolve_article(&working.articles_cache, target.article)
            .map_err(fail(RunStep::ResolveArticle))?
            .clone();

        let (analysis, _) = resolve_analysis(&mut working, c.extractor.as_ref(), &article)
            .await
            .map_err(fail(RunStep::ResolveAnalysis))?;

        check_integrity(&article, &analysis).map_err(fail(RunStep::CheckIntegrity))?;

        let batch = compose_batch(c.composer.as_ref(), &article, &analysis, VARIATIONS_PER_ARTICLE)
            .await
            .map_err(fail(RunStep::Compose))?;
        let batch_size = batch.len();
        let variant = batch
            .into_iter()
            .nth(target.variation.get().saturating_sub(1) as usize)
            .filter(|v| v.variation_number == target.variation)
            .ok_or_else(|| {
                RunFailure::new(
                    RunStep::Compose,
                    PipelineError::VariationOutOfRange {
                        variation: target.variation,
                        batch_size,
                    },
                )
            })?;
        info!(length = variant.character_count, "Current variation composed");

        let (receipt, next, state_written) = match mode {
            RunMode::Preview => (None, target, false),
            RunMode::Generate => {
                let written = self.persist_if_changed(&loaded, &working).await?;
                (None, target, written)
            }
            RunMode::Publish => {
                let receipt = c
                    .publisher
                    .publish(&variant.content)
                    .await
                    .map_err(|e| RunFailure::new(RunStep::Publish, e))?;
                info!(post_id = %receipt.post_id, "Post published");

                let article_count = working.articles_cache.len() as u32;
                working.record_publish(receipt.published_at);
                let advanced = working.advance(article_count);
                c.store
                    .save(&advanced)
                    .await
                    .map_err(|e| RunFailure::new(RunStep::PersistState, e))?;
                info!(next = %advanced.pointer(), total = advanced.total_published, "Rotation advanced");
                (Some(receipt), advanced.pointer(), true)
            }
        };

        Ok(RunRecord {
            run_id,
            mode,
            target,
            article_title: article.title.clone(),
            article_url: article.url.clone(),
            variant,
            receipt,
            next,
            state_written,
            completed_at: Timestamp::now(),
        })
    }

    async fn persist_if_changed(
        &self,
        loaded: &RotationState,
        working: &RotationState,
    ) -> Result<bool, RunFailure> {
        if loaded == working {
            return Ok(false);
        }
        self.collaborators
            .store
            .save(working)
            .await
            .map_err(|e| RunFailure::new(RunStep::PersistState, e))?;
        info!("Caches persisted");
        Ok(true)
    }
}
